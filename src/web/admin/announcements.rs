use axum::{
    extract::{Form, Path as AxumPath, Query, State},
    response::{Html, Redirect},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::Deserialize;
use tracing::{error, info};

use crate::web::{
    AppState, compose_flash, data, escape_html, render_page,
    dashboard::DashboardQuery,
    templates::format_timestamp,
};

use super::auth::require_admin_user;

#[derive(Deserialize)]
pub struct AnnouncementForm {
    pub title: String,
    pub message: String,
}

pub async fn list(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<DashboardQuery>,
) -> Result<Html<String>, Redirect> {
    let user = require_admin_user(&state, &jar).await?;

    let announcements = match data::search_announcements(state.pool_ref(), None).await {
        Ok(rows) => rows,
        Err(err) => {
            error!(?err, "failed to load announcements");
            return Err(Redirect::to("/admin/dashboard?error=server"));
        }
    };

    let mut rows = String::new();
    if announcements.is_empty() {
        rows.push_str(r#"<tr><td colspan="4">No announcements yet.</td></tr>"#);
    } else {
        for item in &announcements {
            rows.push_str(&format!(
                r#"<tr>
                    <td>{title}</td>
                    <td>{author}</td>
                    <td>{created}</td>
                    <td>
                        <a href="/admin/announcements/{id}/edit">Edit</a>
                        <form class="inline-form danger" method="post" action="/admin/announcements/{id}/delete"><button type="submit">Delete</button></form>
                    </td>
                </tr>"#,
                title = escape_html(&item.title),
                author = escape_html(&item.author_name),
                created = format_timestamp(&item.created_at),
                id = item.id,
            ));
        }
    }

    let body = format!(
        r#"<section class="panel">
            <h2>Announcements</h2>
            <p><a href="/admin/announcements/new">Post a new announcement</a></p>
            <table>
                <tr><th>Title</th><th>Author</th><th>Posted</th><th></th></tr>
                {rows}
            </table>
        </section>"#,
    );

    let flash = compose_flash(params.status.as_deref(), params.error.as_deref());
    Ok(Html(render_page("Manage announcements", &user, &flash, &body)))
}

pub async fn create_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<DashboardQuery>,
) -> Result<Html<String>, Redirect> {
    let user = require_admin_user(&state, &jar).await?;

    let body = r#"<section class="panel">
            <h2>New announcement</h2>
            <form method="post" action="/admin/announcements/new">
                <label for="title">Title</label>
                <input id="title" name="title" required>
                <label for="message">Message</label>
                <textarea id="message" name="message" required></textarea>
                <button type="submit">Publish</button>
            </form>
        </section>"#;

    let flash = compose_flash(params.status.as_deref(), params.error.as_deref());
    Ok(Html(render_page("New announcement", &user, &flash, body)))
}

pub async fn create_announcement(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<AnnouncementForm>,
) -> Result<Redirect, Redirect> {
    let admin = require_admin_user(&state, &jar).await?;

    let title = form.title.trim();
    let message = form.message.trim();
    if title.is_empty() || message.is_empty() {
        return Ok(Redirect::to("/admin/announcements/new?error=missing_title"));
    }

    let result = sqlx::query(
        "INSERT INTO announcements (title, message, created_by, created_at) VALUES ($1, $2, $3, $4)",
    )
    .bind(title)
    .bind(message)
    .bind(admin.id)
    .bind(Utc::now())
    .execute(state.pool_ref())
    .await;

    match result {
        Ok(_) => {
            info!(admin_id = admin.id, "announcement created");
            Ok(Redirect::to("/admin/announcements?status=announcement_created"))
        }
        Err(err) => {
            error!(?err, "failed to create announcement");
            Ok(Redirect::to("/admin/announcements/new?error=server"))
        }
    }
}

pub async fn edit_page(
    State(state): State<AppState>,
    jar: CookieJar,
    AxumPath(id): AxumPath<i64>,
    Query(params): Query<DashboardQuery>,
) -> Result<Html<String>, Redirect> {
    let user = require_admin_user(&state, &jar).await?;

    let announcement = match data::fetch_announcement(state.pool_ref(), id).await {
        Ok(Some(announcement)) => announcement,
        Ok(None) => return Err(Redirect::to("/admin/announcements?error=not_found")),
        Err(err) => {
            error!(?err, "failed to load announcement");
            return Err(Redirect::to("/admin/announcements?error=server"));
        }
    };

    let body = format!(
        r#"<section class="panel">
            <h2>Edit announcement</h2>
            <form method="post" action="/admin/announcements/{id}/edit">
                <label for="title">Title</label>
                <input id="title" name="title" value="{title}" required>
                <label for="message">Message</label>
                <textarea id="message" name="message" required>{message}</textarea>
                <button type="submit">Save</button>
            </form>
        </section>"#,
        id = announcement.id,
        title = escape_html(&announcement.title),
        message = escape_html(&announcement.message),
    );

    let flash = compose_flash(params.status.as_deref(), params.error.as_deref());
    Ok(Html(render_page("Edit announcement", &user, &flash, &body)))
}

pub async fn update_announcement(
    State(state): State<AppState>,
    jar: CookieJar,
    AxumPath(id): AxumPath<i64>,
    Form(form): Form<AnnouncementForm>,
) -> Result<Redirect, Redirect> {
    let admin = require_admin_user(&state, &jar).await?;

    let title = form.title.trim();
    let message = form.message.trim();
    if title.is_empty() || message.is_empty() {
        return Ok(Redirect::to(&format!(
            "/admin/announcements/{id}/edit?error=missing_title"
        )));
    }

    let result = sqlx::query(
        "UPDATE announcements SET title = $2, message = $3, updated_at = $4 WHERE id = $1",
    )
    .bind(id)
    .bind(title)
    .bind(message)
    .bind(Utc::now())
    .execute(state.pool_ref())
    .await;

    match result {
        Ok(res) if res.rows_affected() > 0 => {
            info!(admin_id = admin.id, announcement_id = id, "announcement updated");
            Ok(Redirect::to("/admin/announcements?status=announcement_updated"))
        }
        Ok(_) => Ok(Redirect::to("/admin/announcements?error=not_found")),
        Err(err) => {
            error!(?err, "failed to update announcement");
            Ok(Redirect::to("/admin/announcements?error=server"))
        }
    }
}

pub async fn delete_announcement(
    State(state): State<AppState>,
    jar: CookieJar,
    AxumPath(id): AxumPath<i64>,
) -> Result<Redirect, Redirect> {
    let admin = require_admin_user(&state, &jar).await?;

    let result = sqlx::query("DELETE FROM announcements WHERE id = $1")
        .bind(id)
        .execute(state.pool_ref())
        .await;

    match result {
        Ok(res) if res.rows_affected() > 0 => {
            info!(admin_id = admin.id, announcement_id = id, "announcement deleted");
            Ok(Redirect::to("/admin/announcements?status=announcement_deleted"))
        }
        Ok(_) => Ok(Redirect::to("/admin/announcements?error=not_found")),
        Err(err) => {
            error!(?err, "failed to delete announcement");
            Ok(Redirect::to("/admin/announcements?error=server"))
        }
    }
}
