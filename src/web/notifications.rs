use axum::{
    extract::{Path as AxumPath, Query, State},
    response::{Html, Redirect},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::error;

use crate::web::{
    AppState, compose_flash, data, escape_html, render_page,
    auth::require_user,
    dashboard::DashboardQuery,
    templates::format_timestamp,
};

pub async fn list(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<DashboardQuery>,
) -> Result<Html<String>, Redirect> {
    let user = require_user(&state, &jar).await?;

    let notifications = match data::fetch_notifications_for_user(state.pool_ref(), user.id).await {
        Ok(rows) => rows,
        Err(err) => {
            error!(?err, "failed to load notifications");
            return Err(Redirect::to("/dashboard?error=server"));
        }
    };
    let unread = notifications.iter().filter(|n| !n.is_read).count();

    let mut rows = String::new();
    if notifications.is_empty() {
        rows.push_str(r#"<tr><td colspan="3">No notifications.</td></tr>"#);
    } else {
        for item in &notifications {
            let (badge, action) = if item.is_read {
                (String::new(), String::new())
            } else {
                (
                    r#"<span class="badge unread">new</span> "#.to_string(),
                    format!(
                        r#"<form class="inline-form" method="post" action="/notifications/{id}/read"><button type="submit">Mark read</button></form>"#,
                        id = item.id
                    ),
                )
            };
            rows.push_str(&format!(
                r#"<tr>
                    <td>{badge}{message}</td>
                    <td>{created}</td>
                    <td>{action}</td>
                </tr>"#,
                badge = badge,
                message = escape_html(&item.message),
                created = format_timestamp(&item.created_at),
                action = action,
            ));
        }
    }

    let body = format!(
        r#"<section class="panel">
            <h2>Notifications ({unread} unread)</h2>
            <table>
                <tr><th>Message</th><th>Received</th><th></th></tr>
                {rows}
            </table>
        </section>"#,
    );

    let flash = compose_flash(params.status.as_deref(), params.error.as_deref());
    Ok(Html(render_page("Notifications", &user, &flash, &body)))
}

/// Marks one of the caller's notifications as read. The update is keyed on
/// owner as well as id, so foreign rows are untouched, and repeating the
/// call is a no-op.
pub async fn mark_read(
    State(state): State<AppState>,
    jar: CookieJar,
    AxumPath(id): AxumPath<i64>,
) -> Result<Redirect, Redirect> {
    let user = require_user(&state, &jar).await?;

    let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user.id)
        .execute(state.pool_ref())
        .await;

    match result {
        Ok(res) if res.rows_affected() > 0 => Ok(Redirect::to("/notifications")),
        Ok(_) => Ok(Redirect::to("/notifications?error=not_found")),
        Err(err) => {
            error!(?err, "failed to mark notification read");
            Ok(Redirect::to("/notifications?error=server"))
        }
    }
}
