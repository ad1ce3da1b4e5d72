use std::path::Path;

use axum::{
    extract::{Multipart, Path as AxumPath, Query, State},
    response::{Html, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use tracing::{error, info, warn};

use crate::web::{
    AppState, compose_flash, data, escape_html, render_page, storage, uploads,
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

    let assignments = match data::fetch_assignments_for_user(state.pool_ref(), user.id).await {
        Ok(rows) => rows,
        Err(err) => {
            error!(?err, "failed to load assignments");
            return Err(Redirect::to("/dashboard?error=server"));
        }
    };

    let mut rows = String::new();
    if assignments.is_empty() {
        rows.push_str(r#"<tr><td colspan="5">Nothing submitted yet. <a href="/assignments/upload">Upload your first assignment</a>.</td></tr>"#);
    } else {
        for item in &assignments {
            let grade = match &item.grade {
                Some(grade) => format!(
                    r#"<span class="badge graded">{}</span>"#,
                    escape_html(grade)
                ),
                None => r#"<span class="badge pending">ungraded</span>"#.to_string(),
            };
            let comments = item
                .comments
                .as_deref()
                .map(escape_html)
                .unwrap_or_default();
            let delete = if item.is_graded() {
                String::new()
            } else {
                format!(
                    r#"<form class="inline-form danger" method="post" action="/assignments/{id}/delete"><button type="submit">Delete</button></form>"#,
                    id = item.id
                )
            };
            rows.push_str(&format!(
                r#"<tr>
                    <td><a href="/assignments/{id}/download">{name}</a></td>
                    <td>{uploaded}</td>
                    <td>{grade}</td>
                    <td>{comments}</td>
                    <td>{delete}</td>
                </tr>"#,
                id = item.id,
                name = escape_html(&item.original_name),
                uploaded = format_timestamp(&item.uploaded_at),
            ));
        }
    }

    let body = format!(
        r#"<section class="panel">
            <h2>My assignments</h2>
            <p><a href="/assignments/upload">Upload a new assignment</a></p>
            <table>
                <tr><th>File</th><th>Uploaded</th><th>Grade</th><th>Comments</th><th></th></tr>
                {rows}
            </table>
        </section>"#,
    );

    let flash = compose_flash(params.status.as_deref(), params.error.as_deref());
    Ok(Html(render_page("Assignments", &user, &flash, &body)))
}

pub async fn upload_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<DashboardQuery>,
) -> Result<Html<String>, Redirect> {
    let user = require_user(&state, &jar).await?;

    let body = format!(
        r#"<section class="panel">
            <h2>Upload assignment</h2>
            <p class="note">Accepted formats: PDF, DOC, DOCX. Maximum size {max_mib} MiB.</p>
            <form method="post" action="/assignments/upload" enctype="multipart/form-data">
                <label for="file">File</label>
                <input id="file" type="file" name="file" accept=".pdf,.doc,.docx" required>
                <button type="submit">Upload</button>
            </form>
        </section>"#,
        max_mib = state.config().max_upload_bytes / (1024 * 1024),
    );

    let flash = compose_flash(params.status.as_deref(), params.error.as_deref());
    Ok(Html(render_page("Upload", &user, &flash, &body)))
}

pub async fn upload(
    State(state): State<AppState>,
    jar: CookieJar,
    multipart: Multipart,
) -> Result<Redirect, Redirect> {
    let user = require_user(&state, &jar).await?;

    let dest_dir = Path::new(&state.config().upload_dir);
    if let Err(err) = storage::ensure_storage_root(&state.config().upload_dir).await {
        error!(?err, "failed to prepare upload directory");
        return Ok(Redirect::to("/assignments/upload?error=upload_failed"));
    }

    let saved = match uploads::save_assignment_upload(
        multipart,
        dest_dir,
        state.config().max_upload_bytes,
    )
    .await
    {
        Ok(saved) => saved,
        Err(err) => {
            warn!(user_id = user.id, code = err.code(), "upload rejected");
            return Ok(Redirect::to(&format!(
                "/assignments/upload?error={}",
                err.code()
            )));
        }
    };

    let result = sqlx::query(
        "INSERT INTO assignments (user_id, original_name, stored_name, uploaded_at)
         VALUES ($1, $2, $3, $4)",
    )
    .bind(user.id)
    .bind(&saved.original_name)
    .bind(&saved.stored_name)
    .bind(Utc::now())
    .execute(state.pool_ref())
    .await;

    match result {
        Ok(_) => {
            info!(
                user_id = user.id,
                file = %saved.stored_name,
                size = saved.file_size,
                "assignment uploaded"
            );
            Ok(Redirect::to("/assignments?status=uploaded"))
        }
        Err(err) => {
            error!(?err, "failed to record assignment");
            // Do not leave an orphaned file behind the failed insert.
            if let Err(err) = tokio::fs::remove_file(&saved.stored_path).await {
                error!(?err, "failed to remove orphaned upload");
            }
            Ok(Redirect::to("/assignments/upload?error=upload_failed"))
        }
    }
}

pub async fn download(
    State(state): State<AppState>,
    jar: CookieJar,
    AxumPath(id): AxumPath<i64>,
) -> Result<Response, Redirect> {
    let user = require_user(&state, &jar).await?;

    let assignment = match data::fetch_assignment(state.pool_ref(), id).await {
        Ok(Some(assignment)) => assignment,
        Ok(None) => return Err(Redirect::to("/assignments?error=not_found")),
        Err(err) => {
            error!(?err, "failed to load assignment for download");
            return Err(Redirect::to("/assignments?error=server"));
        }
    };

    if !storage::can_access(&assignment, &user) {
        warn!(
            user_id = user.id,
            assignment_id = id,
            "blocked download of foreign assignment"
        );
        return Err(Redirect::to("/assignments?error=not_found"));
    }

    let path = Path::new(&state.config().upload_dir).join(&assignment.stored_name);
    storage::stream_file(&path, &assignment.original_name)
        .await
        .map_err(|err| {
            error!(?err, "failed to stream assignment file");
            Redirect::to("/assignments?error=file_missing")
        })
}

pub async fn delete(
    State(state): State<AppState>,
    jar: CookieJar,
    AxumPath(id): AxumPath<i64>,
) -> Result<Redirect, Redirect> {
    let user = require_user(&state, &jar).await?;

    let assignment = match data::fetch_assignment(state.pool_ref(), id).await {
        Ok(Some(assignment)) => assignment,
        Ok(None) => return Ok(Redirect::to("/assignments?error=not_found")),
        Err(err) => {
            error!(?err, "failed to load assignment for delete");
            return Ok(Redirect::to("/assignments?error=server"));
        }
    };

    if assignment.user_id != user.id && !user.is_admin() {
        warn!(
            user_id = user.id,
            assignment_id = id,
            "blocked delete of foreign assignment"
        );
        return Ok(Redirect::to("/assignments?error=not_found"));
    }

    // Owners can only withdraw work that has not been graded yet.
    if assignment.is_graded() && !user.is_admin() {
        return Ok(Redirect::to("/assignments?error=graded_locked"));
    }

    let path = Path::new(&state.config().upload_dir).join(&assignment.stored_name);
    if let Err(err) = tokio::fs::remove_file(&path).await {
        if err.kind() != std::io::ErrorKind::NotFound {
            error!(?err, "failed to remove assignment file");
        }
    }

    match sqlx::query("DELETE FROM assignments WHERE id = $1")
        .bind(id)
        .execute(state.pool_ref())
        .await
    {
        Ok(_) => {
            info!(user_id = user.id, assignment_id = id, "assignment deleted");
            Ok(Redirect::to("/assignments?status=deleted"))
        }
        Err(err) => {
            error!(?err, "failed to delete assignment row");
            Ok(Redirect::to("/assignments?error=server"))
        }
    }
}
