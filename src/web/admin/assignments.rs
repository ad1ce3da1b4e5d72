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
pub struct GradeForm {
    pub grade: String,
    #[serde(default)]
    pub comments: String,
}

pub async fn list(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<DashboardQuery>,
) -> Result<Html<String>, Redirect> {
    let user = require_admin_user(&state, &jar).await?;

    let assignments = match data::fetch_all_assignments(state.pool_ref(), None).await {
        Ok(rows) => rows,
        Err(err) => {
            error!(?err, "failed to load assignment list");
            return Err(Redirect::to("/admin/dashboard?error=server"));
        }
    };

    let mut rows = String::new();
    if assignments.is_empty() {
        rows.push_str(r#"<tr><td colspan="5">No submissions yet.</td></tr>"#);
    } else {
        for item in &assignments {
            let grade = match &item.grade {
                Some(grade) => format!(
                    r#"<span class="badge graded">{}</span>"#,
                    escape_html(grade)
                ),
                None => r#"<span class="badge pending">ungraded</span>"#.to_string(),
            };
            rows.push_str(&format!(
                r#"<tr>
                    <td><a href="/admin/students/{owner_id}">{owner}</a></td>
                    <td><a href="/assignments/{id}/download">{file}</a></td>
                    <td>{uploaded}</td>
                    <td>{grade}</td>
                    <td><a href="/admin/assignments/{id}/grade">Grade</a></td>
                </tr>"#,
                owner_id = item.user_id,
                owner = escape_html(&item.owner_name),
                id = item.id,
                file = escape_html(&item.original_name),
                uploaded = format_timestamp(&item.uploaded_at),
                grade = grade,
            ));
        }
    }

    let body = format!(
        r#"<section class="panel">
            <h2>All submissions</h2>
            <table>
                <tr><th>Student</th><th>File</th><th>Uploaded</th><th>Grade</th><th></th></tr>
                {rows}
            </table>
        </section>"#,
    );

    let flash = compose_flash(params.status.as_deref(), params.error.as_deref());
    Ok(Html(render_page("Submissions", &user, &flash, &body)))
}

pub async fn grade_page(
    State(state): State<AppState>,
    jar: CookieJar,
    AxumPath(id): AxumPath<i64>,
    Query(params): Query<DashboardQuery>,
) -> Result<Html<String>, Redirect> {
    let user = require_admin_user(&state, &jar).await?;

    let assignment = match data::fetch_assignment(state.pool_ref(), id).await {
        Ok(Some(assignment)) => assignment,
        Ok(None) => return Err(Redirect::to("/admin/assignments?error=not_found")),
        Err(err) => {
            error!(?err, "failed to load assignment for grading");
            return Err(Redirect::to("/admin/assignments?error=server"));
        }
    };

    let current = assignment
        .grade
        .as_deref()
        .map(escape_html)
        .unwrap_or_default();
    let comments = assignment
        .comments
        .as_deref()
        .map(escape_html)
        .unwrap_or_default();

    let body = format!(
        r#"<section class="panel">
            <h2>Grade: {file}</h2>
            <p class="note">Uploaded {uploaded} · <a href="/assignments/{id}/download">download</a></p>
            <form method="post" action="/admin/assignments/{id}/grade">
                <label for="grade">Grade (e.g. A, B+, 95%)</label>
                <input id="grade" name="grade" value="{current}" required>
                <label for="comments">Comments</label>
                <textarea id="comments" name="comments">{comments}</textarea>
                <button type="submit">Save grade</button>
            </form>
        </section>"#,
        file = escape_html(&assignment.original_name),
        uploaded = format_timestamp(&assignment.uploaded_at),
        id = assignment.id,
        current = current,
        comments = comments,
    );

    let flash = compose_flash(params.status.as_deref(), params.error.as_deref());
    Ok(Html(render_page("Grade assignment", &user, &flash, &body)))
}

/// Records a grade on an existing submission. Grading is overwrite, not
/// append; the previous grade is replaced and the student is notified.
pub async fn grade(
    State(state): State<AppState>,
    jar: CookieJar,
    AxumPath(id): AxumPath<i64>,
    Form(form): Form<GradeForm>,
) -> Result<Redirect, Redirect> {
    let admin = require_admin_user(&state, &jar).await?;

    let grade = form.grade.trim();
    if grade.is_empty() {
        return Ok(Redirect::to(&format!(
            "/admin/assignments/{id}/grade?error=missing_fields"
        )));
    }
    let comments = form.comments.trim();

    let assignment = match data::fetch_assignment(state.pool_ref(), id).await {
        Ok(Some(assignment)) => assignment,
        Ok(None) => return Ok(Redirect::to("/admin/assignments?error=not_found")),
        Err(err) => {
            error!(?err, "failed to load assignment for grading");
            return Ok(Redirect::to("/admin/assignments?error=server"));
        }
    };

    let result = sqlx::query(
        "UPDATE assignments SET grade = $2, comments = $3, graded_by = $4, graded_at = $5
         WHERE id = $1",
    )
    .bind(assignment.id)
    .bind(grade)
    .bind(comments)
    .bind(admin.id)
    .bind(Utc::now())
    .execute(state.pool_ref())
    .await;

    if let Err(err) = result {
        error!(?err, "failed to store grade");
        return Ok(Redirect::to(&format!(
            "/admin/assignments/{id}/grade?error=server"
        )));
    }

    let message = format!(
        "Your assignment \"{}\" has been graded: {}",
        assignment.original_name, grade
    );
    if let Err(err) = sqlx::query(
        "INSERT INTO notifications (user_id, message, created_at) VALUES ($1, $2, $3)",
    )
    .bind(assignment.user_id)
    .bind(message)
    .bind(Utc::now())
    .execute(state.pool_ref())
    .await
    {
        error!(?err, "failed to notify student of grade");
    }

    info!(
        assignment_id = assignment.id,
        graded_by = admin.id,
        "assignment graded"
    );
    Ok(Redirect::to("/admin/assignments?status=graded"))
}
