use axum::{
    extract::{Query, State},
    response::{Html, Redirect},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::error;

use crate::web::{
    AppState, compose_flash, data, escape_html, render_page,
    dashboard::DashboardQuery,
    templates::format_timestamp,
};

use super::auth::require_admin_user;

const RECENT_LIMIT: i64 = 5;

pub async fn dashboard(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<DashboardQuery>,
) -> Result<Html<String>, Redirect> {
    let user = require_admin_user(&state, &jar).await?;

    let stats = match data::fetch_portal_stats(state.pool_ref()).await {
        Ok(stats) => stats,
        Err(err) => {
            error!(?err, "failed to load portal stats");
            return Err(Redirect::to("/login"));
        }
    };

    let recent_assignments = data::fetch_all_assignments(state.pool_ref(), Some(RECENT_LIMIT))
        .await
        .unwrap_or_else(|err| {
            error!(?err, "failed to load recent assignments");
            Vec::new()
        });
    let recent_feedback = data::fetch_feedback(state.pool_ref(), None, Some(RECENT_LIMIT))
        .await
        .unwrap_or_else(|err| {
            error!(?err, "failed to load recent feedback");
            Vec::new()
        });

    let mut assignment_rows = String::new();
    if recent_assignments.is_empty() {
        assignment_rows.push_str(r#"<tr><td colspan="4">No submissions yet.</td></tr>"#);
    } else {
        for item in &recent_assignments {
            let grade = item
                .grade
                .as_deref()
                .map(escape_html)
                .unwrap_or_else(|| "—".to_string());
            assignment_rows.push_str(&format!(
                r#"<tr>
                    <td>{owner}</td>
                    <td>{file}</td>
                    <td>{uploaded}</td>
                    <td>{grade} <a href="/admin/assignments/{id}/grade">grade</a></td>
                </tr>"#,
                owner = escape_html(&item.owner_name),
                file = escape_html(&item.original_name),
                uploaded = format_timestamp(&item.uploaded_at),
                grade = grade,
                id = item.id,
            ));
        }
    }

    let mut feedback_rows = String::new();
    if recent_feedback.is_empty() {
        feedback_rows.push_str(r#"<tr><td colspan="3">No feedback yet.</td></tr>"#);
    } else {
        for item in &recent_feedback {
            feedback_rows.push_str(&format!(
                r#"<tr>
                    <td>{author}</td>
                    <td>{subject}</td>
                    <td>{rating}/5</td>
                </tr>"#,
                author = escape_html(&item.author_name),
                subject = escape_html(&item.subject),
                rating = item.rating,
            ));
        }
    }

    let body = format!(
        r#"<div class="stat-grid">
            <div class="stat"><strong>{students}</strong> students</div>
            <div class="stat"><strong>{assignments}</strong> assignments</div>
            <div class="stat"><strong>{ungraded}</strong> awaiting grading</div>
            <div class="stat"><strong>{announcements}</strong> announcements</div>
            <div class="stat"><strong>{feedback}</strong> feedback entries</div>
        </div>
        <section class="panel">
            <h2>Recent submissions</h2>
            <table>
                <tr><th>Student</th><th>File</th><th>Uploaded</th><th>Grade</th></tr>
                {assignment_rows}
            </table>
        </section>
        <section class="panel">
            <h2>Recent feedback</h2>
            <table>
                <tr><th>Student</th><th>Subject</th><th>Rating</th></tr>
                {feedback_rows}
            </table>
        </section>"#,
        students = stats.total_students,
        assignments = stats.total_assignments,
        ungraded = stats.ungraded_assignments,
        announcements = stats.total_announcements,
        feedback = stats.total_feedback,
        assignment_rows = assignment_rows,
        feedback_rows = feedback_rows,
    );

    let flash = compose_flash(params.status.as_deref(), params.error.as_deref());
    Ok(Html(render_page("Admin dashboard", &user, &flash, &body)))
}
