use axum::{
    extract::{Path as AxumPath, State},
    response::{Html, Redirect},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::error;

use crate::web::{
    AppState, data, escape_html, render_page,
    templates::format_timestamp,
};

use super::auth::require_admin_user;

pub async fn student_list(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Html<String>, Redirect> {
    let user = require_admin_user(&state, &jar).await?;

    let students = match data::fetch_students(state.pool_ref()).await {
        Ok(rows) => rows,
        Err(err) => {
            error!(?err, "failed to load students");
            return Err(Redirect::to("/admin/dashboard?error=server"));
        }
    };

    let mut rows = String::new();
    if students.is_empty() {
        rows.push_str(r#"<tr><td colspan="5">No students registered yet.</td></tr>"#);
    } else {
        for student in &students {
            let last_login = student
                .last_login
                .map(|at| format_timestamp(&at))
                .unwrap_or_else(|| "never".to_string());
            rows.push_str(&format!(
                r#"<tr>
                    <td><a href="/admin/students/{id}">{name}</a></td>
                    <td>{email}</td>
                    <td>{department}</td>
                    <td>{year}</td>
                    <td>{last_login}</td>
                </tr>"#,
                id = student.id,
                name = escape_html(&student.name),
                email = escape_html(&student.email),
                department = escape_html(&student.department),
                year = student.year,
                last_login = last_login,
            ));
        }
    }

    let body = format!(
        r#"<section class="panel">
            <h2>Students</h2>
            <table>
                <tr><th>Name</th><th>Email</th><th>Department</th><th>Year</th><th>Last login</th></tr>
                {rows}
            </table>
        </section>"#,
    );

    Ok(Html(render_page("Students", &user, "", &body)))
}

pub async fn student_detail(
    State(state): State<AppState>,
    jar: CookieJar,
    AxumPath(id): AxumPath<i64>,
) -> Result<Html<String>, Redirect> {
    let user = require_admin_user(&state, &jar).await?;

    let student = match data::fetch_student(state.pool_ref(), id).await {
        Ok(Some(student)) => student,
        Ok(None) => return Err(Redirect::to("/admin/students?error=not_found")),
        Err(err) => {
            error!(?err, "failed to load student");
            return Err(Redirect::to("/admin/students?error=server"));
        }
    };

    let assignments = data::fetch_assignments_for_user(state.pool_ref(), id)
        .await
        .unwrap_or_else(|err| {
            error!(?err, "failed to load student assignments");
            Vec::new()
        });
    let feedback = data::fetch_feedback_for_user(state.pool_ref(), id)
        .await
        .unwrap_or_else(|err| {
            error!(?err, "failed to load student feedback");
            Vec::new()
        });

    let mut assignment_rows = String::new();
    if assignments.is_empty() {
        assignment_rows.push_str(r#"<tr><td colspan="3">No submissions.</td></tr>"#);
    } else {
        for item in &assignments {
            let grade = item
                .grade
                .as_deref()
                .map(escape_html)
                .unwrap_or_else(|| "—".to_string());
            assignment_rows.push_str(&format!(
                r#"<tr>
                    <td>{file}</td>
                    <td>{uploaded}</td>
                    <td>{grade} <a href="/admin/assignments/{id}/grade">grade</a></td>
                </tr>"#,
                file = escape_html(&item.original_name),
                uploaded = format_timestamp(&item.uploaded_at),
                grade = grade,
                id = item.id,
            ));
        }
    }

    let mut feedback_rows = String::new();
    if feedback.is_empty() {
        feedback_rows.push_str(r#"<tr><td colspan="3">No feedback submitted.</td></tr>"#);
    } else {
        for item in &feedback {
            feedback_rows.push_str(&format!(
                r#"<tr>
                    <td>{subject}</td>
                    <td>{rating}/5</td>
                    <td>{message}</td>
                </tr>"#,
                subject = escape_html(&item.subject),
                rating = item.rating,
                message = escape_html(&item.message),
            ));
        }
    }

    let body = format!(
        r#"<section class="panel">
            <h2>{name}</h2>
            <p class="note">{email} · {department}, year {year} · registered {created}</p>
        </section>
        <section class="panel">
            <h2>Submissions</h2>
            <table>
                <tr><th>File</th><th>Uploaded</th><th>Grade</th></tr>
                {assignment_rows}
            </table>
        </section>
        <section class="panel">
            <h2>Feedback</h2>
            <table>
                <tr><th>Subject</th><th>Rating</th><th>Message</th></tr>
                {feedback_rows}
            </table>
        </section>"#,
        name = escape_html(&student.name),
        email = escape_html(&student.email),
        department = escape_html(&student.department),
        year = student.year,
        created = format_timestamp(&student.created_at),
        assignment_rows = assignment_rows,
        feedback_rows = feedback_rows,
    );

    Ok(Html(render_page("Student detail", &user, "", &body)))
}
