use axum::{
    extract::{Form, Query, State},
    response::{Html, Redirect},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::Deserialize;
use tracing::{error, info};

use crate::web::{
    AppState, compose_flash, data, escape_html, render_page,
    dashboard::DashboardQuery,
};

use super::auth::require_admin_user;

#[derive(Deserialize)]
pub struct NotificationForm {
    pub message: String,
    pub recipient_type: String,
    // Arrives as a string; the select may submit an empty value.
    #[serde(default)]
    pub student_id: String,
}

pub async fn send_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<DashboardQuery>,
) -> Result<Html<String>, Redirect> {
    let user = require_admin_user(&state, &jar).await?;

    let students = data::fetch_students(state.pool_ref())
        .await
        .unwrap_or_else(|err| {
            error!(?err, "failed to load students for notification form");
            Vec::new()
        });

    let mut student_options = String::new();
    for student in &students {
        student_options.push_str(&format!(
            r#"<option value="{id}">{name} ({email})</option>"#,
            id = student.id,
            name = escape_html(&student.name),
            email = escape_html(&student.email),
        ));
    }

    let body = format!(
        r#"<section class="panel">
            <h2>Send notification</h2>
            <form method="post" action="/admin/notifications">
                <label for="message">Message</label>
                <textarea id="message" name="message" required></textarea>
                <label for="recipient_type">Recipients</label>
                <select id="recipient_type" name="recipient_type">
                    <option value="all">All students</option>
                    <option value="single">One student</option>
                </select>
                <label for="student_id">Student (for single delivery)</label>
                <select id="student_id" name="student_id">
                    {student_options}
                </select>
                <button type="submit">Send</button>
            </form>
        </section>"#,
    );

    let flash = compose_flash(params.status.as_deref(), params.error.as_deref());
    Ok(Html(render_page("Send notification", &user, &flash, &body)))
}

/// Delivers a notification to one student or every student. Broadcast is a
/// single multi-row insert so a partial send cannot occur.
pub async fn send_notification(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<NotificationForm>,
) -> Result<Redirect, Redirect> {
    let admin = require_admin_user(&state, &jar).await?;

    let message = form.message.trim();
    if message.is_empty() {
        return Ok(Redirect::to("/admin/notifications?error=missing_message"));
    }

    let result = if form.recipient_type == "all" {
        sqlx::query(
            "INSERT INTO notifications (user_id, message, created_at)
             SELECT id, $1, $2 FROM users WHERE role = 'student'",
        )
        .bind(message)
        .bind(Utc::now())
        .execute(state.pool_ref())
        .await
    } else {
        let Ok(student_id) = form.student_id.trim().parse::<i64>() else {
            return Ok(Redirect::to("/admin/notifications?error=missing_student"));
        };
        match data::fetch_student(state.pool_ref(), student_id).await {
            Ok(Some(_)) => {}
            Ok(None) => return Ok(Redirect::to("/admin/notifications?error=missing_student")),
            Err(err) => {
                error!(?err, "failed to verify notification recipient");
                return Ok(Redirect::to("/admin/notifications?error=server"));
            }
        }
        sqlx::query("INSERT INTO notifications (user_id, message, created_at) VALUES ($1, $2, $3)")
            .bind(student_id)
            .bind(message)
            .bind(Utc::now())
            .execute(state.pool_ref())
            .await
    };

    match result {
        Ok(res) => {
            info!(
                admin_id = admin.id,
                recipients = res.rows_affected(),
                "notification sent"
            );
            Ok(Redirect::to("/admin/notifications?status=notification_sent"))
        }
        Err(err) => {
            error!(?err, "failed to send notification");
            Ok(Redirect::to("/admin/notifications?error=server"))
        }
    }
}
