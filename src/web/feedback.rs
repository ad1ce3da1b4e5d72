use axum::{
    extract::{Form, Query, State},
    response::{Html, Redirect},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::Deserialize;
use tracing::{error, info};

use crate::web::{
    AppState, compose_flash, render_page,
    auth::require_user,
    dashboard::DashboardQuery,
};

#[derive(Deserialize)]
pub struct FeedbackForm {
    pub subject: String,
    pub message: String,
    pub rating: String,
}

pub async fn feedback_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<DashboardQuery>,
) -> Result<Html<String>, Redirect> {
    let user = require_user(&state, &jar).await?;

    let body = r#"<section class="panel">
            <h2>Submit feedback</h2>
            <form method="post" action="/feedback">
                <label for="subject">Subject</label>
                <input id="subject" name="subject" required>
                <label for="message">Message</label>
                <textarea id="message" name="message" required></textarea>
                <label for="rating">Rating (1 = poor, 5 = excellent)</label>
                <select id="rating" name="rating">
                    <option value="5">5</option>
                    <option value="4">4</option>
                    <option value="3">3</option>
                    <option value="2">2</option>
                    <option value="1">1</option>
                </select>
                <button type="submit">Send feedback</button>
            </form>
        </section>"#;

    let flash = compose_flash(params.status.as_deref(), params.error.as_deref());
    Ok(Html(render_page("Feedback", &user, &flash, body)))
}

pub async fn submit_feedback(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<FeedbackForm>,
) -> Result<Redirect, Redirect> {
    let user = require_user(&state, &jar).await?;

    let subject = form.subject.trim();
    let message = form.message.trim();
    if subject.is_empty() || message.is_empty() {
        return Ok(Redirect::to("/feedback?error=missing_fields"));
    }
    let rating = form.rating.trim().parse::<i64>().ok();
    let Some(rating @ 1..=5) = rating else {
        return Ok(Redirect::to("/feedback?error=invalid_rating"));
    };

    let result = sqlx::query(
        "INSERT INTO feedback (user_id, subject, message, rating, created_at)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(user.id)
    .bind(subject)
    .bind(message)
    .bind(rating)
    .bind(Utc::now())
    .execute(state.pool_ref())
    .await;

    match result {
        Ok(_) => {
            info!(user_id = user.id, rating, "feedback submitted");
            Ok(Redirect::to("/dashboard?status=feedback_sent"))
        }
        Err(err) => {
            error!(?err, "failed to store feedback");
            Ok(Redirect::to("/feedback?error=server"))
        }
    }
}
