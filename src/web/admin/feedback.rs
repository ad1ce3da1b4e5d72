use axum::{
    extract::{Query, State},
    response::{Html, Redirect},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::error;

use crate::web::{
    AppState, data, escape_html, render_page,
    templates::format_timestamp,
};

use super::auth::require_admin_user;

#[derive(Default, Deserialize)]
pub struct FeedbackListQuery {
    // Arrives as a string so the empty "All ratings" option deserializes.
    pub rating: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<FeedbackListQuery>,
) -> Result<Html<String>, Redirect> {
    let user = require_admin_user(&state, &jar).await?;

    let rating = params
        .rating
        .as_deref()
        .and_then(|r| r.parse::<i64>().ok())
        .filter(|r| (1..=5).contains(r));
    let feedback = match data::fetch_feedback(state.pool_ref(), rating, None).await {
        Ok(rows) => rows,
        Err(err) => {
            error!(?err, "failed to load feedback");
            return Err(Redirect::to("/admin/dashboard?error=server"));
        }
    };

    let mut filter_options = String::from(r#"<option value="">All ratings</option>"#);
    for value in 1..=5 {
        let selected = if rating == Some(value) { " selected" } else { "" };
        filter_options.push_str(&format!(
            r#"<option value="{value}"{selected}>{value}</option>"#
        ));
    }

    let mut rows = String::new();
    if feedback.is_empty() {
        rows.push_str(r#"<tr><td colspan="5">No feedback found.</td></tr>"#);
    } else {
        for item in &feedback {
            rows.push_str(&format!(
                r#"<tr>
                    <td>{author}</td>
                    <td>{subject}</td>
                    <td>{rating}/5</td>
                    <td>{message}</td>
                    <td>{created}</td>
                </tr>"#,
                author = escape_html(&item.author_name),
                subject = escape_html(&item.subject),
                rating = item.rating,
                message = escape_html(&item.message),
                created = format_timestamp(&item.created_at),
            ));
        }
    }

    let body = format!(
        r#"<section class="panel">
            <h2>Student feedback</h2>
            <form method="get" action="/admin/feedback">
                <label for="rating">Filter by rating</label>
                <select id="rating" name="rating" onchange="this.form.submit()">
                    {filter_options}
                </select>
            </form>
            <table>
                <tr><th>Student</th><th>Subject</th><th>Rating</th><th>Message</th><th>Submitted</th></tr>
                {rows}
            </table>
        </section>"#,
    );

    Ok(Html(render_page("Feedback review", &user, "", &body)))
}
