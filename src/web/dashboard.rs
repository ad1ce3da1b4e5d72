use axum::{
    extract::{Query, State},
    response::{Html, Redirect},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::error;

use crate::web::{
    AppState, compose_flash, data, escape_html, render_page,
    auth::require_user,
    templates::format_timestamp,
};

#[derive(Default, Deserialize)]
pub struct DashboardQuery {
    pub status: Option<String>,
    pub error: Option<String>,
}

const RECENT_ANNOUNCEMENTS: i64 = 3;

pub async fn dashboard(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<DashboardQuery>,
) -> Result<Html<String>, Redirect> {
    let user = require_user(&state, &jar).await?;

    let announcements = data::fetch_recent_announcements(state.pool_ref(), RECENT_ANNOUNCEMENTS)
        .await
        .unwrap_or_else(|err| {
            error!(?err, "failed to load recent announcements");
            Vec::new()
        });
    let assignment_count = data::count_assignments_for_user(state.pool_ref(), user.id)
        .await
        .unwrap_or(0);
    let unread_count = data::count_unread_notifications(state.pool_ref(), user.id)
        .await
        .unwrap_or(0);

    let mut announcement_html = String::new();
    if announcements.is_empty() {
        announcement_html.push_str("<p class=\"note\">No announcements yet.</p>");
    } else {
        for item in &announcements {
            announcement_html.push_str(&format!(
                "<p><strong>{title}</strong> <span class=\"note\">({date})</span><br>{message}</p>",
                title = escape_html(&item.title),
                date = format_timestamp(&item.created_at),
                message = escape_html(&item.message),
            ));
        }
    }

    let body = format!(
        r#"<div class="stat-grid">
            <div class="stat"><strong>{assignment_count}</strong> assignments submitted</div>
            <div class="stat"><strong>{unread_count}</strong> unread <a href="/notifications">notifications</a></div>
        </div>
        <section class="panel">
            <h2>Recent announcements</h2>
            {announcement_html}
            <p><a href="/announcements">All announcements →</a></p>
        </section>"#,
    );

    let flash = compose_flash(params.status.as_deref(), params.error.as_deref());
    Ok(Html(render_page(
        &format!("Welcome, {}", escape_html(&user.name)),
        &user,
        &flash,
        &body,
    )))
}
