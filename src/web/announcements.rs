use axum::{
    extract::{Query, State},
    response::{Html, Redirect},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::error;

use crate::web::{
    AppState, data, escape_html, render_page,
    auth::require_user,
    templates::format_timestamp,
};

#[derive(Default, Deserialize)]
pub struct AnnouncementQuery {
    pub search: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<AnnouncementQuery>,
) -> Result<Html<String>, Redirect> {
    let user = require_user(&state, &jar).await?;

    let search = params.search.as_deref().map(str::trim);
    let announcements = match data::search_announcements(state.pool_ref(), search).await {
        Ok(rows) => rows,
        Err(err) => {
            error!(?err, "failed to search announcements");
            return Err(Redirect::to("/dashboard?error=server"));
        }
    };

    let mut items = String::new();
    if announcements.is_empty() {
        items.push_str("<p class=\"note\">No announcements found.</p>");
    } else {
        for item in &announcements {
            let updated = item
                .updated_at
                .map(|at| format!(" · updated {}", format_timestamp(&at)))
                .unwrap_or_default();
            items.push_str(&format!(
                r#"<section class="panel">
                    <h2>{title}</h2>
                    <p class="note">{author} · {created}{updated}</p>
                    <p>{message}</p>
                </section>"#,
                title = escape_html(&item.title),
                author = escape_html(&item.author_name),
                created = format_timestamp(&item.created_at),
                updated = updated,
                message = escape_html(&item.message),
            ));
        }
    }

    let body = format!(
        r#"<section class="panel">
            <form method="get" action="/announcements">
                <label for="search">Search announcements</label>
                <input id="search" name="search" value="{search}" placeholder="Search title or message">
                <button type="submit">Search</button>
            </form>
        </section>
        {items}"#,
        search = escape_html(search.unwrap_or_default()),
    );

    Ok(Html(render_page("Announcements", &user, "", &body)))
}
