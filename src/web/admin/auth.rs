use axum::response::Redirect;
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use crate::web::{AppState, AuthUser, auth};

/// Guard for admin-only routes. Anonymous callers go back to the login
/// page; signed-in students are bounced to their own dashboard with a
/// flash, never shown partial admin data.
pub async fn require_admin_user(state: &AppState, jar: &CookieJar) -> Result<AuthUser, Redirect> {
    let Some(user) = auth::current_user(state, jar).await else {
        return Err(Redirect::to("/login"));
    };

    if !user.is_admin() {
        warn!(user_id = user.id, "unauthorized admin access attempt");
        return Err(Redirect::to("/dashboard?error=not_authorized"));
    }

    Ok(user)
}
