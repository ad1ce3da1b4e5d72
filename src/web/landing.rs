use axum::{extract::State, response::Redirect};
use axum_extra::extract::cookie::CookieJar;

use crate::web::{AppState, auth};

/// Root dispatch: signed-in users land on their role's dashboard, everyone
/// else is sent to the login page.
pub async fn index(State(state): State<AppState>, jar: CookieJar) -> Redirect {
    match auth::current_user(&state, &jar).await {
        Some(user) if user.is_admin() => Redirect::to("/admin/dashboard"),
        Some(_) => Redirect::to("/dashboard"),
        None => Redirect::to("/login"),
    }
}
