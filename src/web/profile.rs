use axum::{
    extract::{Form, Query, State},
    response::{Html, Redirect},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::{error, info};

use crate::web::{
    AppState, compose_flash, data, escape_html, render_page,
    auth::{self, require_user},
    dashboard::DashboardQuery,
    templates::format_timestamp,
};

#[derive(Deserialize)]
pub struct ProfileForm {
    pub name: String,
    pub department: String,
    pub year: String,
}

#[derive(Deserialize)]
pub struct PasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

pub async fn profile_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<DashboardQuery>,
) -> Result<Html<String>, Redirect> {
    let user = require_user(&state, &jar).await?;

    let row = match data::fetch_user(state.pool_ref(), user.id).await {
        Ok(Some(row)) => row,
        Ok(None) => return Err(Redirect::to("/login")),
        Err(err) => {
            error!(?err, "failed to load profile");
            return Err(Redirect::to("/dashboard?error=server"));
        }
    };

    let last_login = row
        .last_login
        .map(|at| format_timestamp(&at))
        .unwrap_or_else(|| "never".to_string());

    let body = format!(
        r#"<section class="panel">
            <h2>Profile</h2>
            <p class="note">Registered {created} · Last login {last_login} · Role: {role}</p>
            <form method="post" action="/profile">
                <label for="name">Full name</label>
                <input id="name" name="name" value="{name}" required>
                <label for="department">Department</label>
                <input id="department" name="department" value="{department}" required>
                <label for="year">Year of study</label>
                <input id="year" name="year" type="number" min="0" max="7" value="{year}" required>
                <button type="submit">Save changes</button>
            </form>
        </section>
        <section class="panel">
            <h2>Password</h2>
            <p class="note">Email ({email}) cannot be changed. <a href="/password">Change password</a>.</p>
        </section>"#,
        created = format_timestamp(&row.created_at),
        last_login = last_login,
        role = escape_html(&row.role),
        name = escape_html(&row.name),
        department = escape_html(&row.department),
        year = row.year,
        email = escape_html(&row.email),
    );

    let flash = compose_flash(params.status.as_deref(), params.error.as_deref());
    Ok(Html(render_page("Profile", &user, &flash, &body)))
}

pub async fn update_profile(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<ProfileForm>,
) -> Result<Redirect, Redirect> {
    let user = require_user(&state, &jar).await?;

    let name = form.name.trim();
    let department = form.department.trim();
    if name.is_empty() || department.is_empty() {
        return Ok(Redirect::to("/profile?error=missing_fields"));
    }
    let Ok(year) = form.year.trim().parse::<i64>() else {
        return Ok(Redirect::to("/profile?error=invalid_year"));
    };

    // Role and email are deliberately untouchable here.
    let result = sqlx::query("UPDATE users SET name = $2, department = $3, year = $4 WHERE id = $1")
        .bind(user.id)
        .bind(name)
        .bind(department)
        .bind(year)
        .execute(state.pool_ref())
        .await;

    match result {
        Ok(_) => {
            info!(user_id = user.id, "profile updated");
            Ok(Redirect::to("/profile?status=profile_updated"))
        }
        Err(err) => {
            error!(?err, "failed to update profile");
            Ok(Redirect::to("/profile?error=server"))
        }
    }
}

pub async fn password_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<DashboardQuery>,
) -> Result<Html<String>, Redirect> {
    let user = require_user(&state, &jar).await?;

    let body = r#"<section class="panel">
            <h2>Change password</h2>
            <form method="post" action="/password">
                <label for="current_password">Current password</label>
                <input id="current_password" type="password" name="current_password" required>
                <label for="new_password">New password</label>
                <input id="new_password" type="password" name="new_password" required>
                <label for="confirm_password">Confirm new password</label>
                <input id="confirm_password" type="password" name="confirm_password" required>
                <button type="submit">Change password</button>
            </form>
        </section>"#;

    let flash = compose_flash(params.status.as_deref(), params.error.as_deref());
    Ok(Html(render_page("Change password", &user, &flash, body)))
}

pub async fn change_password(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<PasswordForm>,
) -> Result<Redirect, Redirect> {
    let user = require_user(&state, &jar).await?;

    let current_hash: Option<String> =
        match sqlx::query_scalar("SELECT password_hash FROM users WHERE id = $1")
            .bind(user.id)
            .fetch_optional(state.pool_ref())
            .await
        {
            Ok(hash) => hash,
            Err(err) => {
                error!(?err, "failed to load password hash");
                return Ok(Redirect::to("/password?error=server"));
            }
        };

    let Some(current_hash) = current_hash else {
        return Err(Redirect::to("/login"));
    };
    if !auth::verify_password(&form.current_password, &current_hash) {
        return Ok(Redirect::to("/password?error=wrong_password"));
    }
    if form.new_password != form.confirm_password {
        return Ok(Redirect::to("/password?error=password_mismatch"));
    }
    if let Err(code) = auth::validate_password_strength(&form.new_password) {
        return Ok(Redirect::to(&format!("/password?error={code}")));
    }

    let password_hash = match auth::hash_password(&form.new_password) {
        Ok(hash) => hash,
        Err(err) => {
            error!(?err, "failed to hash new password");
            return Ok(Redirect::to("/password?error=server"));
        }
    };

    match sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
        .bind(user.id)
        .bind(password_hash)
        .execute(state.pool_ref())
        .await
    {
        Ok(_) => {
            info!(user_id = user.id, "password changed");
            Ok(Redirect::to("/profile?status=password_changed"))
        }
        Err(err) => {
            error!(?err, "failed to update password");
            Ok(Redirect::to("/password?error=server"))
        }
    }
}
