use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use axum::{
    extract::{Form, State},
    response::{Html, Redirect},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration as ChronoDuration, Utc};
use cookie::time::Duration as CookieDuration;
use rand_core::OsRng;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::web::{AppState, templates};

pub const SESSION_COOKIE: &str = "portal_session";

/// Row fetched during login, before the password check has passed.
#[derive(Clone, sqlx::FromRow)]
pub struct DbUserAuth {
    pub id: i64,
    pub name: String,
    pub role: String,
    pub password_hash: String,
}

/// The authenticated user attached to a valid session.
#[derive(Clone, sqlx::FromRow)]
pub struct AuthUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub department: String,
    pub year: String,
}

#[derive(Default, Deserialize)]
pub struct AuthPageQuery {
    pub status: Option<String>,
    pub error: Option<String>,
}

pub async fn login_page(
    State(state): State<AppState>,
    jar: CookieJar,
    axum::extract::Query(params): axum::extract::Query<AuthPageQuery>,
) -> Result<Html<String>, Redirect> {
    if current_user(&state, &jar).await.is_some() {
        return Err(Redirect::to("/"));
    }

    let flash = templates::compose_flash(params.status.as_deref(), params.error.as_deref());
    Ok(Html(templates::render_login_page(&flash)))
}

pub async fn process_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Redirect), Redirect> {
    let email = form.email.trim().to_ascii_lowercase();
    if email.is_empty() || form.password.is_empty() {
        return Err(Redirect::to("/login?error=missing_credentials"));
    }

    let user = match fetch_user_by_email(state.pool_ref(), &email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!(%email, "login attempt for unknown account");
            return Err(Redirect::to("/login?error=invalid_credentials"));
        }
        Err(err) => {
            error!(?err, "failed to fetch user during login");
            return Err(Redirect::to("/login?error=server"));
        }
    };

    if !verify_password(&form.password, &user.password_hash) {
        warn!(%email, "failed login attempt");
        return Err(Redirect::to("/login?error=invalid_credentials"));
    }

    let token = Uuid::new_v4();
    let expires_at = Utc::now() + ChronoDuration::minutes(state.config().session_ttl_minutes);

    if let Err(err) =
        sqlx::query("INSERT INTO sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(token.to_string())
            .bind(user.id)
            .bind(expires_at)
            .execute(state.pool_ref())
            .await
    {
        error!(?err, "failed to create session");
        return Err(Redirect::to("/login?error=server"));
    }

    if let Err(err) = sqlx::query("UPDATE users SET last_login = $2 WHERE id = $1")
        .bind(user.id)
        .bind(Utc::now())
        .execute(state.pool_ref())
        .await
    {
        error!(?err, "failed to record last login");
    }

    info!(user_id = user.id, "successful login");

    let jar = jar.add(session_cookie(
        token,
        state.config().session_ttl_minutes,
    ));
    let target = if user.role == "admin" {
        "/admin/dashboard"
    } else {
        "/dashboard"
    };
    Ok((jar, Redirect::to(target)))
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), Redirect> {
    require_user(&state, &jar).await?;
    let mut jar = jar;

    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Err(err) = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(cookie.value().to_string())
            .execute(state.pool_ref())
            .await
        {
            error!(?err, "failed to remove session during logout");
        }
    }

    let mut removal = Cookie::new(SESSION_COOKIE, "");
    removal.set_path("/");
    removal.set_http_only(true);
    removal.set_same_site(SameSite::Lax);
    removal.set_max_age(CookieDuration::seconds(0));
    jar = jar.remove(removal);

    Ok((jar, Redirect::to("/login?status=logged_out")))
}

pub async fn signup_page(
    State(state): State<AppState>,
    jar: CookieJar,
    axum::extract::Query(params): axum::extract::Query<AuthPageQuery>,
) -> Result<Html<String>, Redirect> {
    if current_user(&state, &jar).await.is_some() {
        return Err(Redirect::to("/"));
    }

    let flash = templates::compose_flash(params.status.as_deref(), params.error.as_deref());
    Ok(Html(templates::render_signup_page(&flash)))
}

pub async fn process_signup(
    State(state): State<AppState>,
    Form(form): Form<SignupForm>,
) -> Redirect {
    let name = form.name.trim();
    let email = form.email.trim().to_ascii_lowercase();
    let department = form.department.trim();
    let year = form.year.trim().parse::<i64>().ok();

    if name.is_empty() || email.is_empty() || department.is_empty() || form.password.is_empty() {
        return Redirect::to("/signup?error=missing_fields");
    }
    let Some(year) = year else {
        return Redirect::to("/signup?error=invalid_year");
    };
    if !looks_like_email(&email) {
        return Redirect::to("/signup?error=invalid_email");
    }
    if form.password != form.confirm_password {
        return Redirect::to("/signup?error=password_mismatch");
    }
    if let Err(code) = validate_password_strength(&form.password) {
        return Redirect::to(&format!("/signup?error={code}"));
    }

    let password_hash = match hash_password(&form.password) {
        Ok(hash) => hash,
        Err(err) => {
            error!(?err, "failed to hash password during signup");
            return Redirect::to("/signup?error=server");
        }
    };

    // Role is fixed at creation; self-service signup only ever creates students.
    let result = sqlx::query(
        "INSERT INTO users (name, email, password_hash, department, year, role, created_at)
         VALUES ($1, $2, $3, $4, $5, 'student', $6)",
    )
    .bind(name)
    .bind(&email)
    .bind(password_hash)
    .bind(department)
    .bind(year)
    .bind(Utc::now())
    .execute(state.pool_ref())
    .await;

    match result {
        Ok(_) => {
            info!(%email, "new student registered");
            Redirect::to("/login?status=registered")
        }
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            warn!(%email, "signup attempt with existing email");
            Redirect::to("/signup?error=email_taken")
        }
        Err(err) => {
            error!(?err, "failed to create user");
            Redirect::to("/signup?error=server")
        }
    }
}

/// Resolves the session cookie to a user, sliding the inactivity window
/// forward on success.
pub async fn current_user(state: &AppState, jar: &CookieJar) -> Option<AuthUser> {
    let token = jar.get(SESSION_COOKIE)?.value().to_string();
    Uuid::parse_str(&token).ok()?;

    let user = match fetch_user_by_session(state.pool_ref(), &token).await {
        Ok(user) => user?,
        Err(err) => {
            error!(?err, "failed to validate session");
            return None;
        }
    };

    let expires_at = Utc::now() + ChronoDuration::minutes(state.config().session_ttl_minutes);
    if let Err(err) = sqlx::query("UPDATE sessions SET expires_at = $2 WHERE id = $1")
        .bind(&token)
        .bind(expires_at)
        .execute(state.pool_ref())
        .await
    {
        error!(?err, "failed to extend session");
    }

    Some(user)
}

/// Guard for routes that require a signed-in user.
pub async fn require_user(state: &AppState, jar: &CookieJar) -> Result<AuthUser, Redirect> {
    current_user(state, jar).await.ok_or_else(|| Redirect::to("/login"))
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let parsed = PasswordHash::new(password_hash);
    match parsed {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

/// Minimum bar for new passwords: length, case mix, and a digit.
/// Returns the flash code describing the first failed rule.
pub fn validate_password_strength(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("password_short");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("password_upper");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err("password_lower");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("password_digit");
    }
    Ok(())
}

pub fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

async fn fetch_user_by_email(pool: &SqlitePool, email: &str) -> sqlx::Result<Option<DbUserAuth>> {
    sqlx::query_as::<_, DbUserAuth>(
        "SELECT id, name, role, password_hash FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}

async fn fetch_user_by_session(pool: &SqlitePool, token: &str) -> sqlx::Result<Option<AuthUser>> {
    sqlx::query_as::<_, AuthUser>(
        "SELECT users.id, users.name, users.email, users.role
         FROM sessions JOIN users ON users.id = sessions.user_id
         WHERE sessions.id = $1 AND sessions.expires_at > $2",
    )
    .bind(token)
    .bind(Utc::now())
    .fetch_optional(pool)
    .await
}

fn session_cookie(token: Uuid, ttl_minutes: i64) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token.to_string());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(CookieDuration::minutes(ttl_minutes));
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_roundtrip_verifies() {
        let hash = hash_password("Secret123").expect("hashing should succeed");
        assert!(verify_password("Secret123", &hash));
        assert!(!verify_password("Secret124", &hash));
    }

    #[test]
    fn verify_rejects_malformed_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn strength_rules_fire_in_order() {
        assert_eq!(validate_password_strength("Ab1"), Err("password_short"));
        assert_eq!(
            validate_password_strength("alllower1"),
            Err("password_upper")
        );
        assert_eq!(
            validate_password_strength("ALLUPPER1"),
            Err("password_lower")
        );
        assert_eq!(
            validate_password_strength("NoDigitsHere"),
            Err("password_digit")
        );
        assert_eq!(validate_password_strength("Passw0rd"), Ok(()));
    }

    #[test]
    fn email_shapes() {
        assert!(looks_like_email("jane@uni.edu"));
        assert!(!looks_like_email("jane@uni"));
        assert!(!looks_like_email("@uni.edu"));
        assert!(!looks_like_email("jane uni@x.com"));
        assert!(!looks_like_email("jane@.edu"));
        assert!(!looks_like_email("no-at-sign"));
    }
}
