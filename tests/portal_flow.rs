use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use sqlx::Row;
use student_portal::{AppConfig, AppState, build_router};
use tempfile::TempDir;
use tower::ServiceExt;

const MULTIPART_BOUNDARY: &str = "----portal-test-boundary";

struct TestPortal {
    state: AppState,
    router: Router,
    _dir: TempDir,
}

async fn setup() -> TestPortal {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("test.db");
    let upload_dir = dir.path().join("uploads");

    let config = AppConfig {
        database_url: format!("sqlite://{}?mode=rwc", db_path.display()),
        upload_dir: upload_dir.display().to_string(),
        ..AppConfig::default()
    };

    let state = AppState::new(config).await.expect("state");
    state.ensure_seed_admin().await.expect("seed admin");
    let router = build_router(state.clone());

    TestPortal {
        state,
        router,
        _dir: dir,
    }
}

fn form_request(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("request")
}

fn multipart_upload_request(filename: &str, content: &[u8], cookie: &str) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/assignments/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        )
        .header(header::COOKIE, cookie)
        .body(Body::from(body))
        .expect("request")
}

fn location_of(response: &axum::response::Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn session_cookie_of(response: &axum::response::Response) -> String {
    let raw = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .expect("session cookie");
    raw.split(';').next().expect("cookie pair").to_string()
}

async fn signup(portal: &TestPortal, name: &str, email: &str, password: &str) -> String {
    let body = format!(
        "name={name}&email={email}&password={password}&confirm_password={password}\
         &department=Physics&year=2"
    );
    let response = portal
        .router
        .clone()
        .oneshot(form_request("/signup", &body, None))
        .await
        .expect("signup response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    location_of(&response)
}

async fn login(portal: &TestPortal, email: &str, password: &str) -> String {
    let body = format!("email={email}&password={password}");
    let response = portal
        .router
        .clone()
        .oneshot(form_request("/login", &body, None))
        .await
        .expect("login response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    session_cookie_of(&response)
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8_lossy(&bytes).to_string()
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let portal = setup().await;

    let first = signup(&portal, "Jane", "jane@uni.edu", "Passw0rdA").await;
    assert_eq!(first, "/login?status=registered");

    let second = signup(&portal, "Impostor", "jane@uni.edu", "Passw0rdB").await;
    assert_eq!(second, "/signup?error=email_taken");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = $1")
        .bind("jane@uni.edu")
        .fetch_one(portal.state.pool_ref())
        .await
        .expect("count");
    assert_eq!(count, 1);
}

#[tokio::test]
async fn students_cannot_reach_admin_pages() {
    let portal = setup().await;
    signup(&portal, "Jane", "jane@uni.edu", "Passw0rdA").await;
    let cookie = login(&portal, "jane@uni.edu", "Passw0rdA").await;

    for uri in [
        "/admin/dashboard",
        "/admin/students",
        "/admin/assignments",
        "/admin/announcements",
        "/admin/feedback",
        "/admin/notifications",
    ] {
        let response = portal
            .router
            .clone()
            .oneshot(get_request(uri, Some(&cookie)))
            .await
            .expect("admin page response");
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "uri {uri}");
        assert_eq!(location_of(&response), "/dashboard?error=not_authorized");
    }

    // Mutations are gated the same way.
    let response = portal
        .router
        .clone()
        .oneshot(form_request(
            "/admin/announcements/new",
            "title=x&message=y",
            Some(&cookie),
        ))
        .await
        .expect("admin post response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&response), "/dashboard?error=not_authorized");
}

#[tokio::test]
async fn anonymous_requests_go_to_login() {
    let portal = setup().await;

    let response = portal
        .router
        .clone()
        .oneshot(get_request("/assignments", None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&response), "/login");

    let response = portal
        .router
        .clone()
        .oneshot(get_request("/admin/dashboard", None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&response), "/login");
}

#[tokio::test]
async fn disallowed_file_type_leaves_no_trace() {
    let portal = setup().await;
    signup(&portal, "Jane", "jane@uni.edu", "Passw0rdA").await;
    let cookie = login(&portal, "jane@uni.edu", "Passw0rdA").await;

    let response = portal
        .router
        .clone()
        .oneshot(multipart_upload_request("payload.exe", b"MZ...", &cookie))
        .await
        .expect("upload response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&response), "/assignments/upload?error=file_type");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM assignments")
        .fetch_one(portal.state.pool_ref())
        .await
        .expect("count");
    assert_eq!(count, 0);

    let mut entries = tokio::fs::read_dir(&portal.state.config().upload_dir)
        .await
        .expect("upload dir");
    assert!(entries.next_entry().await.expect("read dir").is_none());
}

#[tokio::test]
async fn grading_missing_submission_changes_nothing() {
    let portal = setup().await;
    let cookie = login(&portal, "admin@student-portal.com", "Admin@123").await;

    let response = portal
        .router
        .clone()
        .oneshot(form_request(
            "/admin/assignments/999/grade",
            "grade=A&comments=great",
            Some(&cookie),
        ))
        .await
        .expect("grade response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&response), "/admin/assignments?error=not_found");

    let notifications: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications")
        .fetch_one(portal.state.pool_ref())
        .await
        .expect("count");
    assert_eq!(notifications, 0);
}

#[tokio::test]
async fn mark_read_is_idempotent_and_owner_scoped() {
    let portal = setup().await;
    signup(&portal, "Jane", "jane@uni.edu", "Passw0rdA").await;
    let cookie = login(&portal, "jane@uni.edu", "Passw0rdA").await;

    let user_id: i64 = sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
        .bind("jane@uni.edu")
        .fetch_one(portal.state.pool_ref())
        .await
        .expect("user id");
    sqlx::query("INSERT INTO notifications (user_id, message, created_at) VALUES ($1, $2, $3)")
        .bind(user_id)
        .bind("Welcome aboard")
        .bind(chrono::Utc::now())
        .execute(portal.state.pool_ref())
        .await
        .expect("insert notification");
    let notification_id: i64 = sqlx::query_scalar("SELECT id FROM notifications")
        .fetch_one(portal.state.pool_ref())
        .await
        .expect("notification id");

    for _ in 0..2 {
        let response = portal
            .router
            .clone()
            .oneshot(form_request(
                &format!("/notifications/{notification_id}/read"),
                "",
                Some(&cookie),
            ))
            .await
            .expect("mark read response");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location_of(&response), "/notifications");
    }

    let is_read: bool = sqlx::query("SELECT is_read FROM notifications WHERE id = $1")
        .bind(notification_id)
        .fetch_one(portal.state.pool_ref())
        .await
        .expect("row")
        .get::<bool, _>("is_read");
    assert!(is_read);

    // Another student's session cannot touch the row.
    signup(&portal, "Omar", "omar@uni.edu", "Passw0rdA").await;
    let other_cookie = login(&portal, "omar@uni.edu", "Passw0rdA").await;
    let response = portal
        .router
        .clone()
        .oneshot(form_request(
            &format!("/notifications/{notification_id}/read"),
            "",
            Some(&other_cookie),
        ))
        .await
        .expect("foreign mark read response");
    assert_eq!(location_of(&response), "/notifications?error=not_found");
}

#[tokio::test]
async fn submission_grading_round_trip() {
    let portal = setup().await;
    signup(&portal, "Jane", "jane@uni.edu", "Passw0rdA").await;
    let student_cookie = login(&portal, "jane@uni.edu", "Passw0rdA").await;

    let response = portal
        .router
        .clone()
        .oneshot(multipart_upload_request(
            "essay.pdf",
            b"%PDF-1.4 fake body",
            &student_cookie,
        ))
        .await
        .expect("upload response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&response), "/assignments?status=uploaded");

    let assignment_id: i64 = sqlx::query_scalar("SELECT id FROM assignments")
        .fetch_one(portal.state.pool_ref())
        .await
        .expect("assignment id");

    let admin_cookie = login(&portal, "admin@student-portal.com", "Admin@123").await;
    let listing = portal
        .router
        .clone()
        .oneshot(get_request("/admin/assignments", Some(&admin_cookie)))
        .await
        .expect("admin list response");
    assert_eq!(listing.status(), StatusCode::OK);
    assert!(body_text(listing).await.contains("essay.pdf"));

    let response = portal
        .router
        .clone()
        .oneshot(form_request(
            &format!("/admin/assignments/{assignment_id}/grade"),
            "grade=90&comments=Solid+work",
            Some(&admin_cookie),
        ))
        .await
        .expect("grade response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&response), "/admin/assignments?status=graded");

    let page = portal
        .router
        .clone()
        .oneshot(get_request("/assignments", Some(&student_cookie)))
        .await
        .expect("student list response");
    assert_eq!(page.status(), StatusCode::OK);
    let html = body_text(page).await;
    assert!(html.contains("essay.pdf"));
    assert!(html.contains("90"));
    assert!(html.contains("Solid work"));

    let notifications: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications")
        .fetch_one(portal.state.pool_ref())
        .await
        .expect("count");
    assert_eq!(notifications, 1);
}

#[tokio::test]
async fn health_reports_database_state() {
    let portal = setup().await;

    let response = portal
        .router
        .clone()
        .oneshot(get_request("/health", None))
        .await
        .expect("health response");
    assert_eq!(response.status(), StatusCode::OK);
    let payload: serde_json::Value =
        serde_json::from_str(&body_text(response).await).expect("json body");
    assert_eq!(payload["status"], "healthy");
    assert_eq!(payload["database"], "connected");
}

#[tokio::test]
async fn logout_requires_a_session() {
    let portal = setup().await;

    let response = portal
        .router
        .clone()
        .oneshot(form_request("/logout", "", None))
        .await
        .expect("logout response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&response), "/login");
}

#[tokio::test]
async fn logout_invalidates_the_session() {
    let portal = setup().await;
    signup(&portal, "Jane", "jane@uni.edu", "Passw0rdA").await;
    let cookie = login(&portal, "jane@uni.edu", "Passw0rdA").await;

    let response = portal
        .router
        .clone()
        .oneshot(form_request("/logout", "", Some(&cookie)))
        .await
        .expect("logout response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&response), "/login?status=logged_out");

    let response = portal
        .router
        .clone()
        .oneshot(get_request("/dashboard", Some(&cookie)))
        .await
        .expect("dashboard response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&response), "/login");
}
