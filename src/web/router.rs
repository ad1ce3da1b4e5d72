use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::web::{
    AppState, admin, announcements, assignments, auth, dashboard, feedback, health, landing,
    notifications, profile,
};

pub fn build_router(state: AppState) -> Router {
    // Multipart parsing needs headroom beyond the file ceiling itself; the
    // upload handler enforces the exact per-file limit.
    let body_limit = state.config().max_upload_bytes as usize + 64 * 1024;

    Router::new()
        .route("/", get(landing::index))
        .route("/signup", get(auth::signup_page).post(auth::process_signup))
        .route("/login", get(auth::login_page).post(auth::process_login))
        .route("/logout", post(auth::logout))
        .route("/health", get(health::health))
        .route("/dashboard", get(dashboard::dashboard))
        .route(
            "/profile",
            get(profile::profile_page).post(profile::update_profile),
        )
        .route(
            "/password",
            get(profile::password_page).post(profile::change_password),
        )
        .route("/assignments", get(assignments::list))
        .route(
            "/assignments/upload",
            get(assignments::upload_page).post(assignments::upload),
        )
        .route("/assignments/:id/download", get(assignments::download))
        .route("/assignments/:id/delete", post(assignments::delete))
        .route("/announcements", get(announcements::list))
        .route(
            "/feedback",
            get(feedback::feedback_page).post(feedback::submit_feedback),
        )
        .route("/notifications", get(notifications::list))
        .route("/notifications/:id/read", post(notifications::mark_read))
        .route("/admin/dashboard", get(admin::dashboard))
        .route("/admin/students", get(admin::student_list))
        .route("/admin/students/:id", get(admin::student_detail))
        .route("/admin/assignments", get(admin::assignment_list))
        .route(
            "/admin/assignments/:id/grade",
            get(admin::grade_page).post(admin::grade),
        )
        .route("/admin/announcements", get(admin::announcement_list))
        .route(
            "/admin/announcements/new",
            get(admin::create_page).post(admin::create_announcement),
        )
        .route(
            "/admin/announcements/:id/edit",
            get(admin::edit_page).post(admin::update_announcement),
        )
        .route(
            "/admin/announcements/:id/delete",
            post(admin::delete_announcement),
        )
        .route("/admin/feedback", get(admin::feedback_list))
        .route(
            "/admin/notifications",
            get(admin::send_page).post(admin::send_notification),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
