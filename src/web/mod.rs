pub mod admin;
pub mod announcements;
pub mod assignments;
pub mod auth;
pub mod dashboard;
pub mod data;
pub mod feedback;
pub mod health;
pub mod landing;
pub mod models;
pub mod notifications;
pub mod profile;
pub mod router;
pub mod state;
pub mod storage;
pub mod templates;
pub mod uploads;

pub use auth::{AuthUser, SESSION_COOKIE, require_user};
pub use router::build_router;
pub use state::AppState;
pub use templates::{compose_flash, escape_html, render_page};
