pub mod config;
pub mod web;

pub use config::AppConfig;
pub use web::{AppState, AuthUser, SESSION_COOKIE, build_router, escape_html};
