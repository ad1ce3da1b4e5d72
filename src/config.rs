use std::env;

/// Runtime configuration, read once at startup from the environment
/// (with `.env` support via dotenvy in `main`).
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub upload_dir: String,
    pub max_upload_bytes: u64,
    pub session_ttl_minutes: i64,
    pub port: u16,
}

const DEFAULT_DATABASE_URL: &str = "sqlite://students.db?mode=rwc";
const DEFAULT_UPLOAD_DIR: &str = "storage/uploads";
const DEFAULT_MAX_UPLOAD_BYTES: u64 = 16 * 1024 * 1024;
const DEFAULT_SESSION_TTL_MINUTES: i64 = 60;
const DEFAULT_PORT: u16 = 8080;

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| DEFAULT_UPLOAD_DIR.to_string()),
            max_upload_bytes: env_parsed("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
            session_ttl_minutes: env_parsed("SESSION_TTL_MINUTES", DEFAULT_SESSION_TTL_MINUTES),
            port: env_parsed("PORT", DEFAULT_PORT),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            upload_dir: DEFAULT_UPLOAD_DIR.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            session_ttl_minutes: DEFAULT_SESSION_TTL_MINUTES,
            port: DEFAULT_PORT,
        }
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str, fallback: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = AppConfig::default();
        assert_eq!(config.max_upload_bytes, 16 * 1024 * 1024);
        assert_eq!(config.session_ttl_minutes, 60);
        assert!(config.database_url.starts_with("sqlite:"));
    }
}
