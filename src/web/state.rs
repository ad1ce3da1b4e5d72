use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use tracing::info;

use crate::config::AppConfig;

const SEED_ADMIN_EMAIL: &str = "admin@student-portal.com";
const SEED_ADMIN_PASSWORD: &str = "Admin@123";

#[derive(Clone)]
pub struct AppState {
    pool: SqlitePool,
    config: AppConfig,
}

impl AppState {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&config.database_url)
            .await
            .with_context(|| format!("failed to open database at {}", config.database_url))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run database migrations")?;

        tokio::fs::create_dir_all(&config.upload_dir)
            .await
            .with_context(|| format!("failed to create upload directory {}", config.upload_dir))?;

        Ok(Self { pool, config })
    }

    /// Creates the default administrator account when none exists yet.
    pub async fn ensure_seed_admin(&self) -> Result<()> {
        let has_admin: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE role = 'admin')")
                .fetch_one(&self.pool)
                .await
                .context("failed to verify admin presence")?;

        if !has_admin {
            let password_hash = crate::web::auth::hash_password(SEED_ADMIN_PASSWORD)
                .map_err(|err| anyhow!("failed to hash seed admin password: {err}"))?;

            sqlx::query(
                "INSERT INTO users (name, email, password_hash, department, year, role, created_at)
                 VALUES ($1, $2, $3, $4, $5, 'admin', $6)",
            )
            .bind("System Administrator")
            .bind(SEED_ADMIN_EMAIL)
            .bind(password_hash)
            .bind("Administration")
            .bind(0i64)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .context("failed to insert seed admin user")?;

            info!(
                "Seeded default admin account '{SEED_ADMIN_EMAIL}' (password: '{SEED_ADMIN_PASSWORD}'). Update it promptly."
            );
        }

        Ok(())
    }

    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    pub fn pool_ref(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
