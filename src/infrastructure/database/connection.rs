use crate::shared::config::DatabaseConfig;
use crate::shared::error::{AppError, Result};
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::path::Path;
use tracing::info;

pub type DbPool = Pool<Sqlite>;

pub struct Database;

impl Database {
    pub async fn initialize(config: &DatabaseConfig) -> Result<DbPool> {
        let path = config
            .url
            .trim_start_matches("sqlite://")
            .trim_start_matches("sqlite:");

        if !path.starts_with(":memory:") {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }

        let url = if config.url.contains('?') || path.starts_with(":memory:") {
            config.url.clone()
        } else {
            format!("{}?mode=rwc", config.url)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&url)
            .await?;

        info!("Database connected: {}", config.url);

        Self::run_migrations(&pool).await?;

        Ok(pool)
    }

    async fn run_migrations(pool: &DbPool) -> Result<()> {
        info!("Running database migrations...");

        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(AppError::from)?;

        info!("Database migrations completed");
        Ok(())
    }
}
