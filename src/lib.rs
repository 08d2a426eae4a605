pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod utilities;

use std::sync::Arc;

use actix_web::HttpResponse;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use error::DirectoryError;

pub use config::Settings;
pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;

pub use auth::{AccessToken, AuthService, TokenCodec};
pub use db::{User, UserDirectory, UserStore};

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Application state shared across all workers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub db_pool: PgPool,
    pub directory: UserDirectory,
    pub auth: Arc<AuthService<UserDirectory>>,
}

impl AppState {
    pub async fn new(config: Settings) -> Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .connect(&config.database.url)
            .await
            .map_err(|e| AppError::Directory(DirectoryError::Unavailable(e.to_string())))?;

        let directory = UserDirectory::new(db_pool.clone());
        let codec = TokenCodec::new(&config.auth.jwt_secret, &config.auth.jwt_algorithm)?;
        let auth = Arc::new(AuthService::new(
            directory.clone(),
            codec,
            config.auth.token_ttl_seconds,
        ));

        Ok(Self {
            config: Arc::new(config),
            db_pool,
            directory,
            auth,
        })
    }

    pub async fn shutdown(&self) -> Result<()> {
        // Close database connections
        self.db_pool.close().await;

        Ok(())
    }
}
