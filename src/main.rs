use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use credo_server::auth::handlers::{current_user, sign_in, sign_up};
use credo_server::utilities::list_users;
use credo_server::{health_check, AppError, AppState, Settings};
use dotenv::dotenv;
use std::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[actix_web::main]
async fn main() -> credo_server::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();

    // Load configuration
    let config = Settings::new()?;
    info!("Configuration loaded successfully");

    info!(
        "Starting server at {}:{}",
        config.server.host, config.server.port
    );

    // Create and bind TCP listener before handing config to the state
    let listener = TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))?;
    let workers = config.server.workers as usize;
    let cors_config = config.cors.clone();

    // Initialize application state
    let state = AppState::new(config).await?;

    // Bring the schema up to date
    sqlx::migrate!("./migrations")
        .run(&state.db_pool)
        .await
        .map_err(|e| AppError::Internal(format!("migration failed: {}", e)))?;
    info!("Database migrations applied");

    let state = web::Data::new(state);

    // Start HTTP server
    HttpServer::new(move || {
        let cors = if cors_config.enabled {
            let cors = Cors::default();

            // Apply specific CORS rules based on configuration
            let cors = if cors_config.allow_any_origin {
                cors.allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .expose_any_header()
            } else {
                // More restrictive CORS for production use
                let mut cors = cors
                    .allowed_methods(vec!["GET", "POST"])
                    .allowed_headers(vec!["Authorization", "Content-Type"])
                    .supports_credentials();
                for origin in &cors_config.allowed_origins {
                    cors = cors.allowed_origin(origin);
                }
                cors
            };

            cors.max_age(cors_config.max_age as usize)
        } else {
            // CORS disabled - use most restrictive settings
            Cors::default()
        };

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .route("/health", web::get().to(health_check))
            .route("/auth/sign-up", web::post().to(sign_up))
            .route("/auth/sign-in", web::post().to(sign_in))
            .route("/auth/user", web::get().to(current_user))
            .route("/utils/users", web::get().to(list_users))
    })
    .listen(listener)?
    .workers(workers)
    .run()
    .await
    .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(())
}
