//! Noticeboard - Campus notice board service

use anyhow::Result;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use noticeboard::{
    api::{self, AppState},
    config::Config,
    db,
    services::UploadStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "noticeboard=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting notice board...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");
    if config.auth.uses_default_secret() {
        tracing::warn!("auth.jwt_secret is the built-in development value; set NOTICEBOARD_AUTH_JWT_SECRET");
    }

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Attachment directory
    UploadStore::new(config.upload.clone()).ensure_dir().await?;
    tracing::info!("Upload directory ready: {}", config.upload.path.display());

    let state = AppState::build(pool, &config);

    // Seed the configured admin account
    if let Some(admin) = &config.admin {
        if state.user_service.ensure_admin(admin).await? {
            tracing::info!("Admin account created for {}", admin.email);
        }
    }

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
