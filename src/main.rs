use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use user_auth_api::{
    auth::PasswordService, config::AppConfig, create_router, db, users::PgUserRepository,
    AppState,
};

/// RUST_LOG filtering, JSON output when LOG_FORMAT=json
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("user_auth_api=debug,tower_http=info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();
    init_tracing();

    tracing::info!("User Auth API - Starting...");

    let config = AppConfig::from_env().context("Invalid configuration")?;
    tracing::info!("Environment: {}", config.environment);

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url, config.db_max_connections)
        .await
        .context("Failed to create database pool")?;
    db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let repository = Arc::new(PgUserRepository::new(pool));
    if config.seed_default_users {
        let created = db::seed_default_users(&*repository, &PasswordService::default())
            .await
            .context("Failed to seed default users")?;
        tracing::info!("Seeded {} default accounts", created);
    }

    let addr = config.socket_addr()?;
    let app = create_router(AppState::new(config, repository));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("User Auth API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/docs", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
