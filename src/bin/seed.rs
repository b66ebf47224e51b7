// Creates the default admin and user accounts

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use user_auth_api::{auth::PasswordService, config::AppConfig, db, users::PgUserRepository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env().context("Invalid configuration")?;
    let pool = db::create_pool(&config.database_url, 1)
        .await
        .context("Failed to connect to database")?;
    db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let repository = PgUserRepository::new(pool);
    let created = db::seed_default_users(&repository, &PasswordService::default())
        .await
        .context("Seeding failed")?;

    tracing::info!("Seeding finished, {} account(s) created", created);
    for account in db::DEFAULT_ACCOUNTS.iter() {
        tracing::info!("  {} / {} ({})", account.email, account.password, account.role);
    }
    Ok(())
}
