//! Connect to the configured database and apply pending migrations.

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chamberlain_db::config::DbConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chamberlain_db=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = DbConfig::from_env().context("Failed to load database configuration")?;
    tracing::info!(max_connections = config.max_connections, "Loaded database configuration");

    // --- Database ---
    let pool = chamberlain_db::create_pool(&config)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    chamberlain_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    tracing::info!("Database health check passed");

    chamberlain_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    pool.close().await;
    Ok(())
}
