//! Marketplace Publisher - operator entry point for the publish pipeline

mod cli;
mod settings;

use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::Cli;
use marketplace_core::application::{ExtensionStateService, PublishJobService, RetryPolicy};
use marketplace_infra_sqlite::{create_pool, run_migrations, SqliteEntityStore};
use marketplace_infra_storage::{LocalStorageUtil, LocalStorageConfig};
use settings::Settings;

fn init_logging() -> Result<()> {
    let log_format =
        std::env::var("MARKETPLACE_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("marketplace=info"))?;

    // stdout is reserved for command output
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Logging
    init_logging()?;
    info!("Marketplace publisher v{}", marketplace_core::VERSION);

    // 2. Configuration
    let settings = Settings::load(cli.config.as_deref())?;
    log_storage(&settings.storage);

    // 3. Database
    if let Some(dir) = Path::new(&settings.database_url).parent() {
        if !settings.database_url.starts_with("sqlite:") && !dir.as_os_str().is_empty() {
            tokio::fs::create_dir_all(dir).await?;
        }
    }
    info!(database_url = %settings.database_url, "Initializing database...");
    let pool = create_pool(&settings.database_url)
        .await
        .map_err(|e| anyhow!("DB pool creation failed: {}", e))?;
    run_migrations(&pool)
        .await
        .map_err(|e| anyhow!("Migration failed: {}", e))?;

    // 4. DI wiring
    let store = Arc::new(SqliteEntityStore::new(pool));
    let storage = Arc::new(LocalStorageUtil::new(settings.storage.clone()));
    let retry_policy = RetryPolicy::new(settings.retry.clone())?;

    let service = PublishJobService::new(
        store.clone(),
        store.clone(),
        storage,
        Arc::new(ExtensionStateService::new()),
        retry_policy,
    );

    // 5. Run
    cli::run(cli.command, &service, store.as_ref()).await
}

fn log_storage(config: &LocalStorageConfig) {
    match &config.root {
        Some(root) => info!(
            root = %root.display(),
            types = ?config.external_resource_types,
            "External storage enabled"
        ),
        None => info!("External storage disabled, all content stays in the database"),
    }
}
