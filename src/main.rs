//! DocRepo health check.
//!
//! Loads configuration, connects to the configured store and pings it.
//! Prints the resulting status as JSON and exits non-zero when the store
//! is unreachable.

use tracing_subscriber::{EnvFilter, fmt};

use docrepo_core::config::AppConfig;
use docrepo_core::error::AppError;
use docrepo_database::{AuditRepository, MongoClient, RepositoryHelper};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(2);
        }
    };

    init_logging(&config);

    match run(config).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            tracing::error!("Health check error: {e}");
            std::process::exit(2);
        }
    }
}

/// Load configuration for the environment named by `DOCREPO_ENV`.
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("DOCREPO_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

/// Ping the store and print its status. Returns whether it is running.
async fn run(config: AppConfig) -> Result<bool, AppError> {
    tracing::info!("Starting DocRepo health check v{}", env!("CARGO_PKG_VERSION"));

    let client = MongoClient::connect(&config.database).await?;
    let helper = RepositoryHelper::with_default_naming(client.clone(), config.database);
    let status = AuditRepository::new(helper).check(None).await;

    println!("{}", serde_json::to_string_pretty(&status)?);
    client.shutdown().await;
    Ok(status.running)
}
