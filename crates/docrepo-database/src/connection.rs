//! MongoDB client management.

use std::time::Duration;

use async_trait::async_trait;
use mongodb::Client;
use mongodb::options::ClientOptions;
use tracing::info;

use docrepo_core::config::DatabaseConfig;
use docrepo_core::error::{AppError, ErrorKind};
use docrepo_core::traits::store::StoreClient;

use crate::store::mongo::MongoDatabase;

/// Wrapper around the pooled MongoDB driver client.
#[derive(Debug, Clone)]
pub struct MongoClient {
    /// The underlying driver client.
    client: Client,
}

impl MongoClient {
    /// Create a client from configuration.
    ///
    /// The driver connects lazily, so an unreachable server surfaces on
    /// the first operation rather than here.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        info!(
            url = %mask_password(&config.connection_string),
            max_pool_size = config.max_pool_size,
            min_pool_size = config.min_pool_size,
            "Connecting to MongoDB"
        );

        let mut options = ClientOptions::parse(config.connection_string.as_str())
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    format!("Invalid connection string: {e}"),
                    e,
                )
            })?;
        options.max_pool_size = Some(config.max_pool_size);
        options.min_pool_size = Some(config.min_pool_size);
        options.connect_timeout = Some(Duration::from_secs(config.connect_timeout_seconds));
        options.server_selection_timeout =
            Some(Duration::from_secs(config.server_selection_timeout_seconds));
        if let Some(app_name) = &config.app_name {
            options.app_name = Some(app_name.clone());
        }

        let client = Client::with_options(options).map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                format!("Failed to create MongoDB client: {e}"),
                e,
            )
        })?;

        info!("MongoDB client ready");
        Ok(Self { client })
    }

    /// Wrap an existing driver client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Return a reference to the underlying driver client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Close all pooled connections.
    pub async fn shutdown(self) {
        self.client.shutdown().await;
        info!("MongoDB client closed");
    }
}

#[async_trait]
impl StoreClient for MongoClient {
    type Database = MongoDatabase;

    fn database(&self, name: &str) -> MongoDatabase {
        MongoDatabase::new(self.client.database(name))
    }
}

/// Mask the password portion of a connection string for safe logging.
fn mask_password(url: &str) -> String {
    let scheme_end = url.find("://").map(|p| p + 3).unwrap_or(0);
    let authority_end = url[scheme_end..]
        .find('/')
        .map(|p| p + scheme_end)
        .unwrap_or(url.len());
    if let Some(at_pos) = url[..authority_end].rfind('@') {
        if let Some(colon_pos) = url[scheme_end..at_pos].find(':') {
            let colon_pos = colon_pos + scheme_end;
            return format!("{}:****@{}", &url[..colon_pos], &url[at_pos + 1..]);
        }
    }
    url.to_string()
}
