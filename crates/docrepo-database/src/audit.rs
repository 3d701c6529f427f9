//! Store health check.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use docrepo_core::cancel::run_cancellable;
use docrepo_core::traits::store::StoreClient;

use crate::helper::RepositoryHelper;

/// Logical name of the administrative database the health check pings.
pub const ADMIN_DATABASE: &str = "admin";

/// Reachability of the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbStatus {
    /// Physical name of the database that was pinged.
    pub db_name: String,
    /// Whether the ping succeeded.
    pub running: bool,
}

/// Health-check collaborator.
///
/// Failures are reported through [`DbStatus::running`] and never returned
/// as errors.
#[derive(Debug, Clone)]
pub struct AuditRepository<C: StoreClient> {
    helper: RepositoryHelper<C>,
}

impl<C: StoreClient> AuditRepository<C> {
    /// Create a health check that resolves names through `helper`.
    pub fn new(helper: RepositoryHelper<C>) -> Self {
        Self { helper }
    }

    /// Ping the administrative database and report whether it answered.
    pub async fn check(&self, cancel: Option<&CancellationToken>) -> DbStatus {
        let db_name = self.helper.database_name(ADMIN_DATABASE);
        let ping = self.helper.client().ping(&db_name);
        match run_cancellable(cancel, "ping", ping).await {
            Ok(()) => {
                debug!(database = %db_name, "Store is reachable");
                DbStatus {
                    db_name,
                    running: true,
                }
            }
            Err(e) => {
                warn!(database = %db_name, error = %e, "Store health check failed");
                DbStatus {
                    db_name,
                    running: false,
                }
            }
        }
    }
}
