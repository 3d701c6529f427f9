//! Resolves physical names and hands out repositories.

use std::sync::Arc;

use tracing::debug;

use docrepo_core::config::DatabaseConfig;
use docrepo_core::traits::entity::Entity;
use docrepo_core::traits::naming::NamingResolver;
use docrepo_core::traits::store::{StoreClient, StoreDatabase};

use crate::naming::DefaultNamingResolver;
use crate::repository::DocumentRepository;

/// Collection handle type for entity `E` on client `C`.
pub type CollectionOf<C, E> = <<C as StoreClient>::Database as StoreDatabase>::Collection<E>;

/// Entry point for building repositories.
///
/// Every database and collection name goes through the injected
/// [`NamingResolver`], so all repositories built from one helper follow the
/// same conventions.
#[derive(Debug, Clone)]
pub struct RepositoryHelper<C: StoreClient> {
    client: C,
    config: DatabaseConfig,
    naming: Arc<dyn NamingResolver>,
}

impl<C: StoreClient> RepositoryHelper<C> {
    /// Create a helper with an explicit naming resolver.
    pub fn new(client: C, config: DatabaseConfig, naming: Arc<dyn NamingResolver>) -> Self {
        Self {
            client,
            config,
            naming,
        }
    }

    /// Create a helper using [`DefaultNamingResolver`].
    pub fn with_default_naming(client: C, config: DatabaseConfig) -> Self {
        Self::new(client, config, Arc::new(DefaultNamingResolver::new()))
    }

    /// The store client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// The database configuration names are resolved against.
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// The naming resolver in use.
    pub fn naming(&self) -> &Arc<dyn NamingResolver> {
        &self.naming
    }

    /// Physical name of the logical database `logical_name`.
    pub fn database_name(&self, logical_name: &str) -> String {
        self.naming.database_name(&self.config, logical_name)
    }

    /// Physical collection name for `E`, from `logical_name` when given and
    /// from the entity type name otherwise.
    pub fn collection_name<E: Entity>(&self, logical_name: Option<&str>) -> String {
        self.naming
            .collection_name(logical_name.unwrap_or(E::type_name()))
    }

    /// Handle on the logical database `logical_name`.
    pub fn database(&self, logical_name: &str) -> C::Database {
        self.client.database(&self.database_name(logical_name))
    }

    /// Handle on the collection for `E` inside the logical database `database`.
    pub fn collection<E: Entity>(
        &self,
        database: &str,
        logical_name: Option<&str>,
    ) -> CollectionOf<C, E> {
        self.database(database)
            .collection::<E>(&self.collection_name::<E>(logical_name))
    }

    /// Repository for `E` inside the logical database `database`.
    pub fn repository<E: Entity>(
        &self,
        database: &str,
        logical_name: Option<&str>,
    ) -> DocumentRepository<E, C::Database> {
        let db = self.database(database);
        let collection = self.collection_name::<E>(logical_name);
        debug!(
            database = db.name(),
            collection = %collection,
            entity = E::type_name(),
            "Creating repository"
        );
        DocumentRepository::new(db, &collection)
    }
}
