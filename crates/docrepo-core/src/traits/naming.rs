//! Naming resolution from logical names to physical store names.

use std::fmt::Debug;

use crate::config::DatabaseConfig;
use crate::traits::entity::Entity;

/// Maps logical names to physical database and collection names.
///
/// Implementations must be deterministic: the same input always yields the
/// same physical name, so every repository for an entity lands on the same
/// collection.
pub trait NamingResolver: Send + Sync + Debug + 'static {
    /// Physical database name for `logical_name` under `config`.
    fn database_name(&self, config: &DatabaseConfig, logical_name: &str) -> String;

    /// Physical collection name for `logical_name`.
    fn collection_name(&self, logical_name: &str) -> String;

    /// Physical collection name for an entity type, from its type name.
    fn collection_name_for<E: Entity>(&self) -> String
    where
        Self: Sized,
    {
        self.collection_name(E::type_name())
    }
}
