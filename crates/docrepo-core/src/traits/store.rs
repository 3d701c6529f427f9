//! Store collaborator traits.
//!
//! The repository never speaks a wire protocol itself. It drives these
//! three handles, which a backend (MongoDB, in-memory) implements:
//! a client hands out databases, a database hands out collections.

use async_trait::async_trait;
use bson::{Document, doc};
use futures::stream::BoxStream;

use crate::result::AppResult;
use crate::traits::entity::Entity;
use crate::types::filter::Filter;
use crate::types::sorting::Sort;
use crate::types::write::{BulkWriteOutcome, DeleteOutcome, ReplaceOutcome, WriteModel};

/// Options for a filtered find. Sort is applied before skip and limit.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Records to skip.
    pub skip: Option<u64>,
    /// Maximum records to return.
    pub limit: Option<u64>,
    /// Sort order; `None` keeps the store's natural order.
    pub sort: Option<Sort>,
    /// Fields to return (`{field: 1}`) or omit (`{field: 0}`). The result
    /// must still deserialize into the entity type.
    pub projection: Option<Document>,
}

impl FindOptions {
    /// Options fetching at most `limit` records.
    pub fn limited(limit: u64) -> Self {
        Self {
            limit: Some(limit),
            ..Default::default()
        }
    }
}

/// A handle on one physical collection holding entities of type `E`.
#[async_trait]
pub trait StoreCollection<E: Entity>: Send + Sync + 'static {
    /// Physical collection name.
    fn name(&self) -> &str;

    /// Fetch the documents matching `filter`.
    async fn find(&self, filter: Filter, options: FindOptions) -> AppResult<Vec<E>>;

    /// Like [`find`](Self::find), but yields documents as the store returns
    /// them instead of collecting them first.
    async fn find_stream(
        &self,
        filter: Filter,
        options: FindOptions,
    ) -> AppResult<BoxStream<'static, AppResult<E>>>;

    /// Insert one document. Fails if its identifier already exists.
    async fn insert_one(&self, entity: &E) -> AppResult<()>;

    /// Insert a batch of documents in one request. Returns the number inserted.
    async fn insert_many(&self, entities: &[E]) -> AppResult<u64>;

    /// Replace the first document matching `filter`, inserting when `upsert`
    /// is set and nothing matches.
    async fn replace_one(&self, filter: Filter, entity: &E, upsert: bool)
    -> AppResult<ReplaceOutcome>;

    /// Submit a batch of heterogeneous writes, unordered.
    async fn bulk_write(&self, models: Vec<WriteModel<E>>) -> AppResult<BulkWriteOutcome>;

    /// Delete the first document matching `filter`.
    async fn delete_one(&self, filter: Filter) -> AppResult<DeleteOutcome>;

    /// Delete every document matching `filter`.
    async fn delete_many(&self, filter: Filter) -> AppResult<DeleteOutcome>;

    /// Count matching documents, stopping at `limit` when given.
    async fn count(&self, filter: Filter, limit: Option<u64>) -> AppResult<u64>;
}

/// A handle on one physical database.
#[async_trait]
pub trait StoreDatabase: Send + Sync + 'static {
    /// Collection handle type produced by this database.
    type Collection<E: Entity>: StoreCollection<E>;

    /// Physical database name.
    fn name(&self) -> &str;

    /// Look up a collection by physical name. Does not touch the store.
    fn collection<E: Entity>(&self, name: &str) -> Self::Collection<E>;

    /// Drop a collection by physical name. Dropping a missing collection succeeds.
    async fn drop_collection(&self, name: &str) -> AppResult<()>;

    /// Run a database command and return the reply document.
    async fn run_command(&self, command: Document) -> AppResult<Document>;
}

/// A handle on the store deployment.
#[async_trait]
pub trait StoreClient: Send + Sync + 'static {
    /// Database handle type produced by this client.
    type Database: StoreDatabase;

    /// Look up a database by physical name. Does not touch the store.
    fn database(&self, name: &str) -> Self::Database;

    /// Issue the administrative no-op `ping` against `database`.
    async fn ping(&self, database: &str) -> AppResult<()> {
        self.database(database)
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
    }
}
