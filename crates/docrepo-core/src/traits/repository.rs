//! Generic repository contract.

use std::collections::HashMap;

use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio_util::sync::CancellationToken;

use crate::result::AppResult;
use crate::traits::entity::Entity;
use crate::types::filter::Filter;
use crate::types::pagination::{PageRequest, PageResult};
use crate::types::sorting::Sort;
use crate::types::write::{BulkWriteOutcome, DeleteOutcome, ReplaceOutcome};

/// Uniform CRUD, paging and bulk contract over one physical collection.
///
/// Every operation takes an optional cancellation token; when it fires
/// before the store answers, the operation fails with
/// [`ErrorKind::Cancelled`](crate::error::ErrorKind::Cancelled). A `None`
/// filter matches every document. Store failures are returned unchanged.
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync + 'static {
    /// Whether at least one document matches `filter`.
    async fn exists(
        &self,
        filter: Option<Filter>,
        cancel: Option<&CancellationToken>,
    ) -> AppResult<bool>;

    /// Whether a document with identifier `id` exists.
    async fn exists_by_id(&self, id: &E::Id, cancel: Option<&CancellationToken>)
    -> AppResult<bool>;

    /// Insert a batch of new entities.
    async fn insert_many(&self, entities: &[E], cancel: Option<&CancellationToken>)
    -> AppResult<()>;

    /// Insert `entity`, or replace the document with the same identifier.
    async fn save_or_update(
        &self,
        entity: &E,
        cancel: Option<&CancellationToken>,
    ) -> AppResult<ReplaceOutcome>;

    /// Insert `entity`, or replace the first document matching `filter`.
    async fn save_or_update_where(
        &self,
        filter: Filter,
        entity: &E,
        cancel: Option<&CancellationToken>,
    ) -> AppResult<ReplaceOutcome>;

    /// Fetch the entity with identifier `id`. `None` when absent.
    async fn get_by_id(&self, id: &E::Id, cancel: Option<&CancellationToken>)
    -> AppResult<Option<E>>;

    /// Fetch the entities whose identifiers are in `ids`, keyed by identifier.
    async fn get_by_ids(
        &self,
        ids: &[E::Id],
        cancel: Option<&CancellationToken>,
    ) -> AppResult<HashMap<E::Id, E>>;

    /// Fetch one page of matching entities plus the total match count.
    async fn get_paged_list(
        &self,
        request: &PageRequest,
        filter: Option<Filter>,
        sort: Option<Sort>,
        cancel: Option<&CancellationToken>,
    ) -> AppResult<PageResult<E>>;

    /// Fetch every matching entity.
    async fn find(
        &self,
        filter: Option<Filter>,
        sort: Option<Sort>,
        cancel: Option<&CancellationToken>,
    ) -> AppResult<Vec<E>>;

    /// Stream every matching entity as the store returns it.
    ///
    /// When `cancel` fires, the stream yields one `Cancelled` error and ends.
    async fn find_stream(
        &self,
        filter: Option<Filter>,
        sort: Option<Sort>,
        cancel: Option<&CancellationToken>,
    ) -> AppResult<BoxStream<'static, AppResult<E>>>;

    /// Insert a single entity and echo it back.
    async fn add(&self, entity: E, cancel: Option<&CancellationToken>) -> AppResult<E>;

    /// Replace the stored document with the same identifier and echo the
    /// entity back. Nothing is written if the document no longer exists.
    async fn update(&self, entity: E, cancel: Option<&CancellationToken>) -> AppResult<E>;

    /// Replace the first document matching `filter` without upserting.
    async fn replace(
        &self,
        filter: Filter,
        entity: &E,
        cancel: Option<&CancellationToken>,
    ) -> AppResult<ReplaceOutcome>;

    /// Replace each entity by identifier in a single batch.
    async fn replace_many(
        &self,
        entities: &[E],
        cancel: Option<&CancellationToken>,
    ) -> AppResult<BulkWriteOutcome>;

    /// Delete the document with identifier `id`.
    async fn delete_by_id(
        &self,
        id: &E::Id,
        cancel: Option<&CancellationToken>,
    ) -> AppResult<DeleteOutcome>;

    /// Delete the first document matching `filter`.
    async fn delete_where(
        &self,
        filter: Filter,
        cancel: Option<&CancellationToken>,
    ) -> AppResult<DeleteOutcome>;

    /// Delete every document matching `filter`.
    async fn delete_many_where(
        &self,
        filter: Filter,
        cancel: Option<&CancellationToken>,
    ) -> AppResult<DeleteOutcome>;

    /// Delete the stored document for `entity`, by its identifier.
    async fn delete(&self, entity: &E, cancel: Option<&CancellationToken>)
    -> AppResult<DeleteOutcome>;

    /// Remove the whole physical collection. Irreversible.
    async fn delete_all(&self, cancel: Option<&CancellationToken>) -> AppResult<()>;

    /// Drop the whole physical collection. Irreversible.
    async fn drop_collection(&self, cancel: Option<&CancellationToken>) -> AppResult<()>;

    /// Count matching documents without any limit.
    async fn count(
        &self,
        filter: Option<Filter>,
        cancel: Option<&CancellationToken>,
    ) -> AppResult<u64>;
}
