//! The generic document repository.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use docrepo_core::cancel::{cancellable_stream, run_cancellable};
use docrepo_core::result::AppResult;
use docrepo_core::traits::entity::Entity;
use docrepo_core::traits::repository::Repository;
use docrepo_core::traits::store::{FindOptions, StoreCollection, StoreDatabase};
use docrepo_core::types::filter::Filter;
use docrepo_core::types::pagination::{PageRequest, PageResult};
use docrepo_core::types::sorting::Sort;
use docrepo_core::types::write::{BulkWriteOutcome, DeleteOutcome, ReplaceOutcome};

use crate::ops;

/// Repository for entities of type `E` stored in one physical collection
/// of database `D`.
///
/// Holds only store handles, so it is safe to share across tasks.
pub struct DocumentRepository<E: Entity, D: StoreDatabase> {
    database: D,
    collection: D::Collection<E>,
}

impl<E: Entity, D: StoreDatabase> DocumentRepository<E, D> {
    /// Create a repository over the collection `collection_name` of `database`.
    pub fn new(database: D, collection_name: &str) -> Self {
        let collection = database.collection::<E>(collection_name);
        Self {
            database,
            collection,
        }
    }

    /// The database handle.
    pub fn database(&self) -> &D {
        &self.database
    }

    /// The collection handle, for queries the repository does not cover.
    pub fn collection(&self) -> &D::Collection<E> {
        &self.collection
    }

    /// Physical collection name.
    pub fn collection_name(&self) -> &str {
        self.collection.name()
    }
}

impl<E: Entity, D: StoreDatabase> fmt::Debug for DocumentRepository<E, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentRepository")
            .field("database", &self.database.name())
            .field("collection", &self.collection.name())
            .finish()
    }
}

impl<E, D> Clone for DocumentRepository<E, D>
where
    E: Entity,
    D: StoreDatabase + Clone,
    D::Collection<E>: Clone,
{
    fn clone(&self) -> Self {
        Self {
            database: self.database.clone(),
            collection: self.collection.clone(),
        }
    }
}

#[async_trait]
impl<E: Entity, D: StoreDatabase> Repository<E> for DocumentRepository<E, D> {
    async fn exists(
        &self,
        filter: Option<Filter>,
        cancel: Option<&CancellationToken>,
    ) -> AppResult<bool> {
        let filter = filter.unwrap_or_default();
        run_cancellable(cancel, "exists", ops::exists::<E, _>(&self.collection, filter)).await
    }

    async fn exists_by_id(
        &self,
        id: &E::Id,
        cancel: Option<&CancellationToken>,
    ) -> AppResult<bool> {
        let filter = ops::id_filter::<E>(id)?;
        run_cancellable(cancel, "exists", ops::exists::<E, _>(&self.collection, filter)).await
    }

    async fn insert_many(
        &self,
        entities: &[E],
        cancel: Option<&CancellationToken>,
    ) -> AppResult<()> {
        if entities.is_empty() {
            return Ok(());
        }
        let inserted =
            run_cancellable(cancel, "insert_many", self.collection.insert_many(entities)).await?;
        debug!(collection = self.collection_name(), inserted, "Inserted documents");
        Ok(())
    }

    async fn save_or_update(
        &self,
        entity: &E,
        cancel: Option<&CancellationToken>,
    ) -> AppResult<ReplaceOutcome> {
        let filter = ops::id_filter::<E>(entity.id())?;
        self.save_or_update_where(filter, entity, cancel).await
    }

    async fn save_or_update_where(
        &self,
        filter: Filter,
        entity: &E,
        cancel: Option<&CancellationToken>,
    ) -> AppResult<ReplaceOutcome> {
        let outcome = run_cancellable(
            cancel,
            "save_or_update",
            self.collection.replace_one(filter, entity, true),
        )
        .await?;
        debug!(
            collection = self.collection_name(),
            matched = outcome.matched_count,
            upserted = outcome.is_upsert(),
            "Saved document"
        );
        Ok(outcome)
    }

    async fn get_by_id(
        &self,
        id: &E::Id,
        cancel: Option<&CancellationToken>,
    ) -> AppResult<Option<E>> {
        let filter = ops::id_filter::<E>(id)?;
        let found = run_cancellable(
            cancel,
            "get_by_id",
            self.collection.find(filter, FindOptions::limited(1)),
        )
        .await?;
        Ok(found.into_iter().next())
    }

    async fn get_by_ids(
        &self,
        ids: &[E::Id],
        cancel: Option<&CancellationToken>,
    ) -> AppResult<HashMap<E::Id, E>> {
        run_cancellable(
            cancel,
            "get_by_ids",
            ops::get_by_ids::<E, _>(&self.collection, ids),
        )
        .await
    }

    async fn get_paged_list(
        &self,
        request: &PageRequest,
        filter: Option<Filter>,
        sort: Option<Sort>,
        cancel: Option<&CancellationToken>,
    ) -> AppResult<PageResult<E>> {
        let filter = filter.unwrap_or_default();
        let page = run_cancellable(
            cancel,
            "get_paged_list",
            ops::paged::<E, _>(&self.collection, request, filter, sort),
        )
        .await?;
        debug!(
            collection = self.collection_name(),
            page_index = page.page_index,
            items = page.len(),
            total = page.total_count,
            "Fetched page"
        );
        Ok(page)
    }

    async fn find(
        &self,
        filter: Option<Filter>,
        sort: Option<Sort>,
        cancel: Option<&CancellationToken>,
    ) -> AppResult<Vec<E>> {
        let options = FindOptions {
            sort,
            ..Default::default()
        };
        run_cancellable(
            cancel,
            "find",
            self.collection.find(filter.unwrap_or_default(), options),
        )
        .await
    }

    async fn find_stream(
        &self,
        filter: Option<Filter>,
        sort: Option<Sort>,
        cancel: Option<&CancellationToken>,
    ) -> AppResult<BoxStream<'static, AppResult<E>>> {
        let options = FindOptions {
            sort,
            ..Default::default()
        };
        let stream = run_cancellable(
            cancel,
            "find_stream",
            self.collection
                .find_stream(filter.unwrap_or_default(), options),
        )
        .await?;
        debug!(collection = self.collection_name(), "Opened document stream");
        Ok(match cancel {
            Some(token) => cancellable_stream(stream, token.clone(), "find_stream"),
            None => stream,
        })
    }

    async fn add(&self, entity: E, cancel: Option<&CancellationToken>) -> AppResult<E> {
        run_cancellable(cancel, "add", self.collection.insert_one(&entity)).await?;
        Ok(entity)
    }

    async fn update(&self, entity: E, cancel: Option<&CancellationToken>) -> AppResult<E> {
        let filter = ops::id_filter::<E>(entity.id())?;
        let outcome = run_cancellable(
            cancel,
            "update",
            self.collection.replace_one(filter, &entity, false),
        )
        .await?;
        if outcome.matched_count == 0 {
            debug!(
                collection = self.collection_name(),
                id = ?entity.id(),
                "Update matched no document"
            );
        }
        Ok(entity)
    }

    async fn replace(
        &self,
        filter: Filter,
        entity: &E,
        cancel: Option<&CancellationToken>,
    ) -> AppResult<ReplaceOutcome> {
        run_cancellable(
            cancel,
            "replace",
            self.collection.replace_one(filter, entity, false),
        )
        .await
    }

    async fn replace_many(
        &self,
        entities: &[E],
        cancel: Option<&CancellationToken>,
    ) -> AppResult<BulkWriteOutcome> {
        let outcome = run_cancellable(
            cancel,
            "replace_many",
            ops::replace_many::<E, _>(&self.collection, entities),
        )
        .await?;
        debug!(
            collection = self.collection_name(),
            submitted = entities.len(),
            matched = outcome.matched_count,
            modified = outcome.modified_count,
            "Replaced documents"
        );
        Ok(outcome)
    }

    async fn delete_by_id(
        &self,
        id: &E::Id,
        cancel: Option<&CancellationToken>,
    ) -> AppResult<DeleteOutcome> {
        let filter = ops::id_filter::<E>(id)?;
        self.delete_where(filter, cancel).await
    }

    async fn delete_where(
        &self,
        filter: Filter,
        cancel: Option<&CancellationToken>,
    ) -> AppResult<DeleteOutcome> {
        run_cancellable(cancel, "delete", self.collection.delete_one(filter)).await
    }

    async fn delete_many_where(
        &self,
        filter: Filter,
        cancel: Option<&CancellationToken>,
    ) -> AppResult<DeleteOutcome> {
        let outcome =
            run_cancellable(cancel, "delete_many", self.collection.delete_many(filter)).await?;
        debug!(
            collection = self.collection_name(),
            deleted = outcome.deleted_count,
            "Deleted documents"
        );
        Ok(outcome)
    }

    async fn delete(
        &self,
        entity: &E,
        cancel: Option<&CancellationToken>,
    ) -> AppResult<DeleteOutcome> {
        self.delete_by_id(entity.id(), cancel).await
    }

    async fn delete_all(&self, cancel: Option<&CancellationToken>) -> AppResult<()> {
        self.drop_collection(cancel).await
    }

    async fn drop_collection(&self, cancel: Option<&CancellationToken>) -> AppResult<()> {
        let name = self.collection_name();
        run_cancellable(cancel, "drop_collection", self.database.drop_collection(name)).await?;
        info!(
            database = self.database.name(),
            collection = name,
            "Dropped collection"
        );
        Ok(())
    }

    async fn count(
        &self,
        filter: Option<Filter>,
        cancel: Option<&CancellationToken>,
    ) -> AppResult<u64> {
        run_cancellable(
            cancel,
            "count",
            self.collection.count(filter.unwrap_or_default(), None),
        )
        .await
    }
}
