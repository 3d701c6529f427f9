//! Store-agnostic building blocks shared by the repository.
//!
//! Each function drives a [`StoreCollection`] and holds no state, so the
//! same logic runs unchanged against every backend.

use std::collections::HashMap;

use docrepo_core::result::AppResult;
use docrepo_core::traits::entity::Entity;
use docrepo_core::traits::store::{FindOptions, StoreCollection};
use docrepo_core::types::filter::Filter;
use docrepo_core::types::pagination::{PageRequest, PageResult};
use docrepo_core::types::sorting::Sort;
use docrepo_core::types::write::{BulkWriteOutcome, WriteModel};

/// Equality filter on the identifier of `E`.
pub fn id_filter<E: Entity>(id: &E::Id) -> AppResult<Filter> {
    Filter::by_id(E::ID_FIELD, id)
}

/// Whether anything matches, asking the store to stop at the first hit.
pub async fn exists<E, C>(collection: &C, filter: Filter) -> AppResult<bool>
where
    E: Entity,
    C: StoreCollection<E> + ?Sized,
{
    Ok(collection.count(filter, Some(1)).await? > 0)
}

/// Fetch one page and the total match count concurrently.
///
/// Both requests use the same filter; the page is sorted before skip and
/// limit are applied.
pub async fn paged<E, C>(
    collection: &C,
    request: &PageRequest,
    filter: Filter,
    sort: Option<Sort>,
) -> AppResult<PageResult<E>>
where
    E: Entity,
    C: StoreCollection<E> + ?Sized,
{
    request.validate()?;
    let options = FindOptions {
        skip: Some(request.skip()?),
        limit: Some(request.limit()),
        sort,
        ..Default::default()
    };

    let (items, total_count) = tokio::try_join!(
        collection.find(filter.clone(), options),
        collection.count(filter, None),
    )?;

    Ok(PageResult::new(
        items,
        request.page_index,
        request.page_size,
        total_count,
    ))
}

/// One non-upserting replace per entity, keyed by its identifier.
pub fn replace_models<E: Entity>(entities: &[E]) -> AppResult<Vec<WriteModel<E>>> {
    entities
        .iter()
        .map(|entity| {
            Ok(WriteModel::ReplaceOne {
                filter: id_filter::<E>(entity.id())?,
                replacement: entity.clone(),
                upsert: false,
            })
        })
        .collect()
}

/// Replace every entity by identifier in one batch. An empty slice does
/// not reach the store.
pub async fn replace_many<E, C>(collection: &C, entities: &[E]) -> AppResult<BulkWriteOutcome>
where
    E: Entity,
    C: StoreCollection<E> + ?Sized,
{
    if entities.is_empty() {
        return Ok(BulkWriteOutcome::default());
    }
    collection.bulk_write(replace_models(entities)?).await
}

/// Fetch entities by identifier, keyed by identifier. Unknown identifiers
/// are absent from the map.
pub async fn get_by_ids<E, C>(collection: &C, ids: &[E::Id]) -> AppResult<HashMap<E::Id, E>>
where
    E: Entity,
    C: StoreCollection<E> + ?Sized,
{
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let filter = Filter::by_ids(E::ID_FIELD, ids)?;
    let found = collection.find(filter, FindOptions::default()).await?;
    Ok(found
        .into_iter()
        .map(|entity| (entity.id().clone(), entity))
        .collect())
}
