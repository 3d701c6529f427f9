//! In-memory store backend.
//!
//! Keeps every collection as a vector of BSON documents behind a
//! `tokio::sync::RwLock`, indexed by database and collection name in
//! [`DashMap`]s. Writes enforce the same identifier rules as the server
//! (unique and immutable `_id`), so repositories behave identically on
//! both backends. Intended for tests and local development.

pub mod matcher;

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{Bson, Document, doc};
use dashmap::DashMap;
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};
use tracing::debug;

use docrepo_core::codec;
use docrepo_core::error::AppError;
use docrepo_core::result::AppResult;
use docrepo_core::traits::entity::Entity;
use docrepo_core::traits::store::{FindOptions, StoreClient, StoreCollection, StoreDatabase};
use docrepo_core::types::filter::Filter;
use docrepo_core::types::write::{BulkWriteOutcome, DeleteOutcome, ReplaceOutcome, WriteModel};

use self::matcher::{matches, project, sort_documents};

/// Identifier field of every stored document.
const ID_KEY: &str = "_id";

type Namespace = Arc<RwLock<Vec<Document>>>;
type Collections = Arc<DashMap<String, Namespace>>;

#[derive(Debug, Default)]
struct MemoryState {
    databases: DashMap<String, Collections>,
    offline: AtomicBool,
    latency_ms: AtomicU64,
}

impl MemoryState {
    /// Apply the simulated latency, then fail if the store is offline.
    async fn round_trip(&self, operation: &str) -> AppResult<()> {
        let latency = self.latency_ms.load(Ordering::Relaxed);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.offline.load(Ordering::Relaxed) {
            return Err(AppError::database(format!(
                "{operation} failed: server selection timed out"
            )));
        }
        Ok(())
    }
}

/// Client for the in-memory store. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryClient {
    state: Arc<MemoryState>,
}

impl MemoryClient {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail as if the server were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.state.offline.store(offline, Ordering::Relaxed);
    }

    /// Delay every subsequent call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        let millis = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.state.latency_ms.store(millis, Ordering::Relaxed);
    }

    /// Names of the databases touched so far.
    pub fn database_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .state
            .databases
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }
}

#[async_trait]
impl StoreClient for MemoryClient {
    type Database = MemoryDatabase;

    fn database(&self, name: &str) -> MemoryDatabase {
        let collections = self
            .state
            .databases
            .entry(name.to_string())
            .or_default()
            .clone();
        MemoryDatabase {
            name: name.to_string(),
            collections,
            state: Arc::clone(&self.state),
        }
    }
}

/// One database of the in-memory store.
#[derive(Debug, Clone)]
pub struct MemoryDatabase {
    name: String,
    collections: Collections,
    state: Arc<MemoryState>,
}

impl MemoryDatabase {
    /// Names of the collections currently present.
    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .collections
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }
}

#[async_trait]
impl StoreDatabase for MemoryDatabase {
    type Collection<E: Entity> = MemoryCollection<E>;

    fn name(&self) -> &str {
        &self.name
    }

    fn collection<E: Entity>(&self, name: &str) -> MemoryCollection<E> {
        MemoryCollection {
            name: name.to_string(),
            namespace: format!("{}.{}", self.name, name),
            collections: Arc::clone(&self.collections),
            state: Arc::clone(&self.state),
            _entity: PhantomData,
        }
    }

    async fn drop_collection(&self, name: &str) -> AppResult<()> {
        self.state.round_trip("drop").await?;
        let existing = self.collections.get(name).map(|entry| Arc::clone(entry.value()));
        if let Some(storage) = existing {
            // Writers holding the lock finish before the collection goes away.
            let _guard = storage.write().await;
            self.collections
                .remove_if(name, |_, current| Arc::ptr_eq(current, &storage));
        }
        debug!(database = %self.name, collection = name, "Dropped in-memory collection");
        Ok(())
    }

    async fn run_command(&self, command: Document) -> AppResult<Document> {
        self.state.round_trip("command").await?;
        match command.keys().next().map(String::as_str) {
            Some("ping") => Ok(doc! { "ok": 1.0 }),
            Some(other) => Err(AppError::database(format!("no such command: '{other}'"))),
            None => Err(AppError::validation("empty command document")),
        }
    }
}

/// Typed handle on one in-memory collection.
///
/// The handle resolves its backing storage on every call, so it keeps
/// working after the collection is dropped and recreated. Reads never
/// create the collection; the first write does.
#[derive(Clone)]
pub struct MemoryCollection<E> {
    name: String,
    namespace: String,
    collections: Collections,
    state: Arc<MemoryState>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> fmt::Debug for MemoryCollection<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCollection")
            .field("namespace", &self.namespace)
            .finish()
    }
}

impl<E: Entity> MemoryCollection<E> {
    /// Current storage, or `None` when the collection does not exist.
    fn existing(&self) -> Option<Namespace> {
        self.collections
            .get(&self.name)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Exclusive access to the storage, creating the collection if needed.
    ///
    /// Retries when the collection was dropped while waiting for the lock,
    /// so a write never lands in storage that is no longer registered.
    async fn write_storage(&self) -> OwnedRwLockWriteGuard<Vec<Document>> {
        loop {
            let storage = self
                .collections
                .entry(self.name.clone())
                .or_default()
                .clone();
            let guard = Arc::clone(&storage).write_owned().await;
            let registered = self
                .collections
                .get(&self.name)
                .is_some_and(|entry| Arc::ptr_eq(entry.value(), &storage));
            if registered {
                return guard;
            }
        }
    }
}

#[async_trait]
impl<E: Entity> StoreCollection<E> for MemoryCollection<E> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find(&self, filter: Filter, options: FindOptions) -> AppResult<Vec<E>> {
        self.state.round_trip("find").await?;
        let Some(storage) = self.existing() else {
            return Ok(Vec::new());
        };
        let docs = storage.read().await;

        let mut hits = Vec::new();
        for doc in docs.iter() {
            if matches(doc, filter.as_document())? {
                hits.push(doc.clone());
            }
        }
        drop(docs);

        if let Some(sort) = options.sort.as_ref().filter(|s| !s.is_empty()) {
            sort_documents(&mut hits, &sort.to_document());
        }
        let skip = usize::try_from(options.skip.unwrap_or(0)).unwrap_or(usize::MAX);
        let limit = options
            .limit
            .and_then(|l| usize::try_from(l).ok())
            .unwrap_or(usize::MAX);

        let projection = options.projection.unwrap_or_default();
        hits.into_iter()
            .skip(skip)
            .take(limit)
            .map(|doc| -> AppResult<E> { codec::from_document(&project(doc, &projection)?) })
            .collect()
    }

    async fn find_stream(
        &self,
        filter: Filter,
        options: FindOptions,
    ) -> AppResult<BoxStream<'static, AppResult<E>>> {
        let items = self.find(filter, options).await?;
        Ok(stream::iter(items.into_iter().map(Ok)).boxed())
    }

    async fn insert_one(&self, entity: &E) -> AppResult<()> {
        let doc = codec::to_document(entity)?;
        self.state.round_trip("insert").await?;
        let mut docs = self.write_storage().await;
        apply_insert(&mut docs, &self.namespace, doc)?;
        Ok(())
    }

    async fn insert_many(&self, entities: &[E]) -> AppResult<u64> {
        let batch = entities
            .iter()
            .map(codec::to_document)
            .collect::<AppResult<Vec<_>>>()?;
        self.state.round_trip("insert").await?;
        let mut docs = self.write_storage().await;
        let mut inserted = 0;
        for doc in batch {
            apply_insert(&mut docs, &self.namespace, doc)?;
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn replace_one(
        &self,
        filter: Filter,
        entity: &E,
        upsert: bool,
    ) -> AppResult<ReplaceOutcome> {
        let replacement = codec::to_document(entity)?;
        self.state.round_trip("update").await?;
        let mut docs = self.write_storage().await;
        apply_replace(
            &mut docs,
            &self.namespace,
            filter.as_document(),
            replacement,
            upsert,
        )
    }

    async fn bulk_write(&self, models: Vec<WriteModel<E>>) -> AppResult<BulkWriteOutcome> {
        self.state.round_trip("bulkWrite").await?;
        let mut docs = self.write_storage().await;

        let mut outcome = BulkWriteOutcome::default();
        let mut errors: Vec<AppError> = Vec::new();
        for model in models {
            let applied = match model {
                WriteModel::InsertOne { document } => codec::to_document(&document)
                    .and_then(|doc| apply_insert(&mut docs, &self.namespace, doc))
                    .map(|_| outcome.inserted_count += 1),
                WriteModel::ReplaceOne {
                    filter,
                    replacement,
                    upsert,
                } => codec::to_document(&replacement)
                    .and_then(|doc| {
                        apply_replace(&mut docs, &self.namespace, filter.as_document(), doc, upsert)
                    })
                    .map(|r| {
                        if r.is_upsert() {
                            outcome.upserted_count += 1;
                        }
                        outcome.matched_count += r.matched_count;
                        outcome.modified_count += r.modified_count;
                    }),
                WriteModel::DeleteOne { filter } => {
                    apply_delete(&mut docs, filter.as_document(), false)
                        .map(|n| outcome.deleted_count += n)
                }
                WriteModel::DeleteMany { filter } => {
                    apply_delete(&mut docs, filter.as_document(), true)
                        .map(|n| outcome.deleted_count += n)
                }
            };
            if let Err(e) = applied {
                errors.push(e);
            }
        }

        match errors.first() {
            None => Ok(outcome),
            Some(first) => Err(AppError::database(format!(
                "Bulk write on {} failed with {} write error(s): {}",
                self.namespace,
                errors.len(),
                first.message
            ))),
        }
    }

    async fn delete_one(&self, filter: Filter) -> AppResult<DeleteOutcome> {
        self.state.round_trip("delete").await?;
        let Some(storage) = self.existing() else {
            return Ok(DeleteOutcome::default());
        };
        let mut docs = storage.write().await;
        let deleted_count = apply_delete(&mut docs, filter.as_document(), false)?;
        Ok(DeleteOutcome { deleted_count })
    }

    async fn delete_many(&self, filter: Filter) -> AppResult<DeleteOutcome> {
        self.state.round_trip("delete").await?;
        let Some(storage) = self.existing() else {
            return Ok(DeleteOutcome::default());
        };
        let mut docs = storage.write().await;
        let deleted_count = apply_delete(&mut docs, filter.as_document(), true)?;
        Ok(DeleteOutcome { deleted_count })
    }

    async fn count(&self, filter: Filter, limit: Option<u64>) -> AppResult<u64> {
        self.state.round_trip("count").await?;
        let Some(storage) = self.existing() else {
            return Ok(0);
        };
        let docs = storage.read().await;
        let mut total = 0u64;
        for doc in docs.iter() {
            if limit.is_some_and(|l| total >= l) {
                break;
            }
            if matches(doc, filter.as_document())? {
                total += 1;
            }
        }
        Ok(total)
    }
}

/// Insert `doc`, generating an `_id` when absent. Fails on a duplicate `_id`.
fn apply_insert(docs: &mut Vec<Document>, namespace: &str, mut doc: Document) -> AppResult<Bson> {
    let id = match doc.remove(ID_KEY) {
        Some(id) => id,
        None => Bson::ObjectId(ObjectId::new()),
    };
    if docs.iter().any(|d| d.get(ID_KEY) == Some(&id)) {
        return Err(AppError::database(format!(
            "E11000 duplicate key error collection: {namespace} index: _id_ dup key: {{ _id: {id} }}"
        )));
    }
    docs.push(with_id_first(id.clone(), doc));
    Ok(id)
}

/// Replace the first document matching `filter`; upsert when asked and
/// nothing matched.
fn apply_replace(
    docs: &mut Vec<Document>,
    namespace: &str,
    filter: &Document,
    mut replacement: Document,
    upsert: bool,
) -> AppResult<ReplaceOutcome> {
    let mut position = None;
    for (idx, doc) in docs.iter().enumerate() {
        if matches(doc, filter)? {
            position = Some(idx);
            break;
        }
    }

    if let Some(idx) = position {
        let existing_id = docs[idx].get(ID_KEY).cloned().unwrap_or(Bson::Null);
        if let Some(new_id) = replacement.remove(ID_KEY) {
            if new_id != existing_id {
                return Err(AppError::database(format!(
                    "Performing an update on the path '_id' would modify the immutable field '_id' in {namespace}"
                )));
            }
        }
        let updated = with_id_first(existing_id, replacement);
        let modified_count = u64::from(docs[idx] != updated);
        docs[idx] = updated;
        return Ok(ReplaceOutcome {
            matched_count: 1,
            modified_count,
            upserted_id: None,
        });
    }

    if !upsert {
        return Ok(ReplaceOutcome::default());
    }

    if !replacement.contains_key(ID_KEY) {
        if let Some(id) = filter.get(ID_KEY).filter(|v| !is_operator_value(v)) {
            replacement.insert(ID_KEY, id.clone());
        }
    }
    let id = apply_insert(docs, namespace, replacement)?;
    Ok(ReplaceOutcome {
        matched_count: 0,
        modified_count: 0,
        upserted_id: Some(id),
    })
}

/// Remove the first (or every) document matching `filter`.
fn apply_delete(docs: &mut Vec<Document>, filter: &Document, many: bool) -> AppResult<u64> {
    let mut hits = Vec::new();
    for (idx, doc) in docs.iter().enumerate() {
        if matches(doc, filter)? {
            hits.push(idx);
            if !many {
                break;
            }
        }
    }
    for idx in hits.iter().rev() {
        docs.remove(*idx);
    }
    Ok(hits.len() as u64)
}

fn is_operator_value(value: &Bson) -> bool {
    match value {
        Bson::Document(d) => d.keys().next().is_some_and(|k| k.starts_with('$')),
        _ => false,
    }
}

fn with_id_first(id: Bson, mut doc: Document) -> Document {
    doc.remove(ID_KEY);
    let mut out = Document::new();
    out.insert(ID_KEY, id);
    out.extend(doc);
    out
}

#[cfg(test)]
mod tests {
    use docrepo_core::error::ErrorKind;
    use docrepo_core::traits::entity::Timestamps;
    use docrepo_core::types::sorting::Sort;
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        #[serde(rename = "_id")]
        id: String,
        text: String,
        rank: i32,
        #[serde(flatten)]
        timestamps: Timestamps,
    }

    impl Entity for Note {
        type Id = String;

        fn id(&self) -> &String {
            &self.id
        }

        fn timestamps(&self) -> &Timestamps {
            &self.timestamps
        }
    }

    fn note(id: &str, rank: i32) -> Note {
        Note {
            id: id.to_string(),
            text: format!("note {id}"),
            rank,
            timestamps: Timestamps::new(),
        }
    }

    fn notes(client: &MemoryClient) -> MemoryCollection<Note> {
        client.database("Test").collection("notes")
    }

    #[tokio::test]
    async fn test_insert_and_find_sorted_page() {
        let client = MemoryClient::new();
        let coll = notes(&client);
        coll.insert_many(&[note("a", 3), note("b", 1), note("c", 2)])
            .await
            .unwrap();

        let page = coll
            .find(
                Filter::empty(),
                FindOptions {
                    skip: Some(1),
                    limit: Some(1),
                    sort: Some(Sort::asc("rank")),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, "c");
    }

    #[tokio::test]
    async fn test_duplicate_id_is_rejected() {
        let client = MemoryClient::new();
        let coll = notes(&client);
        coll.insert_one(&note("a", 1)).await.unwrap();
        let err = coll.insert_one(&note("a", 2)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Database);
        assert!(err.message.contains("E11000"));
    }

    #[tokio::test]
    async fn test_replace_upserts_then_updates() {
        let client = MemoryClient::new();
        let coll = notes(&client);
        let filter = Filter::eq("_id", "a");

        let first = coll.replace_one(filter.clone(), &note("a", 1), true).await.unwrap();
        assert_eq!(first.upserted_id, Some(Bson::String("a".into())));

        let mut changed = note("a", 9);
        changed.timestamps = Timestamps::default();
        let second = coll.replace_one(filter.clone(), &changed, true).await.unwrap();
        assert_eq!(second.matched_count, 1);
        assert_eq!(second.modified_count, 1);
        assert!(!second.is_upsert());
        assert_eq!(coll.count(Filter::empty(), None).await.unwrap(), 1);

        let missing = coll
            .replace_one(Filter::eq("_id", "zzz"), &note("zzz", 0), false)
            .await
            .unwrap();
        assert_eq!(missing, ReplaceOutcome::default());
    }

    #[tokio::test]
    async fn test_replace_cannot_change_id() {
        let client = MemoryClient::new();
        let coll = notes(&client);
        coll.insert_one(&note("a", 1)).await.unwrap();
        let err = coll
            .replace_one(Filter::eq("_id", "a"), &note("b", 1), false)
            .await
            .unwrap_err();
        assert!(err.message.contains("immutable"));
    }

    #[tokio::test]
    async fn test_bulk_write_counts() {
        let client = MemoryClient::new();
        let coll = notes(&client);
        coll.insert_many(&[note("a", 1), note("b", 2)]).await.unwrap();

        let outcome = coll
            .bulk_write(vec![
                WriteModel::ReplaceOne {
                    filter: Filter::eq("_id", "a"),
                    replacement: note("a", 10),
                    upsert: false,
                },
                WriteModel::ReplaceOne {
                    filter: Filter::eq("_id", "n"),
                    replacement: note("n", 5),
                    upsert: true,
                },
                WriteModel::InsertOne {
                    document: note("c", 3),
                },
                WriteModel::DeleteOne {
                    filter: Filter::eq("_id", "b"),
                },
            ])
            .await
            .unwrap();
        assert_eq!(outcome.matched_count, 1);
        assert_eq!(outcome.upserted_count, 1);
        assert_eq!(outcome.inserted_count, 1);
        assert_eq!(outcome.deleted_count, 1);
        assert_eq!(coll.count(Filter::empty(), None).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_bulk_write_reports_errors_after_applying_rest() {
        let client = MemoryClient::new();
        let coll = notes(&client);
        coll.insert_one(&note("a", 1)).await.unwrap();

        let err = coll
            .bulk_write(vec![
                WriteModel::InsertOne {
                    document: note("a", 1),
                },
                WriteModel::InsertOne {
                    document: note("b", 1),
                },
            ])
            .await
            .unwrap_err();
        assert!(err.message.contains("1 write error"));
        assert_eq!(coll.count(Filter::empty(), None).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_delete_one_and_many() {
        let client = MemoryClient::new();
        let coll = notes(&client);
        coll.insert_many(&[note("a", 1), note("b", 1), note("c", 2)])
            .await
            .unwrap();

        let one = coll.delete_one(Filter::eq("rank", 1)).await.unwrap();
        assert_eq!(one.deleted_count, 1);
        let many = coll.delete_many(Filter::empty()).await.unwrap();
        assert_eq!(many.deleted_count, 2);
    }

    #[tokio::test]
    async fn test_count_respects_limit() {
        let client = MemoryClient::new();
        let coll = notes(&client);
        coll.insert_many(&[note("a", 1), note("b", 1), note("c", 1)])
            .await
            .unwrap();
        assert_eq!(coll.count(Filter::empty(), Some(1)).await.unwrap(), 1);
        assert_eq!(coll.count(Filter::eq("rank", 1), None).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_handle_survives_drop() {
        let client = MemoryClient::new();
        let db = client.database("Test");
        let coll: MemoryCollection<Note> = db.collection("notes");
        coll.insert_one(&note("a", 1)).await.unwrap();

        db.drop_collection("notes").await.unwrap();
        assert!(db.collection_names().is_empty());
        assert_eq!(coll.count(Filter::empty(), None).await.unwrap(), 0);
        assert!(coll.find(Filter::empty(), FindOptions::default()).await.unwrap().is_empty());
        assert_eq!(coll.delete_many(Filter::empty()).await.unwrap().deleted_count, 0);
        assert!(db.collection_names().is_empty());

        coll.insert_one(&note("a", 1)).await.unwrap();
        assert_eq!(coll.count(Filter::empty(), None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reads_do_not_create_collection() {
        let client = MemoryClient::new();
        let db = client.database("Test");
        let coll: MemoryCollection<Note> = db.collection("notes");

        assert_eq!(coll.count(Filter::empty(), Some(1)).await.unwrap(), 0);
        assert!(coll.find(Filter::empty(), FindOptions::default()).await.unwrap().is_empty());
        assert!(db.collection_names().is_empty());

        coll.insert_one(&note("a", 1)).await.unwrap();
        assert_eq!(db.collection_names(), vec!["notes".to_string()]);
    }

    #[tokio::test]
    async fn test_drop_waits_for_in_flight_write() {
        let client = MemoryClient::new();
        let db = client.database("Test");
        let coll: MemoryCollection<Note> = db.collection("notes");
        coll.insert_one(&note("a", 1)).await.unwrap();

        let held = coll.write_storage().await;
        let dropper = {
            let db = db.clone();
            tokio::spawn(async move { db.drop_collection("notes").await })
        };
        tokio::task::yield_now().await;
        assert_eq!(db.collection_names(), vec!["notes".to_string()]);
        drop(held);

        dropper.await.unwrap().unwrap();
        assert!(db.collection_names().is_empty());
        coll.insert_one(&note("b", 1)).await.unwrap();
        let ids: Vec<String> = coll
            .find(Filter::empty(), FindOptions::default())
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(ids, vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn test_find_stream_yields_matches_in_order() {
        use futures::TryStreamExt;

        let client = MemoryClient::new();
        let coll = notes(&client);
        coll.insert_many(&[note("a", 2), note("b", 1), note("c", 2)])
            .await
            .unwrap();

        let streamed: Vec<Note> = coll
            .find_stream(Filter::eq("rank", 2), FindOptions::default())
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        let ids: Vec<&str> = streamed.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_uuid_keys_are_stored_like_the_driver_stores_them() {
        use docrepo_core::types::id::Uuid;

        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        struct Tag {
            #[serde(rename = "_id")]
            id: Uuid,
            #[serde(flatten)]
            timestamps: Timestamps,
        }

        impl Entity for Tag {
            type Id = Uuid;

            fn id(&self) -> &Uuid {
                &self.id
            }

            fn timestamps(&self) -> &Timestamps {
                &self.timestamps
            }
        }

        let client = MemoryClient::new();
        let coll: MemoryCollection<Tag> = client.database("Test").collection("tags");
        let tag = Tag {
            id: Uuid::now_v7(),
            timestamps: Timestamps::new(),
        };
        coll.insert_one(&tag).await.unwrap();

        let stored = coll.existing().unwrap().read().await[0].clone();
        let driver = bson::to_raw_document_buf(&tag).unwrap().to_document().unwrap();
        assert_eq!(stored.get("_id"), driver.get("_id"));

        let filter = Filter::by_id(Tag::ID_FIELD, &tag.id).unwrap();
        let found = coll.find(filter, FindOptions::limited(1)).await.unwrap();
        assert_eq!(found, vec![tag]);
    }

    #[tokio::test]
    async fn test_ping_and_offline() {
        let client = MemoryClient::new();
        client.ping("admin").await.unwrap();

        client.set_offline(true);
        let err = client.ping("admin").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Database);

        let unknown = MemoryClient::new()
            .database("admin")
            .run_command(doc! { "shutdown": 1 })
            .await
            .unwrap_err();
        assert!(unknown.message.contains("shutdown"));
    }
}
