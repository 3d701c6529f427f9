//! MongoDB store backend.
//!
//! Batched writes go through the `insert`, `update` and `delete` database
//! commands (unordered) so they work against every supported server
//! version, not only those with the cross-namespace `bulkWrite` command.

use std::fmt;

use async_trait::async_trait;
use bson::{Bson, Document, doc};
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use tracing::debug;

use docrepo_core::codec;
use docrepo_core::error::{AppError, ErrorKind};
use docrepo_core::result::AppResult;
use docrepo_core::traits::entity::Entity;
use docrepo_core::traits::store::{FindOptions, StoreCollection, StoreDatabase};
use docrepo_core::types::filter::Filter;
use docrepo_core::types::write::{
    BulkWriteOutcome, DeleteOutcome, ReplaceOutcome, WriteKind, WriteModel,
};

/// Server limit on operations per write command.
const MAX_WRITE_BATCH_SIZE: usize = 100_000;

/// Byte budget for the operations of one write command. The whole command
/// must stay under the 16 MiB document limit.
const MAX_WRITE_BATCH_BYTES: usize = 16 * 1024 * 1024 - 64 * 1024;

/// One database of a MongoDB deployment.
#[derive(Debug, Clone)]
pub struct MongoDatabase {
    database: mongodb::Database,
}

impl MongoDatabase {
    /// Wrap a driver database handle.
    pub fn new(database: mongodb::Database) -> Self {
        Self { database }
    }

    /// The underlying driver handle.
    pub fn inner(&self) -> &mongodb::Database {
        &self.database
    }
}

#[async_trait]
impl StoreDatabase for MongoDatabase {
    type Collection<E: Entity> = MongoCollection<E>;

    fn name(&self) -> &str {
        self.database.name()
    }

    fn collection<E: Entity>(&self, name: &str) -> MongoCollection<E> {
        MongoCollection {
            collection: self.database.collection::<E>(name),
            database: self.database.clone(),
        }
    }

    async fn drop_collection(&self, name: &str) -> AppResult<()> {
        self.database
            .collection::<Document>(name)
            .drop()
            .await
            .map_err(|e| driver_error(&format!("Failed to drop collection {name}"), e))?;
        debug!(database = self.database.name(), collection = name, "Dropped collection");
        Ok(())
    }

    async fn run_command(&self, command: Document) -> AppResult<Document> {
        self.database
            .run_command(command)
            .await
            .map_err(|e| driver_error("Failed to run command", e))
    }
}

/// Typed handle on one MongoDB collection.
#[derive(Clone)]
pub struct MongoCollection<E: Send + Sync> {
    collection: mongodb::Collection<E>,
    database: mongodb::Database,
}

impl<E: Send + Sync> fmt::Debug for MongoCollection<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MongoCollection")
            .field("namespace", &self.collection.namespace().to_string())
            .finish()
    }
}

impl<E: Entity> MongoCollection<E> {
    /// Open a cursor over the documents matching `filter`.
    async fn open_cursor(
        &self,
        filter: Filter,
        options: FindOptions,
    ) -> AppResult<mongodb::Cursor<E>> {
        let mut action = self.collection.find(filter.into_document());
        if let Some(skip) = options.skip {
            action = action.skip(skip);
        }
        if let Some(limit) = options.limit {
            let limit = i64::try_from(limit).unwrap_or(i64::MAX);
            action = action.limit(limit);
        }
        if let Some(sort) = options.sort.filter(|s| !s.is_empty()) {
            action = action.sort(sort.to_document());
        }
        if let Some(projection) = options.projection {
            action = action.projection(projection);
        }
        action
            .await
            .map_err(|e| driver_error("Failed to query documents", e))
    }

    /// Submit one write command and fold its reply into counts.
    async fn run_write_command(
        &self,
        kind: WriteKind,
        operations: Vec<Document>,
    ) -> AppResult<(BulkWriteOutcome, Vec<String>)> {
        let (command_name, list_key) = match kind {
            WriteKind::Insert => ("insert", "documents"),
            WriteKind::Update => ("update", "updates"),
            WriteKind::Delete => ("delete", "deletes"),
        };
        let batch_len = operations.len();

        let mut command = Document::new();
        command.insert(command_name, self.collection.name());
        command.insert(list_key, operations);
        command.insert("ordered", false);

        let reply = self
            .database
            .run_command(command)
            .await
            .map_err(|e| driver_error(&format!("Failed to run {command_name} batch"), e))?;

        let mut errors: Vec<String> = reply
            .get_array("writeErrors")
            .map(|list| {
                list.iter()
                    .map(|entry| match entry {
                        Bson::Document(d) => {
                            d.get_str("errmsg").unwrap_or("write error").to_string()
                        }
                        other => other.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        if let Ok(concern) = reply.get_document("writeConcernError") {
            let message = concern.get_str("errmsg").unwrap_or("write concern error");
            errors.push(message.to_string());
        }

        let n = reply_count(&reply, "n");
        let mut outcome = BulkWriteOutcome::default();
        match kind {
            WriteKind::Insert => outcome.inserted_count = n,
            WriteKind::Update => {
                let upserted = reply
                    .get_array("upserted")
                    .map(|list| list.len() as u64)
                    .unwrap_or(0);
                outcome.upserted_count = upserted;
                outcome.matched_count = n.saturating_sub(upserted);
                outcome.modified_count = reply_count(&reply, "nModified");
            }
            WriteKind::Delete => outcome.deleted_count = n,
        }

        debug!(
            collection = self.collection.name(),
            command = command_name,
            operations = batch_len,
            affected = n,
            errors = errors.len(),
            "Write batch applied"
        );
        Ok((outcome, errors))
    }
}

#[async_trait]
impl<E: Entity> StoreCollection<E> for MongoCollection<E> {
    fn name(&self) -> &str {
        self.collection.name()
    }

    async fn find(&self, filter: Filter, options: FindOptions) -> AppResult<Vec<E>> {
        self.open_cursor(filter, options)
            .await?
            .try_collect()
            .await
            .map_err(|e| driver_error("Failed to read query results", e))
    }

    async fn find_stream(
        &self,
        filter: Filter,
        options: FindOptions,
    ) -> AppResult<BoxStream<'static, AppResult<E>>> {
        let cursor = self.open_cursor(filter, options).await?;
        Ok(cursor
            .map_err(|e| driver_error("Failed to read query results", e))
            .boxed())
    }

    async fn insert_one(&self, entity: &E) -> AppResult<()> {
        self.collection
            .insert_one(entity)
            .await
            .map_err(|e| driver_error("Failed to insert document", e))?;
        Ok(())
    }

    async fn insert_many(&self, entities: &[E]) -> AppResult<u64> {
        let result = self
            .collection
            .insert_many(entities)
            .await
            .map_err(|e| driver_error("Failed to insert documents", e))?;
        Ok(result.inserted_ids.len() as u64)
    }

    async fn replace_one(
        &self,
        filter: Filter,
        entity: &E,
        upsert: bool,
    ) -> AppResult<ReplaceOutcome> {
        let result = self
            .collection
            .replace_one(filter.into_document(), entity)
            .upsert(upsert)
            .await
            .map_err(|e| driver_error("Failed to replace document", e))?;
        Ok(ReplaceOutcome {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_id: result.upserted_id,
        })
    }

    async fn bulk_write(&self, models: Vec<WriteModel<E>>) -> AppResult<BulkWriteOutcome> {
        let mut outcome = BulkWriteOutcome::default();
        let mut errors: Vec<String> = Vec::new();

        let mut current: Option<WriteKind> = None;
        let mut batch: Vec<Document> = Vec::new();
        let mut batch_bytes = 0usize;

        for model in models {
            let kind = model.kind();
            let operation = write_operation(model)?;
            let size = bson::to_vec(&operation)?.len();

            let full = batch.len() >= MAX_WRITE_BATCH_SIZE
                || (!batch.is_empty() && batch_bytes + size > MAX_WRITE_BATCH_BYTES);
            if let Some(pending) = current {
                if pending != kind || full {
                    let (counts, errs) = self
                        .run_write_command(pending, std::mem::take(&mut batch))
                        .await?;
                    outcome.merge(counts);
                    errors.extend(errs);
                    batch_bytes = 0;
                }
            }
            current = Some(kind);
            batch.push(operation);
            batch_bytes += size;
        }
        if let Some(pending) = current {
            if !batch.is_empty() {
                let (counts, errs) = self.run_write_command(pending, batch).await?;
                outcome.merge(counts);
                errors.extend(errs);
            }
        }

        match errors.first() {
            None => Ok(outcome),
            Some(first) => Err(AppError::database(format!(
                "Bulk write on {} failed with {} write error(s): {first}",
                self.collection.name(),
                errors.len()
            ))),
        }
    }

    async fn delete_one(&self, filter: Filter) -> AppResult<DeleteOutcome> {
        let result = self
            .collection
            .delete_one(filter.into_document())
            .await
            .map_err(|e| driver_error("Failed to delete document", e))?;
        Ok(DeleteOutcome {
            deleted_count: result.deleted_count,
        })
    }

    async fn delete_many(&self, filter: Filter) -> AppResult<DeleteOutcome> {
        let result = self
            .collection
            .delete_many(filter.into_document())
            .await
            .map_err(|e| driver_error("Failed to delete documents", e))?;
        Ok(DeleteOutcome {
            deleted_count: result.deleted_count,
        })
    }

    async fn count(&self, filter: Filter, limit: Option<u64>) -> AppResult<u64> {
        let mut action = self.collection.count_documents(filter.into_document());
        if let Some(limit) = limit {
            action = action.limit(limit);
        }
        action
            .await
            .map_err(|e| driver_error("Failed to count documents", e))
    }
}

/// Render one write model as an entry of its write command.
fn write_operation<E: Entity>(model: WriteModel<E>) -> AppResult<Document> {
    let operation = match model {
        WriteModel::InsertOne { document } => codec::to_document(&document)?,
        WriteModel::ReplaceOne {
            filter,
            replacement,
            upsert,
        } => doc! {
            "q": filter.into_document(),
            "u": codec::to_document(&replacement)?,
            "upsert": upsert,
            "multi": false,
        },
        WriteModel::DeleteOne { filter } => doc! { "q": filter.into_document(), "limit": 1 },
        WriteModel::DeleteMany { filter } => doc! { "q": filter.into_document(), "limit": 0 },
    };
    Ok(operation)
}

/// Read a numeric field of a command reply; servers answer with int32,
/// int64 or double depending on version.
fn reply_count(reply: &Document, key: &str) -> u64 {
    match reply.get(key) {
        Some(Bson::Int32(n)) => u64::try_from(*n).unwrap_or(0),
        Some(Bson::Int64(n)) => u64::try_from(*n).unwrap_or(0),
        Some(Bson::Double(n)) if *n >= 0.0 => *n as u64,
        _ => 0,
    }
}

fn driver_error(context: &str, err: mongodb::error::Error) -> AppError {
    AppError::with_source(ErrorKind::Database, format!("{context}: {err}"), err)
}

#[cfg(test)]
mod tests {
    use docrepo_core::traits::entity::Timestamps;
    use docrepo_core::types::id::Uuid;
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::ops;

    docrepo_core::define_id!(
        /// Identifier of a test shipment.
        ShipmentId
    );

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Shipment {
        #[serde(rename = "_id")]
        id: ShipmentId,
        carrier: String,
        #[serde(flatten)]
        timestamps: Timestamps,
    }

    impl Entity for Shipment {
        type Id = ShipmentId;

        fn id(&self) -> &ShipmentId {
            &self.id
        }

        fn timestamps(&self) -> &Timestamps {
            &self.timestamps
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Parcel {
        #[serde(rename = "_id")]
        id: Uuid,
        #[serde(flatten)]
        timestamps: Timestamps,
    }

    impl Entity for Parcel {
        type Id = Uuid;

        fn id(&self) -> &Uuid {
            &self.id
        }

        fn timestamps(&self) -> &Timestamps {
            &self.timestamps
        }
    }

    fn shipment(carrier: &str) -> Shipment {
        Shipment {
            id: ShipmentId::new(),
            carrier: carrier.to_string(),
            timestamps: Timestamps::new(),
        }
    }

    /// The `_id` exactly as the driver writes it for `entity`.
    fn driver_id<T: Serialize>(entity: &T) -> Bson {
        bson::to_raw_document_buf(entity)
            .unwrap()
            .to_document()
            .unwrap()
            .get("_id")
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_typed_id_filter_matches_driver_encoding() {
        let entity = shipment("post");
        let filter = ops::id_filter::<Shipment>(entity.id()).unwrap();
        assert_eq!(filter.as_document().get("_id"), Some(&driver_id(&entity)));
        assert_eq!(driver_id(&entity), Bson::String(entity.id.to_string()));
    }

    #[test]
    fn test_uuid_filter_matches_driver_encoding() {
        let parcel = Parcel {
            id: Uuid::now_v7(),
            timestamps: Timestamps::new(),
        };
        let filter = ops::id_filter::<Parcel>(parcel.id()).unwrap();
        assert_eq!(filter.as_document().get("_id"), Some(&driver_id(&parcel)));
    }

    #[test]
    fn test_replace_operation_keys_and_body_agree() {
        let entity = shipment("courier");
        let models = ops::replace_models(std::slice::from_ref(&entity)).unwrap();
        let operation = write_operation(models.into_iter().next().unwrap()).unwrap();

        let query = operation.get_document("q").unwrap();
        let body = operation.get_document("u").unwrap();
        assert_eq!(query.get("_id"), Some(&driver_id(&entity)));
        assert_eq!(body.get("_id"), Some(&driver_id(&entity)));
        assert_eq!(body.get_str("carrier").unwrap(), "courier");
        assert!(!operation.get_bool("upsert").unwrap());
        assert!(!operation.get_bool("multi").unwrap());
    }

    #[test]
    fn test_insert_operation_is_the_stored_document() {
        let entity = shipment("freight");
        let operation = write_operation(WriteModel::InsertOne {
            document: entity.clone(),
        })
        .unwrap();
        let stored = bson::to_raw_document_buf(&entity).unwrap().to_document().unwrap();
        assert_eq!(operation, stored);
    }

    #[test]
    fn test_delete_operations_set_limit() {
        let one = write_operation::<Shipment>(WriteModel::DeleteOne {
            filter: Filter::eq("carrier", "post"),
        })
        .unwrap();
        assert_eq!(one, doc! { "q": { "carrier": "post" }, "limit": 1 });

        let many = write_operation::<Shipment>(WriteModel::DeleteMany {
            filter: Filter::eq("carrier", "post"),
        })
        .unwrap();
        assert_eq!(many.get_i32("limit").unwrap(), 0);
    }

    #[test]
    fn test_reply_count_accepts_all_numeric_widths() {
        let reply = doc! { "a": 3, "b": 4i64, "c": 5.0, "d": "x", "e": -1 };
        assert_eq!(reply_count(&reply, "a"), 3);
        assert_eq!(reply_count(&reply, "b"), 4);
        assert_eq!(reply_count(&reply, "c"), 5);
        assert_eq!(reply_count(&reply, "d"), 0);
        assert_eq!(reply_count(&reply, "e"), 0);
        assert_eq!(reply_count(&reply, "missing"), 0);
    }
}
