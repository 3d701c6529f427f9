//! Write operations and the outcomes reported by the store.

use bson::Bson;
use serde::Serialize;

use crate::types::filter::Filter;

/// Result of a single-document replace (optionally an upsert).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReplaceOutcome {
    /// Documents matched by the filter.
    pub matched_count: u64,
    /// Documents actually changed.
    pub modified_count: u64,
    /// Identifier of the inserted document when the upsert inserted.
    pub upserted_id: Option<Bson>,
}

impl ReplaceOutcome {
    /// Whether the replace inserted a new document.
    pub fn is_upsert(&self) -> bool {
        self.upserted_id.is_some()
    }
}

/// Result of a delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    /// Documents removed.
    pub deleted_count: u64,
}

/// Counts reported for a batch of writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BulkWriteOutcome {
    /// Documents matched by replace operations.
    pub matched_count: u64,
    /// Documents changed by replace operations.
    pub modified_count: u64,
    /// Documents inserted by insert operations.
    pub inserted_count: u64,
    /// Documents inserted by upserting replaces.
    pub upserted_count: u64,
    /// Documents removed.
    pub deleted_count: u64,
}

impl BulkWriteOutcome {
    /// Accumulate the counts of another batch into this one.
    pub fn merge(&mut self, other: BulkWriteOutcome) {
        self.matched_count += other.matched_count;
        self.modified_count += other.modified_count;
        self.inserted_count += other.inserted_count;
        self.upserted_count += other.upserted_count;
        self.deleted_count += other.deleted_count;
    }
}

/// One operation inside a bulk write.
#[derive(Debug, Clone)]
pub enum WriteModel<E> {
    /// Insert a document.
    InsertOne {
        /// The document to insert.
        document: E,
    },
    /// Replace the first document matching `filter`.
    ReplaceOne {
        /// Selects the document to replace.
        filter: Filter,
        /// The new document.
        replacement: E,
        /// Insert when nothing matches.
        upsert: bool,
    },
    /// Delete the first document matching `filter`.
    DeleteOne {
        /// Selects the document to delete.
        filter: Filter,
    },
    /// Delete every document matching `filter`.
    DeleteMany {
        /// Selects the documents to delete.
        filter: Filter,
    },
}

impl<E> WriteModel<E> {
    /// Short name of the operation, used for logging and batching.
    pub fn kind(&self) -> WriteKind {
        match self {
            Self::InsertOne { .. } => WriteKind::Insert,
            Self::ReplaceOne { .. } => WriteKind::Update,
            Self::DeleteOne { .. } | Self::DeleteMany { .. } => WriteKind::Delete,
        }
    }
}

/// Store command family a [`WriteModel`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    /// `insert`
    Insert,
    /// `update`
    Update,
    /// `delete`
    Delete,
}
