//! Core value types used across the DocRepo workspace.

pub mod filter;
pub mod id;
pub mod pagination;
pub mod sorting;
pub mod write;

pub use filter::{Filter, FilterOp};
pub use pagination::{PageRequest, PageResult};
pub use sorting::{Sort, SortDirection, SortField};
pub use write::{BulkWriteOutcome, DeleteOutcome, ReplaceOutcome, WriteKind, WriteModel};
