//! Core traits defined in `docrepo-core` and implemented by other crates.

pub mod entity;
pub mod naming;
pub mod repository;
pub mod store;

pub use entity::{Entity, EntityId, Timestamps};
pub use naming::NamingResolver;
pub use repository::Repository;
pub use store::{FindOptions, StoreClient, StoreCollection, StoreDatabase};
