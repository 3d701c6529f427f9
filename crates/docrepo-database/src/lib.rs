//! # docrepo-database
//!
//! The generic document repository and everything around it: naming
//! conventions, the paging and bulk algorithms, the repository helper,
//! the store health check, and the MongoDB and in-memory store backends.

pub mod audit;
#[cfg(feature = "mongo")]
pub mod connection;
pub mod helper;
pub mod naming;
pub mod ops;
pub mod repository;
pub mod store;

pub use audit::{AuditRepository, DbStatus};
#[cfg(feature = "mongo")]
pub use connection::MongoClient;
pub use helper::RepositoryHelper;
pub use naming::DefaultNamingResolver;
pub use repository::DocumentRepository;
#[cfg(feature = "memory")]
pub use store::memory::MemoryClient;
