//! # docrepo-core
//!
//! Core crate for DocRepo. Contains the entity contract, the store
//! collaborator traits, the generic repository contract, naming
//! resolution, paging/query value objects, configuration schemas,
//! and the unified error system.
//!
//! This crate has **no** internal dependencies on other DocRepo crates
//! and does not talk to any store by itself.

pub mod cancel;
pub mod codec;
pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;

#[doc(hidden)]
pub use serde;
