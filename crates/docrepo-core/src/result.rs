//! Convenience result type alias for DocRepo.

use crate::error::AppError;

/// A specialized `Result` type for DocRepo operations.
pub type AppResult<T> = Result<T, AppError>;
