//! BSON encoding shared by every backend.
//!
//! The MongoDB driver writes documents with the raw serializer, which is
//! not human-readable: a `Uuid` field becomes binary, not a string. Stored
//! documents, identifier filters and in-memory records are all produced
//! here with that same serializer, so a filter value always equals the
//! value the driver stored.

use bson::{Bson, Document};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::AppError;
use crate::result::AppResult;

/// Encode `value` as the document the driver would store.
pub fn to_document<T: Serialize>(value: &T) -> AppResult<Document> {
    let raw = bson::to_raw_document_buf(value)?;
    Ok(raw.to_document()?)
}

/// Decode a stored document the way the driver reads one back.
pub fn from_document<T: DeserializeOwned>(document: &Document) -> AppResult<T> {
    let mut bytes = Vec::new();
    document.to_writer(&mut bytes)?;
    Ok(bson::from_slice(&bytes)?)
}

/// Encode a single value as it would appear inside a stored document.
pub fn to_bson<T: Serialize>(value: &T) -> AppResult<Bson> {
    #[derive(Serialize)]
    struct Field<'a, T> {
        value: &'a T,
    }

    let mut wrapped = to_document(&Field { value })?;
    wrapped
        .remove("value")
        .ok_or_else(|| AppError::serialization("value encoded to an empty field"))
}
