//! The contract every persisted record implements.

use std::fmt::Debug;
use std::hash::Hash;

use bson::Bson;
use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::result::AppResult;

/// A key type that can identify an entity.
///
/// Keys are compared for equality by the store, so they must convert to
/// the same BSON value the driver writes into the stored document.
pub trait EntityId:
    Clone + Eq + Hash + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Convert the key to the BSON value stored in the identifier field.
    fn to_bson(&self) -> AppResult<Bson> {
        codec::to_bson(self)
    }
}

impl EntityId for String {
    fn to_bson(&self) -> AppResult<Bson> {
        Ok(Bson::String(self.clone()))
    }
}

impl EntityId for ObjectId {
    fn to_bson(&self) -> AppResult<Bson> {
        Ok(Bson::ObjectId(*self))
    }
}

impl EntityId for i32 {
    fn to_bson(&self) -> AppResult<Bson> {
        Ok(Bson::Int32(*self))
    }
}

impl EntityId for i64 {
    fn to_bson(&self) -> AppResult<Bson> {
        Ok(Bson::Int64(*self))
    }
}

impl EntityId for uuid::Uuid {}

/// Creation and last-modification timestamps (UTC).
///
/// Embed with `#[serde(flatten)]` so both fields live at the top level of
/// the stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    /// Set once, when the entity is constructed.
    pub created_on: DateTime<Utc>,
    /// Unset until the entity is first modified.
    #[serde(default)]
    pub modified_on: Option<DateTime<Utc>>,
}

impl Timestamps {
    /// Timestamps for an entity constructed now.
    pub fn new() -> Self {
        Self {
            created_on: Utc::now(),
            modified_on: None,
        }
    }

    /// Record a modification at the current time.
    pub fn touch(&mut self) {
        self.modified_on = Some(Utc::now());
    }
}

impl Default for Timestamps {
    fn default() -> Self {
        Self::new()
    }
}

/// A typed record stored as one document of a collection.
///
/// The identifier is serialized under [`Entity::ID_FIELD`] and must not
/// change after the entity is first persisted.
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + Unpin + 'static {
    /// The identifier type.
    type Id: EntityId;

    /// Name of the identifier field in the stored document.
    const ID_FIELD: &'static str = "_id";

    /// The entity's identifier.
    fn id(&self) -> &Self::Id;

    /// The entity's timestamps.
    fn timestamps(&self) -> &Timestamps;

    /// When the entity was constructed.
    fn created_on(&self) -> DateTime<Utc> {
        self.timestamps().created_on
    }

    /// When the entity was last modified, if ever.
    fn modified_on(&self) -> Option<DateTime<Utc>> {
        self.timestamps().modified_on
    }

    /// Logical name used to derive the collection name.
    fn type_name() -> &'static str {
        short_type_name::<Self>()
    }
}

/// Last path segment of a type's name, without generic arguments.
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Invoice {
        #[serde(rename = "_id")]
        id: String,
        #[serde(flatten)]
        timestamps: Timestamps,
    }

    impl Entity for Invoice {
        type Id = String;

        fn id(&self) -> &String {
            &self.id
        }

        fn timestamps(&self) -> &Timestamps {
            &self.timestamps
        }
    }

    #[test]
    fn test_type_name_is_last_segment() {
        assert_eq!(Invoice::type_name(), "Invoice");
        assert_eq!(short_type_name::<Vec<u8>>(), "Vec");
    }

    #[test]
    fn test_new_timestamps_are_unmodified() {
        let mut ts = Timestamps::new();
        assert!(ts.modified_on.is_none());
        ts.touch();
        assert!(ts.modified_on.unwrap() >= ts.created_on);
    }

    #[test]
    fn test_flattened_document_layout() {
        let invoice = Invoice {
            id: "inv-1".into(),
            timestamps: Timestamps::new(),
        };
        let doc = codec::to_document(&invoice).unwrap();
        assert_eq!(doc.get_str("_id").unwrap(), "inv-1");
        assert!(doc.contains_key("created_on"));
        assert_eq!(invoice.modified_on(), None);
    }

    #[test]
    fn test_builtin_keys_to_bson() {
        assert_eq!(7i32.to_bson().unwrap(), Bson::Int32(7));
        assert_eq!(7i64.to_bson().unwrap(), Bson::Int64(7));
        let oid = ObjectId::new();
        assert_eq!(oid.to_bson().unwrap(), Bson::ObjectId(oid));
    }

    #[test]
    fn test_uuid_key_matches_stored_identifier() {
        #[derive(Serialize)]
        struct Keyed {
            #[serde(rename = "_id")]
            id: uuid::Uuid,
        }

        let keyed = Keyed {
            id: uuid::Uuid::now_v7(),
        };
        let stored = bson::to_raw_document_buf(&keyed).unwrap().to_document().unwrap();
        assert_eq!(stored.get("_id"), Some(&keyed.id.to_bson().unwrap()));
    }
}
