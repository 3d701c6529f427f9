//! Typed identifier newtypes around [`uuid::Uuid`].
//!
//! Distinct key types keep a `UserId` from being passed where an
//! `OrderId` is expected. Every generated type implements
//! [`EntityId`](crate::traits::entity::EntityId) and can key an entity.
//!
//! Generated identifiers serialize as their hyphenated string form with
//! every serializer, so the stored `_id` and the value in an identifier
//! filter never disagree.

pub use uuid::Uuid;

/// Define a newtype identifier wrapper around `Uuid`.
///
/// ```ignore
/// docrepo_core::define_id!(
///     /// Unique identifier for a customer.
///     CustomerId
/// );
/// ```
#[macro_export]
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub $crate::types::id::Uuid);

        impl $name {
            /// Create a new time-ordered identifier.
            pub fn new() -> Self {
                Self($crate::types::id::Uuid::now_v7())
            }

            /// Create an identifier from an existing UUID.
            pub fn from_uuid(uuid: $crate::types::id::Uuid) -> Self {
                Self(uuid)
            }

            /// Return the inner UUID value.
            pub fn into_uuid(self) -> $crate::types::id::Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::types::id::UuidError;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                $crate::types::id::Uuid::parse_str(s).map(Self)
            }
        }

        impl $crate::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
            where
                S: $crate::serde::Serializer,
            {
                serializer.collect_str(&self.0)
            }
        }

        impl<'de> $crate::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
            where
                D: $crate::serde::Deserializer<'de>,
            {
                let text = <::std::string::String as $crate::serde::Deserialize>::deserialize(
                    deserializer,
                )?;
                text.parse()
                    .map_err(<D::Error as $crate::serde::de::Error>::custom)
            }
        }

        impl From<$crate::types::id::Uuid> for $name {
            fn from(uuid: $crate::types::id::Uuid) -> Self {
                Self(uuid)
            }
        }

        impl $crate::traits::entity::EntityId for $name {}
    };
}

/// Error returned when parsing a typed identifier.
pub type UuidError = uuid::Error;

#[cfg(test)]
mod tests {
    use bson::Bson;

    use crate::codec;
    use crate::traits::entity::EntityId;

    crate::define_id!(
        /// Identifier used by the tests below.
        SampleId
    );

    #[test]
    fn test_new_ids_differ() {
        assert_ne!(SampleId::new(), SampleId::new());
    }

    #[test]
    fn test_display_and_parse() {
        let id = SampleId::new();
        let parsed: SampleId = id.to_string().parse().expect("should parse");
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_to_bson_is_stable() {
        let id = SampleId::new();
        assert_eq!(id.to_bson().unwrap(), id.to_bson().unwrap());
    }

    #[test]
    fn test_encodes_as_string_for_every_serializer() {
        let id = SampleId::new();
        assert_eq!(id.to_bson().unwrap(), Bson::String(id.to_string()));
        assert_eq!(bson::to_bson(&id).unwrap(), Bson::String(id.to_string()));
        assert_eq!(serde_json::to_value(id).unwrap(), id.to_string());
    }

    #[test]
    fn test_stored_identifier_matches_filter_value() {
        #[derive(serde::Serialize)]
        struct Keyed {
            #[serde(rename = "_id")]
            id: SampleId,
        }

        let keyed = Keyed { id: SampleId::new() };
        let stored = bson::to_raw_document_buf(&keyed).unwrap().to_document().unwrap();
        assert_eq!(stored.get("_id"), Some(&keyed.id.to_bson().unwrap()));
        assert_eq!(codec::to_document(&keyed).unwrap(), stored);
    }

    #[test]
    fn test_rejects_malformed_text() {
        assert!(serde_json::from_str::<SampleId>(r#""not-a-uuid""#).is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let id = SampleId::new();
        let json = serde_json::to_string(&id).expect("serialize");
        let parsed: SampleId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(id, parsed);
    }
}
