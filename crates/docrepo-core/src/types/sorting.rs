//! Sort order for store queries.

use bson::Document;
use serde::{Deserialize, Serialize};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order.
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl SortDirection {
    /// Return the store's sort specifier for this direction.
    pub fn as_order(&self) -> i32 {
        match self {
            Self::Asc => 1,
            Self::Desc => -1,
        }
    }
}

/// A sort specification consisting of a field name and direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    /// Document field name (dotted paths allowed).
    pub field: String,
    /// Sort direction.
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortField {
    /// Create a new sort field.
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Create an ascending sort on the given field.
    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    /// Create a descending sort on the given field.
    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Desc)
    }
}

/// An ordered list of sort keys; earlier keys take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sort(Vec<SortField>);

impl Sort {
    /// Sort by a single ascending key.
    pub fn asc(field: impl Into<String>) -> Self {
        Self(vec![SortField::asc(field)])
    }

    /// Sort by a single descending key.
    pub fn desc(field: impl Into<String>) -> Self {
        Self(vec![SortField::desc(field)])
    }

    /// Append a tie-breaking key.
    pub fn then(mut self, field: SortField) -> Self {
        self.0.push(field);
        self
    }

    /// The sort keys in precedence order.
    pub fn fields(&self) -> &[SortField] {
        &self.0
    }

    /// Whether no key was given.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Render as a store sort document (`{field: 1 | -1, ...}`).
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        for key in &self.0 {
            doc.insert(key.field.clone(), key.direction.as_order());
        }
        doc
    }
}

impl From<SortField> for Sort {
    fn from(field: SortField) -> Self {
        Self(vec![field])
    }
}

impl From<Vec<SortField>> for Sort {
    fn from(fields: Vec<SortField>) -> Self {
        Self(fields)
    }
}
