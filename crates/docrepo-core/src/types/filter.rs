//! Filter expressions for store queries.
//!
//! A [`Filter`] is a typed builder over the store's query document. It is
//! how callers express "predicate over the entity": the predicate is
//! evaluated by the store, never in process.

use bson::{Bson, Document};
use serde::{Deserialize, Serialize};

use crate::result::AppResult;
use crate::traits::entity::EntityId;

/// Filter comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    /// Exact equality.
    Eq,
    /// Not equal.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Membership in a list.
    In,
    /// Absence from a list.
    Nin,
    /// Field presence check (value must be a boolean).
    Exists,
}

impl FilterOp {
    /// Return the store operator keyword.
    pub fn as_operator(&self) -> &'static str {
        match self {
            Self::Eq => "$eq",
            Self::Ne => "$ne",
            Self::Gt => "$gt",
            Self::Gte => "$gte",
            Self::Lt => "$lt",
            Self::Lte => "$lte",
            Self::In => "$in",
            Self::Nin => "$nin",
            Self::Exists => "$exists",
        }
    }
}

/// A store filter expression. The empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter(Document);

impl Filter {
    /// A filter that matches every document.
    pub fn empty() -> Self {
        Self(Document::new())
    }

    /// Compare a field against a value with the given operator.
    pub fn field(field: impl Into<String>, op: FilterOp, value: impl Into<Bson>) -> Self {
        let mut condition = Document::new();
        condition.insert(op.as_operator(), value.into());
        let mut doc = Document::new();
        doc.insert(field.into(), condition);
        Self(doc)
    }

    /// Shorthand for an equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        let mut doc = Document::new();
        doc.insert(field.into(), value.into());
        Self(doc)
    }

    /// Shorthand for a not-equal filter.
    pub fn ne(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::field(field, FilterOp::Ne, value)
    }

    /// Shorthand for a greater-than filter.
    pub fn gt(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::field(field, FilterOp::Gt, value)
    }

    /// Shorthand for a greater-than-or-equal filter.
    pub fn gte(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::field(field, FilterOp::Gte, value)
    }

    /// Shorthand for a less-than filter.
    pub fn lt(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::field(field, FilterOp::Lt, value)
    }

    /// Shorthand for a less-than-or-equal filter.
    pub fn lte(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::field(field, FilterOp::Lte, value)
    }

    /// Match documents whose field is one of `values`.
    pub fn is_in<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Bson>,
    {
        let list: Vec<Bson> = values.into_iter().map(Into::into).collect();
        Self::field(field, FilterOp::In, list)
    }

    /// Match documents whose field is none of `values`.
    pub fn not_in<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Bson>,
    {
        let list: Vec<Bson> = values.into_iter().map(Into::into).collect();
        Self::field(field, FilterOp::Nin, list)
    }

    /// Match documents where the field is (or is not) present.
    pub fn exists(field: impl Into<String>, present: bool) -> Self {
        Self::field(field, FilterOp::Exists, present)
    }

    /// Equality on the identifier field.
    pub fn by_id<I: EntityId>(field: &str, id: &I) -> AppResult<Self> {
        Ok(Self::eq(field, id.to_bson()?))
    }

    /// Membership of the identifier field in `ids`.
    pub fn by_ids<I: EntityId>(field: &str, ids: &[I]) -> AppResult<Self> {
        let values = ids
            .iter()
            .map(EntityId::to_bson)
            .collect::<AppResult<Vec<Bson>>>()?;
        Ok(Self::is_in(field, values))
    }

    /// Combine filters so that all must match. Empty operands are dropped.
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Self::combine("$and", filters)
    }

    /// Combine filters so that at least one must match.
    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        Self::combine("$or", filters)
    }

    /// Combine `self` with another filter conjunctively.
    pub fn and_also(self, other: Filter) -> Self {
        Self::and([self, other])
    }

    fn combine(operator: &str, filters: impl IntoIterator<Item = Filter>) -> Self {
        let mut parts: Vec<Document> = filters
            .into_iter()
            .filter(|f| !f.is_empty())
            .map(Filter::into_document)
            .collect();
        match parts.len() {
            0 => Self::empty(),
            1 => Self(parts.remove(0)),
            _ => {
                let mut doc = Document::new();
                doc.insert(operator, parts);
                Self(doc)
            }
        }
    }

    /// Whether this filter matches everything.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the underlying query document.
    pub fn as_document(&self) -> &Document {
        &self.0
    }

    /// Consume into the underlying query document.
    pub fn into_document(self) -> Document {
        self.0
    }
}

impl From<Document> for Filter {
    fn from(doc: Document) -> Self {
        Self(doc)
    }
}

impl From<Filter> for Document {
    fn from(filter: Filter) -> Self {
        filter.0
    }
}
