//! Query evaluation for the in-memory store.
//!
//! Understands the subset of the query language that [`Filter`] produces:
//! implicit equality, the comparison operators, `$in`/`$nin`, `$exists`
//! and the logical combinators `$and`, `$or` and `$nor`. Field paths may
//! be dotted.
//!
//! [`Filter`]: docrepo_core::types::Filter

use std::cmp::Ordering;

use bson::{Bson, Document};

use docrepo_core::error::AppError;
use docrepo_core::result::AppResult;

/// Whether `doc` satisfies the query document `filter`.
pub fn matches(doc: &Document, filter: &Document) -> AppResult<bool> {
    for (key, condition) in filter {
        let ok = match key.as_str() {
            "$and" => {
                let mut all = true;
                for clause in clauses(key, condition)? {
                    if !matches(doc, clause)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            "$or" => {
                let mut any = false;
                for clause in clauses(key, condition)? {
                    if matches(doc, clause)? {
                        any = true;
                        break;
                    }
                }
                any
            }
            "$nor" => {
                let mut none = true;
                for clause in clauses(key, condition)? {
                    if matches(doc, clause)? {
                        none = false;
                        break;
                    }
                }
                none
            }
            op if op.starts_with('$') => {
                return Err(AppError::validation(format!(
                    "unknown top level operator: {op}"
                )));
            }
            path => field_matches(lookup(doc, path), condition)?,
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn clauses<'a>(operator: &str, condition: &'a Bson) -> AppResult<Vec<&'a Document>> {
    let Bson::Array(items) = condition else {
        return Err(AppError::validation(format!("{operator} must be an array")));
    };
    items
        .iter()
        .map(|item| match item {
            Bson::Document(clause) => Ok(clause),
            _ => Err(AppError::validation(format!(
                "{operator} entries must be documents"
            ))),
        })
        .collect()
}

/// Evaluate one field condition: either an operator document or a literal.
fn field_matches(actual: Option<&Bson>, condition: &Bson) -> AppResult<bool> {
    match condition {
        Bson::Document(ops) if is_operator_document(ops) => {
            for (op, operand) in ops {
                if !operator_matches(actual, op, operand)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        literal => Ok(equals(actual, literal)),
    }
}

fn is_operator_document(doc: &Document) -> bool {
    doc.keys().next().is_some_and(|k| k.starts_with('$'))
}

fn operator_matches(actual: Option<&Bson>, op: &str, operand: &Bson) -> AppResult<bool> {
    let result = match op {
        "$eq" => equals(actual, operand),
        "$ne" => !equals(actual, operand),
        "$gt" => ordered(actual, operand, |o| o == Ordering::Greater),
        "$gte" => ordered(actual, operand, |o| o != Ordering::Less),
        "$lt" => ordered(actual, operand, |o| o == Ordering::Less),
        "$lte" => ordered(actual, operand, |o| o != Ordering::Greater),
        "$in" => list(op, operand)?.iter().any(|v| equals(actual, v)),
        "$nin" => !list(op, operand)?.iter().any(|v| equals(actual, v)),
        "$exists" => actual.is_some() == truthy(operand),
        other => {
            return Err(AppError::validation(format!("unknown operator: {other}")));
        }
    };
    Ok(result)
}

fn list<'a>(op: &str, operand: &'a Bson) -> AppResult<&'a Vec<Bson>> {
    match operand {
        Bson::Array(values) => Ok(values),
        _ => Err(AppError::validation(format!("{op} needs an array"))),
    }
}

fn truthy(value: &Bson) -> bool {
    match value {
        Bson::Boolean(b) => *b,
        Bson::Null | Bson::Undefined => false,
        other => as_f64(other).is_none_or(|n| n != 0.0),
    }
}

/// Equality with query semantics: numbers compare across widths, an
/// array field matches when any element does, and a missing field equals
/// `null`.
pub fn equals(actual: Option<&Bson>, expected: &Bson) -> bool {
    match actual {
        None => matches!(expected, Bson::Null),
        Some(Bson::Array(items)) if !matches!(expected, Bson::Array(_)) => {
            items.iter().any(|item| values_equal(item, expected))
        }
        Some(value) => values_equal(value, expected),
    }
}

fn values_equal(a: &Bson, b: &Bson) -> bool {
    match (as_f64(a), as_f64(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Range comparisons only match values of the same type class.
fn ordered(actual: Option<&Bson>, operand: &Bson, accept: impl Fn(Ordering) -> bool) -> bool {
    let check = |value: &Bson| {
        type_rank(value) == type_rank(operand) && accept(compare(value, operand))
    };
    match actual {
        None => false,
        Some(Bson::Array(items)) if !matches!(operand, Bson::Array(_)) => items.iter().any(check),
        Some(value) => check(value),
    }
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}

/// Canonical cross-type ordering used for sorting.
fn type_rank(value: &Bson) -> u8 {
    match value {
        Bson::MinKey => 0,
        Bson::Null | Bson::Undefined => 1,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_) => 2,
        Bson::Symbol(_) | Bson::String(_) => 3,
        Bson::Document(_) => 4,
        Bson::Array(_) => 5,
        Bson::Binary(_) => 6,
        Bson::ObjectId(_) => 7,
        Bson::Boolean(_) => 8,
        Bson::DateTime(_) => 9,
        Bson::Timestamp(_) => 10,
        Bson::RegularExpression(_) => 11,
        Bson::MaxKey => 13,
        _ => 12,
    }
}

/// Total order over BSON values: by type class first, then by value.
pub fn compare(a: &Bson, b: &Bson) -> Ordering {
    let by_rank = type_rank(a).cmp(&type_rank(b));
    if by_rank != Ordering::Equal {
        return by_rank;
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => x.cmp(y),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => x.bytes().cmp(&y.bytes()),
        (Bson::Boolean(x), Bson::Boolean(y)) => x.cmp(y),
        (Bson::DateTime(x), Bson::DateTime(y)) => {
            x.timestamp_millis().cmp(&y.timestamp_millis())
        }
        (Bson::Timestamp(x), Bson::Timestamp(y)) => {
            (x.time, x.increment).cmp(&(y.time, y.increment))
        }
        (Bson::Array(x), Bson::Array(y)) => compare_seq(x.iter(), y.iter()),
        (Bson::Document(x), Bson::Document(y)) => compare_seq(x.values(), y.values()),
        _ => match (as_f64(a), as_f64(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
    }
}

fn compare_seq<'a>(
    mut left: impl Iterator<Item = &'a Bson>,
    mut right: impl Iterator<Item = &'a Bson>,
) -> Ordering {
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = compare(x, y);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// Resolve a dotted path inside `doc`.
pub fn lookup<'a>(doc: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = doc.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Bson::Document(inner) => inner.get(segment)?,
            Bson::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Apply a `{field: 1}` (inclusion) or `{field: 0}` (exclusion) projection
/// to the top-level fields of `doc`. `_id` is kept unless excluded.
pub fn project(mut doc: Document, projection: &Document) -> AppResult<Document> {
    if projection.is_empty() {
        return Ok(doc);
    }
    let keep_id = projection.get("_id").is_none_or(truthy);
    let fields: Vec<(&str, bool)> = projection
        .iter()
        .filter(|(field, _)| field.as_str() != "_id")
        .map(|(field, flag)| (field.as_str(), truthy(flag)))
        .collect();
    let inclusive = fields.first().is_some_and(|(_, include)| *include);
    if fields.iter().any(|(_, include)| *include != inclusive) {
        return Err(AppError::validation(
            "cannot mix inclusion and exclusion in a projection",
        ));
    }

    if inclusive {
        let mut out = Document::new();
        if keep_id {
            if let Some(id) = doc.remove("_id") {
                out.insert("_id", id);
            }
        }
        for (key, value) in doc {
            if fields.iter().any(|(field, _)| *field == key) {
                out.insert(key, value);
            }
        }
        return Ok(out);
    }

    for (field, _) in &fields {
        doc.remove(*field);
    }
    if !keep_id {
        doc.remove("_id");
    }
    Ok(doc)
}

/// Stable sort of `docs` by a `{field: 1 | -1}` sort document.
/// Missing fields sort as `null`.
pub fn sort_documents(docs: &mut [Document], sort: &Document) {
    let keys: Vec<(&str, bool)> = sort
        .iter()
        .map(|(field, dir)| (field.as_str(), as_f64(dir).is_none_or(|d| d >= 0.0)))
        .collect();
    docs.sort_by(|a, b| {
        for (field, ascending) in &keys {
            let left = lookup(a, field).unwrap_or(&Bson::Null);
            let right = lookup(b, field).unwrap_or(&Bson::Null);
            let ord = compare(left, right);
            if ord != Ordering::Equal {
                return if *ascending { ord } else { ord.reverse() };
            }
        }
        Ordering::Equal
    });
}
