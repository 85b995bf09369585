//! Shared query primitives: filter parameters, the generic comparator used by
//! every sorted scan, word-prefix text matching, and pagination slicing.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::codec;
use crate::error::{Result, StoreError};

/// Filter value meaning "documents with no labels at all". Never a real label
/// id; excluded from intersection tests.
pub const UNLABELED: &str = "__unlabeled__";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// The query surface consumed by every "get all" / "get by criteria" call.
/// Entity-specific fields are simply ignored by DAOs they do not apply to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParams {
    pub search_term: Option<String>,
    pub label_ids: Option<Vec<String>>,
    pub note_ids: Option<Vec<String>>,
    pub date: Option<DateTime<Utc>>,
    pub is_completed: Option<bool>,
    pub is_repeat: Option<bool>,
    pub is_overdue: Option<bool>,
    pub parent_task_id: Option<String>,
    pub color: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl FilterParams {
    /// The same filter with sorting and pagination stripped, for the
    /// fetch-everything stage of a criteria query.
    pub fn unpaged(&self) -> FilterParams {
        FilterParams {
            sort_by: None,
            sort_order: None,
            limit: None,
            offset: None,
            ..self.clone()
        }
    }
}

/// Total, non-throwing comparison across heterogeneous stored values.
///
/// Rules, in priority order: null sorts before any real value and two nulls
/// are equal; operands of unlike types are treated as equal; `false < true`;
/// numbers compare numerically; strings lexicographically (encoded dates are
/// fixed-width, so lexicographic order is instant order); arrays element-wise
/// with length as the tiebreak. Callers rely on this being stable over
/// partially populated records, so none of these rules may panic.
pub fn general_compare(a: &Value, b: &Value) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        (false, false) => {}
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (left, right) in x.iter().zip(y.iter()) {
                let ord = general_compare(left, right);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        // Unlike types (and objects) do not order against each other.
        _ => Ordering::Equal,
    }
}

/// Case-insensitive whole-word-prefix match: splits `text` on whitespace and
/// succeeds when any word starts with `query`. "wonderful day" matches
/// "wonder" but not "der".
pub fn slug_include(text: &str, query: &str) -> bool {
    let needle = query.to_lowercase();
    text.split_whitespace()
        .any(|word| word.to_lowercase().starts_with(&needle))
}

/// Field access for sorting: a missing key or the stored `"undefined"`
/// marker both count as the falsy class, so cleared optionals sort first
/// like genuinely absent values.
fn sort_field<'a>(doc: &'a Value, key: &str) -> &'a Value {
    match doc.get(key) {
        None => &Value::Null,
        Some(Value::String(raw)) if raw == codec::UNDEFINED => &Value::Null,
        Some(value) => value,
    }
}

/// Sort documents by the named field, checking the key against the first
/// record, then apply offset/limit slicing.
pub fn sort_and_page_documents(
    mut docs: Vec<Value>,
    params: &FilterParams,
) -> Result<Vec<Value>> {
    if let Some(sort_by) = &params.sort_by {
        if let Some(first) = docs.first() {
            let known = first
                .as_object()
                .map(|obj| obj.contains_key(sort_by))
                .unwrap_or(false);
            if !known {
                return Err(StoreError::InvalidSortKey(sort_by.clone()));
            }
        }
        let descending = params.sort_order == Some(SortOrder::Desc);
        docs.sort_by(|a, b| {
            let left = sort_field(a, sort_by);
            let right = sort_field(b, sort_by);
            let ord = general_compare(left, right);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        });
    }

    let offset = params.offset.unwrap_or(0);
    if offset >= docs.len() {
        return Ok(Vec::new());
    }
    let mut page: Vec<Value> = docs.drain(offset..).collect();
    if let Some(limit) = params.limit {
        page.truncate(limit);
    }
    Ok(page)
}

/// Typed wrapper over [`sort_and_page_documents`] for DAO criteria queries.
pub fn sort_and_page<T>(items: Vec<T>, params: &FilterParams) -> Result<Vec<T>>
where
    T: Serialize + DeserializeOwned,
{
    if params.sort_by.is_none() && params.limit.is_none() && params.offset.unwrap_or(0) == 0 {
        return Ok(items);
    }
    let docs = items
        .iter()
        .map(|item| codec::to_document(item).map(Value::Object))
        .collect::<Result<Vec<_>>>()?;
    sort_and_page_documents(docs, params)?
        .into_iter()
        .map(|doc| Ok(serde_json::from_value(doc)?))
        .collect()
}
