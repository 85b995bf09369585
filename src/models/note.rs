use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codec;

use super::Label;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteEntity {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub content: String,
    /// Unordered label references. Storage does not deduplicate; uniqueness
    /// is the caller's responsibility.
    pub label_ids: Vec<String>,
    #[serde(with = "codec::date")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "codec::opt_date", default)]
    pub updated_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
}

/// Hydrated view with label references resolved. Derived by the mapping
/// layer, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub content: String,
    pub labels: Vec<Label>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNote {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub label_ids: Option<Vec<String>>,
}

/// Update input. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub label_ids: Option<Vec<String>>,
}
