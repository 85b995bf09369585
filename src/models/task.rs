use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codec;

use super::{Label, Note};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RepeatUnit {
    Day,
    Week,
    Month,
    Year,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repeat {
    pub value: u32,
    pub unit: RepeatUnit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskEntity {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(with = "codec::date")]
    pub start: DateTime<Utc>,
    #[serde(with = "codec::date")]
    pub end: DateTime<Utc>,
    pub is_all_day: bool,
    pub is_completed: bool,
    pub is_announcement: bool,
    pub is_deleted: bool,
    #[serde(with = "codec::date")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "codec::opt_date", default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(with = "codec::opt_date", default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(with = "codec::undef", default)]
    pub repeat: Option<Repeat>,
    pub label_ids: Vec<String>,
    #[serde(with = "codec::undef", default)]
    pub note_id: Option<String>,
    /// Present only on generated occurrences of a repeating task, pointing at
    /// the repeating definition.
    #[serde(with = "codec::undef", default)]
    pub parent_task_id: Option<String>,
}

impl TaskEntity {
    /// A task instance is a generated occurrence of a repeating task.
    pub fn is_instance(&self) -> bool {
        self.parent_task_id.is_some()
    }
}

/// Hydrated view with note, parent task and labels resolved. Derived by the
/// mapping layer, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub is_all_day: bool,
    pub is_completed: bool,
    pub is_announcement: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub repeat: Option<Repeat>,
    pub labels: Vec<Label>,
    pub note: Option<Note>,
    pub parent_task: Option<Box<Task>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub is_all_day: bool,
    #[serde(default)]
    pub is_completed: Option<bool>,
    #[serde(default)]
    pub is_announcement: Option<bool>,
    #[serde(default)]
    pub repeat: Option<Repeat>,
    #[serde(default)]
    pub label_ids: Option<Vec<String>>,
    #[serde(default)]
    pub note_id: Option<String>,
    #[serde(default)]
    pub parent_task_id: Option<String>,
}

/// Update input. Outer `None` leaves a field untouched; for the optional
/// fields, `Some(None)` clears the stored value (persisted through the
/// `"undefined"` convention).
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub is_all_day: Option<bool>,
    pub is_completed: Option<bool>,
    pub is_announcement: Option<bool>,
    pub repeat: Option<Option<Repeat>>,
    pub label_ids: Option<Vec<String>>,
    pub note_id: Option<Option<String>>,
    pub parent_task_id: Option<Option<String>>,
}
