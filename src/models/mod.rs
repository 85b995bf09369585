//! Persisted entity shapes and their hydrated views.
//!
//! Entities are the flat documents written to the store, with relationships
//! kept as raw id lists. Hydrated views (`Note`, `Task`) are derived at read
//! time by the mapping layer and are never written back.

use serde::{Deserialize, Serialize};

pub mod label;
pub mod note;
pub mod task;

pub use label::{Label, LabelEntity, LabelPatch, NewLabel};
pub use note::{NewNote, Note, NoteEntity, NotePatch};
pub use task::{NewTask, Repeat, RepeatUnit, Task, TaskEntity, TaskPatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Label,
    Note,
    Task,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Label => "label",
            EntityKind::Note => "note",
            EntityKind::Task => "task",
        }
    }

    /// Store key for one document of this kind.
    pub fn key(&self, id: &str) -> String {
        format!("@{}:{}", self.as_str(), id)
    }

    /// Prefix under which every document of this kind lives.
    pub fn prefix(&self) -> String {
        format!("@{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_format_matches_the_store_convention() {
        assert_eq!(EntityKind::Label.key("abc"), "@label:abc");
        assert_eq!(EntityKind::Note.prefix(), "@note");
        assert_eq!(EntityKind::Task.as_str(), "task");
    }
}
