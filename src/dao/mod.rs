//! Per-entity data access: validation, defaults, capacity ceilings, and the
//! in-memory criteria filters layered on the storage scan primitive.

use serde_json::Value;
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::models::EntityKind;
use crate::query::FilterParams;
use crate::storage::StorageService;

mod labels;
mod notes;
mod tasks;

pub use labels::LabelDao;
pub use notes::NoteDao;
pub use tasks::TaskDao;

/// Soft ceiling per entity type, counted over live (non-deleted) documents.
pub const TYPE_CAPACITY: usize = 500;

/// Ids are globally unique tokens, not merely unique within a type.
pub(crate) fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Label-membership test shared by note and task criteria queries. A record
/// matches when any of its labels is in the requested set, or when the
/// `UNLABELED` sentinel is requested and the record has no labels.
pub(crate) fn matches_label_filter(label_ids: &[String], requested: &[String]) -> bool {
    let wants_unlabeled = requested
        .iter()
        .any(|id| id.as_str() == crate::query::UNLABELED);
    if wants_unlabeled && label_ids.is_empty() {
        return true;
    }
    requested
        .iter()
        .any(|id| id.as_str() != crate::query::UNLABELED && label_ids.contains(id))
}

/// Count-then-check before an add. Read and write are separate store calls,
/// so two concurrent adds can both pass the check; the application is
/// single-writer in practice.
pub(crate) async fn ensure_type_capacity(
    storage: &StorageService,
    kind: EntityKind,
) -> Result<()> {
    let live = storage
        .get_all_by_type::<Value>(kind, &FilterParams::default())
        .await?
        .len();
    if live >= TYPE_CAPACITY {
        return Err(StoreError::CapacityExceeded(format!(
            "{} {}s exist, ceiling is {TYPE_CAPACITY}",
            live,
            kind.as_str()
        )));
    }
    Ok(())
}
