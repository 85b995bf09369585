use std::collections::HashSet;

use chrono::Utc;
use serde_json::{Map, Value};

use crate::codec;
use crate::error::{Result, StoreError};
use crate::models::{EntityKind, NewTask, Repeat, TaskEntity, TaskPatch};
use crate::query::{slug_include, sort_and_page, FilterParams};
use crate::storage::StorageService;

use super::{ensure_type_capacity, generate_id, matches_label_filter};

fn has_duplicate_labels(ids: &[String]) -> bool {
    let mut seen = HashSet::new();
    ids.iter().any(|id| !seen.insert(id))
}

fn validate_repeat(repeat: &Repeat) -> Result<()> {
    if repeat.value == 0 {
        return Err(StoreError::Validation(
            "repeat value must be greater than zero".into(),
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct TaskDao {
    storage: StorageService,
}

impl TaskDao {
    pub fn new(storage: StorageService) -> Self {
        Self { storage }
    }

    pub async fn add(&self, draft: NewTask) -> Result<TaskEntity> {
        if draft.title.trim().is_empty() {
            return Err(StoreError::Validation("task title is required".into()));
        }
        if draft.start > draft.end {
            return Err(StoreError::Validation(
                "task start must not be after its end".into(),
            ));
        }
        if let Some(repeat) = &draft.repeat {
            validate_repeat(repeat)?;
        }
        let label_ids = draft.label_ids.unwrap_or_default();
        if has_duplicate_labels(&label_ids) {
            return Err(StoreError::Validation(
                "task labels must not contain duplicates".into(),
            ));
        }
        ensure_type_capacity(&self.storage, EntityKind::Task).await?;

        let now = Utc::now();
        let is_completed = draft.is_completed.unwrap_or(false);
        let entity = TaskEntity {
            id: generate_id(),
            title: draft.title,
            start: draft.start,
            end: draft.end,
            is_all_day: draft.is_all_day,
            is_completed,
            is_announcement: draft.is_announcement.unwrap_or(false),
            is_deleted: false,
            created_at: now,
            updated_at: None,
            completed_at: if is_completed { Some(now) } else { None },
            repeat: draft.repeat,
            label_ids,
            note_id: draft.note_id,
            parent_task_id: draft.parent_task_id,
        };
        self.storage.add(&entity, EntityKind::Task).await?;
        Ok(entity)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<TaskEntity> {
        self.storage.get_by_id(EntityKind::Task, id).await
    }

    pub async fn get_by_criteria(&self, params: &FilterParams) -> Result<Vec<TaskEntity>> {
        let tasks: Vec<TaskEntity> = self
            .storage
            .get_all_by_type(EntityKind::Task, &params.unpaged())
            .await?;
        let now = Utc::now();

        let filtered = tasks
            .into_iter()
            .filter(|task| {
                if let Some(term) = &params.search_term {
                    if !slug_include(&task.title, term) {
                        return false;
                    }
                }
                if let Some(requested) = &params.label_ids {
                    if !matches_label_filter(&task.label_ids, requested) {
                        return false;
                    }
                }
                if let Some(note_ids) = &params.note_ids {
                    match &task.note_id {
                        Some(id) if note_ids.contains(id) => {}
                        _ => return false,
                    }
                }
                if let Some(date) = &params.date {
                    // Day granularity: the reference date matches anywhere in
                    // [start's calendar day, end's calendar day].
                    let day = date.date_naive();
                    if day < task.start.date_naive() || day > task.end.date_naive() {
                        return false;
                    }
                }
                if let Some(is_completed) = params.is_completed {
                    if task.is_completed != is_completed {
                        return false;
                    }
                }
                if let Some(is_repeat) = params.is_repeat {
                    if task.repeat.is_some() != is_repeat {
                        return false;
                    }
                }
                if let Some(is_overdue) = params.is_overdue {
                    if (task.end < now) != is_overdue {
                        return false;
                    }
                }
                if let Some(parent_id) = &params.parent_task_id {
                    if task.parent_task_id.as_deref() != Some(parent_id.as_str()) {
                        return false;
                    }
                }
                true
            })
            .collect();

        sort_and_page(filtered, params)
    }

    pub async fn update_by_id(&self, id: &str, patch: TaskPatch) -> Result<TaskEntity> {
        let mut doc = Map::new();
        if let Some(title) = patch.title {
            if title.trim().is_empty() {
                return Err(StoreError::Validation("task title is required".into()));
            }
            doc.insert("title".to_string(), Value::String(title));
        }
        if let (Some(start), Some(end)) = (&patch.start, &patch.end) {
            if start > end {
                return Err(StoreError::Validation(
                    "task start must not be after its end".into(),
                ));
            }
        }
        if let Some(start) = patch.start {
            doc.insert("start".to_string(), codec::date_value(&start));
        }
        if let Some(end) = patch.end {
            doc.insert("end".to_string(), codec::date_value(&end));
        }
        if let Some(is_all_day) = patch.is_all_day {
            doc.insert("isAllDay".to_string(), Value::Bool(is_all_day));
        }
        if let Some(is_completed) = patch.is_completed {
            doc.insert("isCompleted".to_string(), Value::Bool(is_completed));
            // Completion timestamp tracks the flag, mirroring creation.
            let completed_at = if is_completed {
                codec::date_value(&Utc::now())
            } else {
                codec::undefined_value()
            };
            doc.insert("completedAt".to_string(), completed_at);
        }
        if let Some(is_announcement) = patch.is_announcement {
            doc.insert("isAnnouncement".to_string(), Value::Bool(is_announcement));
        }
        if let Some(repeat) = patch.repeat {
            let value = match repeat {
                Some(repeat) => {
                    validate_repeat(&repeat)?;
                    serde_json::to_value(repeat)?
                }
                None => codec::undefined_value(),
            };
            doc.insert("repeat".to_string(), value);
        }
        if let Some(label_ids) = patch.label_ids {
            if has_duplicate_labels(&label_ids) {
                return Err(StoreError::Validation(
                    "task labels must not contain duplicates".into(),
                ));
            }
            doc.insert("labelIds".to_string(), serde_json::to_value(label_ids)?);
        }
        if let Some(note_id) = patch.note_id {
            let value = match note_id {
                Some(id) => Value::String(id),
                None => codec::undefined_value(),
            };
            doc.insert("noteId".to_string(), value);
        }
        if let Some(parent_task_id) = patch.parent_task_id {
            let value = match parent_task_id {
                Some(id) => Value::String(id),
                None => codec::undefined_value(),
            };
            doc.insert("parentTaskId".to_string(), value);
        }
        doc.insert("updatedAt".to_string(), codec::date_value(&Utc::now()));

        self.storage.update_by_id(EntityKind::Task, id, doc).await
    }

    pub async fn delete_by_id(&self, id: &str) -> Result<TaskEntity> {
        self.storage.soft_delete_by_id(EntityKind::Task, id).await
    }

    /// Permanently remove a generated occurrence of a repeating task. The
    /// repeating definition itself (no `parentTaskId`) is protected from
    /// hard deletion.
    pub async fn delete_force_instance(&self, id: &str) -> Result<TaskEntity> {
        let task = self.get_by_id(id).await?;
        if !task.is_instance() {
            return Err(StoreError::NotAnInstance(format!(
                "task {id} has no parent task"
            )));
        }
        self.storage.hard_delete_by_id(EntityKind::Task, id).await
    }

    /// Append a label reference. Read and write are two store calls with no
    /// isolation; concurrent appends can lose one of the labels.
    pub async fn add_label(&self, task_id: &str, label_id: &str) -> Result<TaskEntity> {
        let task = self.get_by_id(task_id).await?;
        let mut label_ids = task.label_ids;
        label_ids.push(label_id.to_string());

        self.update_by_id(
            task_id,
            TaskPatch {
                label_ids: Some(label_ids),
                ..Default::default()
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::{KeyValueStore, MemoryKeyValueStore};
    use crate::models::RepeatUnit;
    use crate::query::UNLABELED;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::sync::Arc;

    fn dao() -> TaskDao {
        TaskDao::new(StorageService::new(Arc::new(MemoryKeyValueStore::new())))
    }

    fn day(d: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, d, hour, 0, 0).unwrap()
    }

    fn draft(title: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> NewTask {
        NewTask {
            title: title.into(),
            start,
            end,
            is_all_day: false,
            is_completed: None,
            is_announcement: None,
            repeat: None,
            label_ids: None,
            note_id: None,
            parent_task_id: None,
        }
    }

    #[tokio::test]
    async fn add_validates_chronology_repeat_and_duplicate_labels() {
        let dao = dao();

        let backwards = draft("t", day(2, 9), day(1, 9));
        assert!(matches!(
            dao.add(backwards).await.unwrap_err(),
            StoreError::Validation(_)
        ));

        let mut zero_repeat = draft("t", day(1, 9), day(1, 10));
        zero_repeat.repeat = Some(Repeat {
            value: 0,
            unit: RepeatUnit::Day,
        });
        assert!(matches!(
            dao.add(zero_repeat).await.unwrap_err(),
            StoreError::Validation(_)
        ));

        let mut duplicated = draft("t", day(1, 9), day(1, 10));
        duplicated.label_ids = Some(vec!["l1".into(), "l1".into()]);
        assert!(matches!(
            dao.add(duplicated).await.unwrap_err(),
            StoreError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn completed_at_tracks_the_completion_flag() {
        let dao = dao();
        let mut done = draft("done", day(1, 9), day(1, 10));
        done.is_completed = Some(true);
        let task = dao.add(done).await.unwrap();
        assert!(task.completed_at.is_some());

        let reopened = dao
            .update_by_id(
                &task.id,
                TaskPatch {
                    is_completed: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!reopened.is_completed);
        assert!(reopened.completed_at.is_none());
    }

    #[tokio::test]
    async fn date_filter_uses_calendar_day_containment() {
        let dao = dao();
        dao.add(draft("spans", day(1, 22), day(3, 2))).await.unwrap();
        dao.add(draft("outside", day(5, 9), day(5, 10))).await.unwrap();

        // Mid-range day matches even though no instant overlaps 14:00.
        let hits = dao
            .get_by_criteria(&FilterParams {
                date: Some(day(2, 14)),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "spans");

        // Boundary days are inclusive.
        for d in [1, 3] {
            let hits = dao
                .get_by_criteria(&FilterParams {
                    date: Some(day(d, 23)),
                    ..Default::default()
                })
                .await
                .unwrap();
            assert_eq!(hits.len(), 1, "day {d}");
        }
    }

    #[tokio::test]
    async fn flag_filters_and_overdue() {
        let dao = dao();
        let past = Utc::now() - Duration::days(2);
        let future = Utc::now() + Duration::days(2);

        dao.add(draft("overdue", past - Duration::hours(1), past))
            .await
            .unwrap();
        let mut repeating = draft("repeating", future, future + Duration::hours(1));
        repeating.repeat = Some(Repeat {
            value: 1,
            unit: RepeatUnit::Week,
        });
        dao.add(repeating).await.unwrap();

        let overdue = dao
            .get_by_criteria(&FilterParams {
                is_overdue: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].title, "overdue");

        let repeats = dao
            .get_by_criteria(&FilterParams {
                is_repeat: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(repeats.len(), 1);
        assert_eq!(repeats[0].title, "repeating");
    }

    #[tokio::test]
    async fn label_sentinel_and_parent_filters() {
        let dao = dao();
        let mut labeled = draft("labeled", day(1, 9), day(1, 10));
        labeled.label_ids = Some(vec!["l1".into()]);
        dao.add(labeled).await.unwrap();

        let parent = dao.add(draft("parent", day(1, 9), day(1, 10))).await.unwrap();
        let mut child = draft("child", day(2, 9), day(2, 10));
        child.parent_task_id = Some(parent.id.clone());
        dao.add(child).await.unwrap();

        let unlabeled = dao
            .get_by_criteria(&FilterParams {
                label_ids: Some(vec![UNLABELED.into()]),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(unlabeled.len(), 2);

        let children = dao
            .get_by_criteria(&FilterParams {
                parent_task_id: Some(parent.id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].title, "child");
    }

    #[tokio::test]
    async fn force_delete_protects_non_instances() {
        let dao = dao();
        let definition = dao.add(draft("definition", day(1, 9), day(1, 10))).await.unwrap();

        let err = dao.delete_force_instance(&definition.id).await.unwrap_err();
        assert!(matches!(err, StoreError::NotAnInstance(_)));
        assert!(dao.get_by_id(&definition.id).await.is_ok());

        let mut occurrence = draft("occurrence", day(2, 9), day(2, 10));
        occurrence.parent_task_id = Some(definition.id.clone());
        let occurrence = dao.add(occurrence).await.unwrap();

        dao.delete_force_instance(&occurrence.id).await.unwrap();
        assert!(matches!(
            dao.get_by_id(&occurrence.id).await.unwrap_err(),
            StoreError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn clearing_optional_fields_persists_the_undefined_marker() {
        let dao = dao();
        let mut task = draft("t", day(1, 9), day(1, 10));
        task.note_id = Some("n1".into());
        task.repeat = Some(Repeat {
            value: 1,
            unit: RepeatUnit::Day,
        });
        let task = dao.add(task).await.unwrap();

        let cleared = dao
            .update_by_id(
                &task.id,
                TaskPatch {
                    note_id: Some(None),
                    repeat: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(cleared.note_id.is_none());
        assert!(cleared.repeat.is_none());

        // The fields are stored with the marker, not dropped.
        let raw = dao
            .storage
            .store()
            .get(&EntityKind::Task.key(&task.id))
            .await
            .unwrap()
            .unwrap();
        assert!(raw.contains("\"noteId\":\"undefined\""));
        assert!(raw.contains("\"repeat\":\"undefined\""));
    }
}
