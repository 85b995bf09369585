//! Hydration of raw entities into their domain views.
//!
//! Foreign keys (`labelIds`, `noteId`, `parentTaskId`) are resolved through
//! further DAO reads. Resolution is all-or-nothing: a dangling reference
//! (deleted or missing target) fails the whole hydration rather than being
//! silently dropped. Runs only on the read path; write paths return entities.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;

use crate::dao::{LabelDao, NoteDao, TaskDao};
use crate::error::{Result, StoreError};
use crate::models::{Label, LabelEntity, Note, NoteEntity, Task, TaskEntity};

/// Labels have no references to resolve.
pub fn label_from_entity(entity: LabelEntity) -> Label {
    entity
}

#[derive(Clone)]
pub struct Mapper {
    labels: LabelDao,
    notes: NoteDao,
    tasks: TaskDao,
}

impl Mapper {
    pub fn new(labels: LabelDao, notes: NoteDao, tasks: TaskDao) -> Self {
        Self {
            labels,
            notes,
            tasks,
        }
    }

    pub async fn note_from_entity(&self, entity: NoteEntity) -> Result<Note> {
        let labels = self.resolve_labels(&entity.label_ids).await?;
        Ok(Note {
            id: entity.id,
            title: entity.title,
            content: entity.content,
            labels,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
            is_deleted: entity.is_deleted,
        })
    }

    pub async fn task_from_entity(&self, entity: TaskEntity) -> Result<Task> {
        let mut seen = HashSet::new();
        self.task_with_ancestry(entity, &mut seen).await
    }

    /// Recursive hydration along `parentTaskId`. Legitimately the ancestry is
    /// at most one level deep (instance → definition); the visited set turns
    /// a corrupted cycle into an error instead of unbounded recursion.
    fn task_with_ancestry<'a>(
        &'a self,
        entity: TaskEntity,
        seen: &'a mut HashSet<String>,
    ) -> Pin<Box<dyn Future<Output = Result<Task>> + Send + 'a>> {
        Box::pin(async move {
            if !seen.insert(entity.id.clone()) {
                return Err(StoreError::Validation(format!(
                    "task {} appears in its own ancestry",
                    entity.id
                )));
            }

            let note = match &entity.note_id {
                Some(note_id) => {
                    let note = self.notes.get_by_id(note_id).await?;
                    Some(self.note_from_entity(note).await?)
                }
                None => None,
            };

            let parent_task = match &entity.parent_task_id {
                Some(parent_id) => {
                    let parent = self.tasks.get_by_id(parent_id).await?;
                    Some(Box::new(self.task_with_ancestry(parent, seen).await?))
                }
                None => None,
            };

            let labels = self.resolve_labels(&entity.label_ids).await?;

            Ok(Task {
                id: entity.id,
                title: entity.title,
                start: entity.start,
                end: entity.end,
                is_all_day: entity.is_all_day,
                is_completed: entity.is_completed,
                is_announcement: entity.is_announcement,
                is_deleted: entity.is_deleted,
                created_at: entity.created_at,
                updated_at: entity.updated_at,
                completed_at: entity.completed_at,
                repeat: entity.repeat,
                labels,
                note,
                parent_task,
            })
        })
    }

    async fn resolve_labels(&self, label_ids: &[String]) -> Result<Vec<Label>> {
        let mut labels = Vec::with_capacity(label_ids.len());
        for id in label_ids {
            labels.push(self.labels.get_by_id(id).await?);
        }
        Ok(labels)
    }
}
