use chrono::Utc;
use serde_json::{Map, Value};

use crate::codec;
use crate::error::{Result, StoreError};
use crate::models::{EntityKind, NewNote, NoteEntity, NotePatch};
use crate::query::{slug_include, sort_and_page, FilterParams};
use crate::storage::StorageService;

use super::{ensure_type_capacity, generate_id, matches_label_filter};

#[derive(Clone)]
pub struct NoteDao {
    storage: StorageService,
}

impl NoteDao {
    pub fn new(storage: StorageService) -> Self {
        Self { storage }
    }

    pub async fn add(&self, draft: NewNote) -> Result<NoteEntity> {
        if draft.title.trim().is_empty() {
            return Err(StoreError::Validation("note title is required".into()));
        }
        if draft.content.trim().is_empty() {
            return Err(StoreError::Validation("note content is required".into()));
        }
        ensure_type_capacity(&self.storage, EntityKind::Note).await?;

        let entity = NoteEntity {
            id: generate_id(),
            title: draft.title,
            content: draft.content,
            label_ids: draft.label_ids.unwrap_or_default(),
            created_at: Utc::now(),
            updated_at: None,
            is_deleted: false,
        };
        self.storage.add(&entity, EntityKind::Note).await?;
        Ok(entity)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<NoteEntity> {
        self.storage.get_by_id(EntityKind::Note, id).await
    }

    pub async fn get_by_criteria(&self, params: &FilterParams) -> Result<Vec<NoteEntity>> {
        let notes: Vec<NoteEntity> = self
            .storage
            .get_all_by_type(EntityKind::Note, &params.unpaged())
            .await?;

        let filtered = notes
            .into_iter()
            .filter(|note| {
                if let Some(term) = &params.search_term {
                    if !slug_include(&note.title, term) && !slug_include(&note.content, term) {
                        return false;
                    }
                }
                if let Some(requested) = &params.label_ids {
                    if !matches_label_filter(&note.label_ids, requested) {
                        return false;
                    }
                }
                true
            })
            .collect();

        sort_and_page(filtered, params)
    }

    pub async fn update_by_id(&self, id: &str, patch: NotePatch) -> Result<NoteEntity> {
        let mut doc = Map::new();
        if let Some(title) = patch.title {
            if title.trim().is_empty() {
                return Err(StoreError::Validation("note title is required".into()));
            }
            doc.insert("title".to_string(), Value::String(title));
        }
        if let Some(content) = patch.content {
            if content.trim().is_empty() {
                return Err(StoreError::Validation("note content is required".into()));
            }
            doc.insert("content".to_string(), Value::String(content));
        }
        if let Some(label_ids) = patch.label_ids {
            doc.insert("labelIds".to_string(), serde_json::to_value(label_ids)?);
        }
        doc.insert("updatedAt".to_string(), codec::date_value(&Utc::now()));

        self.storage.update_by_id(EntityKind::Note, id, doc).await
    }

    pub async fn delete_by_id(&self, id: &str) -> Result<NoteEntity> {
        self.storage.soft_delete_by_id(EntityKind::Note, id).await
    }

    /// Append a label reference. Read and write are two store calls with no
    /// isolation; concurrent appends can lose one of the labels.
    pub async fn add_label(&self, note_id: &str, label_id: &str) -> Result<NoteEntity> {
        let note = self.get_by_id(note_id).await?;
        let mut label_ids = note.label_ids;
        label_ids.push(label_id.to_string());

        self.update_by_id(
            note_id,
            NotePatch {
                label_ids: Some(label_ids),
                ..Default::default()
            },
        )
        .await
    }
}
