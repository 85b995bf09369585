use chrono::Utc;
use serde_json::{Map, Value};

use crate::codec;
use crate::error::{Result, StoreError};
use crate::models::{label::resolve_color, EntityKind, LabelEntity, LabelPatch, NewLabel};
use crate::query::{slug_include, sort_and_page, FilterParams};
use crate::storage::StorageService;

use super::{ensure_type_capacity, generate_id};

#[derive(Clone)]
pub struct LabelDao {
    storage: StorageService,
}

impl LabelDao {
    pub fn new(storage: StorageService) -> Self {
        Self { storage }
    }

    pub async fn add(&self, draft: NewLabel) -> Result<LabelEntity> {
        if draft.name.trim().is_empty() {
            return Err(StoreError::Validation("label name is required".into()));
        }
        ensure_type_capacity(&self.storage, EntityKind::Label).await?;

        let entity = LabelEntity {
            id: generate_id(),
            name: draft.name,
            color: resolve_color(draft.color.as_deref()),
            created_at: Utc::now(),
            updated_at: None,
            is_deleted: false,
        };
        self.storage.add(&entity, EntityKind::Label).await?;
        Ok(entity)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<LabelEntity> {
        self.storage.get_by_id(EntityKind::Label, id).await
    }

    pub async fn get_by_criteria(&self, params: &FilterParams) -> Result<Vec<LabelEntity>> {
        let labels: Vec<LabelEntity> = self
            .storage
            .get_all_by_type(EntityKind::Label, &params.unpaged())
            .await?;

        let filtered = labels
            .into_iter()
            .filter(|label| {
                if let Some(term) = &params.search_term {
                    if !slug_include(&label.name, term) {
                        return false;
                    }
                }
                if let Some(color) = &params.color {
                    if &label.color != color {
                        return false;
                    }
                }
                true
            })
            .collect();

        sort_and_page(filtered, params)
    }

    pub async fn update_by_id(&self, id: &str, patch: LabelPatch) -> Result<LabelEntity> {
        let mut doc = Map::new();
        if let Some(name) = patch.name {
            if name.trim().is_empty() {
                return Err(StoreError::Validation("label name is required".into()));
            }
            doc.insert("name".to_string(), Value::String(name));
        }
        if let Some(color) = patch.color {
            doc.insert(
                "color".to_string(),
                Value::String(resolve_color(Some(color.as_str()))),
            );
        }
        doc.insert("updatedAt".to_string(), codec::date_value(&Utc::now()));

        self.storage.update_by_id(EntityKind::Label, id, doc).await
    }

    pub async fn delete_by_id(&self, id: &str) -> Result<LabelEntity> {
        self.storage.soft_delete_by_id(EntityKind::Label, id).await
    }
}
