use crate::dao::LabelDao;
use crate::error::Result;
use crate::mapping::label_from_entity;
use crate::models::{Label, LabelPatch, NewLabel};
use crate::query::FilterParams;

#[derive(Clone)]
pub struct LabelService {
    dao: LabelDao,
}

impl LabelService {
    pub fn new(dao: LabelDao) -> Self {
        Self { dao }
    }

    pub async fn create_label(&self, draft: NewLabel) -> Result<Label> {
        Ok(label_from_entity(self.dao.add(draft).await?))
    }

    pub async fn get_label(&self, id: &str) -> Result<Label> {
        Ok(label_from_entity(self.dao.get_by_id(id).await?))
    }

    pub async fn get_all_labels(&self, params: &FilterParams) -> Result<Vec<Label>> {
        let labels = self.dao.get_by_criteria(params).await?;
        Ok(labels.into_iter().map(label_from_entity).collect())
    }

    pub async fn update_label(&self, id: &str, patch: LabelPatch) -> Result<Label> {
        Ok(label_from_entity(self.dao.update_by_id(id, patch).await?))
    }

    pub async fn delete_label(&self, id: &str) -> Result<Label> {
        Ok(label_from_entity(self.dao.delete_by_id(id).await?))
    }
}
