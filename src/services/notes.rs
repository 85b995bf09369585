use crate::dao::NoteDao;
use crate::error::Result;
use crate::mapping::Mapper;
use crate::models::{NewNote, Note, NoteEntity, NotePatch};
use crate::query::FilterParams;

#[derive(Clone)]
pub struct NoteService {
    dao: NoteDao,
    mapper: Mapper,
}

impl NoteService {
    pub fn new(dao: NoteDao, mapper: Mapper) -> Self {
        Self { dao, mapper }
    }

    pub async fn create_note(&self, draft: NewNote) -> Result<NoteEntity> {
        self.dao.add(draft).await
    }

    pub async fn get_note(&self, id: &str) -> Result<Note> {
        let entity = self.dao.get_by_id(id).await?;
        self.mapper.note_from_entity(entity).await
    }

    pub async fn get_all_notes(&self, params: &FilterParams) -> Result<Vec<Note>> {
        let entities = self.dao.get_by_criteria(params).await?;
        let mut notes = Vec::with_capacity(entities.len());
        for entity in entities {
            notes.push(self.mapper.note_from_entity(entity).await?);
        }
        Ok(notes)
    }

    pub async fn update_note(&self, id: &str, patch: NotePatch) -> Result<NoteEntity> {
        self.dao.update_by_id(id, patch).await
    }

    pub async fn delete_note(&self, id: &str) -> Result<NoteEntity> {
        self.dao.delete_by_id(id).await
    }

    pub async fn add_label_to_note(&self, note_id: &str, label_id: &str) -> Result<NoteEntity> {
        self.dao.add_label(note_id, label_id).await
    }
}
