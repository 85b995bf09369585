use crate::dao::TaskDao;
use crate::error::Result;
use crate::mapping::Mapper;
use crate::models::{NewTask, Task, TaskEntity, TaskPatch};
use crate::query::FilterParams;

#[derive(Clone)]
pub struct TaskService {
    dao: TaskDao,
    mapper: Mapper,
}

impl TaskService {
    pub fn new(dao: TaskDao, mapper: Mapper) -> Self {
        Self { dao, mapper }
    }

    pub async fn create_task(&self, draft: NewTask) -> Result<TaskEntity> {
        self.dao.add(draft).await
    }

    pub async fn get_task(&self, id: &str) -> Result<Task> {
        let entity = self.dao.get_by_id(id).await?;
        self.mapper.task_from_entity(entity).await
    }

    pub async fn get_all_tasks(&self, params: &FilterParams) -> Result<Vec<Task>> {
        let entities = self.dao.get_by_criteria(params).await?;
        let mut tasks = Vec::with_capacity(entities.len());
        for entity in entities {
            tasks.push(self.mapper.task_from_entity(entity).await?);
        }
        Ok(tasks)
    }

    pub async fn update_task(&self, id: &str, patch: TaskPatch) -> Result<TaskEntity> {
        self.dao.update_by_id(id, patch).await
    }

    pub async fn delete_task(&self, id: &str) -> Result<TaskEntity> {
        self.dao.delete_by_id(id).await
    }

    /// Hard-delete a generated occurrence of a repeating task. Fails with
    /// `NotAnInstance` for anything else.
    pub async fn delete_task_instance(&self, id: &str) -> Result<TaskEntity> {
        self.dao.delete_force_instance(id).await
    }

    pub async fn add_label_to_task(&self, task_id: &str, label_id: &str) -> Result<TaskEntity> {
        self.dao.add_label(task_id, label_id).await
    }
}
