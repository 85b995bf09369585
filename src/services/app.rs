use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinSet;

use crate::dao::{LabelDao, NoteDao, TaskDao};
use crate::error::{Result, StoreError};
use crate::kv::KeyValueStore;
use crate::mapping::Mapper;
use crate::models::Task;
use crate::query::{FilterParams, UNLABELED};
use crate::storage::StorageService;

use super::{LabelService, NoteService, TaskService};

/// Top-level wiring of the storage core: builds the storage service, DAOs,
/// mapper and entity services over one key-value store, and hosts the
/// cross-entity queries.
#[derive(Clone)]
pub struct AppService {
    labels: LabelService,
    notes: NoteService,
    tasks: TaskService,
}

impl AppService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let storage = StorageService::new(store);
        let label_dao = LabelDao::new(storage.clone());
        let note_dao = NoteDao::new(storage.clone());
        let task_dao = TaskDao::new(storage);
        let mapper = Mapper::new(label_dao.clone(), note_dao.clone(), task_dao.clone());

        Self {
            labels: LabelService::new(label_dao),
            notes: NoteService::new(note_dao, mapper.clone()),
            tasks: TaskService::new(task_dao, mapper),
        }
    }

    pub fn labels(&self) -> &LabelService {
        &self.labels
    }

    pub fn notes(&self) -> &NoteService {
        &self.notes
    }

    pub fn tasks(&self) -> &TaskService {
        &self.tasks
    }

    /// Group tasks by label: one filtered task query per label id, issued
    /// concurrently, zipped into a map. With `with_tasks_no_label` an extra
    /// bucket keyed by the `UNLABELED` sentinel collects label-less tasks.
    /// Any failed query fails the whole call; there is no partial result.
    /// Cost is O(labels × tasks) — a manual group-by, acceptable under the
    /// document ceilings.
    pub async fn get_all_tasks_group_by_labels(
        &self,
        params: &FilterParams,
        with_tasks_no_label: bool,
    ) -> Result<HashMap<String, Vec<Task>>> {
        let labels = self.labels.get_all_labels(&FilterParams::default()).await?;

        let mut keys: Vec<String> = labels.into_iter().map(|label| label.id).collect();
        if with_tasks_no_label {
            keys.push(UNLABELED.to_string());
        }

        let mut queries = JoinSet::new();
        for key in keys {
            let tasks = self.tasks.clone();
            let mut scoped = params.clone();
            scoped.label_ids = Some(vec![key.clone()]);
            queries.spawn(async move { (key, tasks.get_all_tasks(&scoped).await) });
        }

        let mut grouped = HashMap::new();
        while let Some(joined) = queries.join_next().await {
            let (key, result) = joined
                .map_err(|err| StoreError::Io(format!("grouped task query failed: {err}")))?;
            grouped.insert(key, result?);
        }
        Ok(grouped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKeyValueStore;
    use crate::models::{NewLabel, NewTask};
    use chrono::{TimeZone, Utc};

    fn app() -> AppService {
        AppService::new(Arc::new(MemoryKeyValueStore::new()))
    }

    fn new_task(title: &str, label_ids: Vec<String>) -> NewTask {
        NewTask {
            title: title.into(),
            start: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
            is_all_day: false,
            is_completed: None,
            is_announcement: None,
            repeat: None,
            label_ids: Some(label_ids),
            note_id: None,
            parent_task_id: None,
        }
    }

    #[tokio::test]
    async fn groups_tasks_per_label_with_an_unlabeled_bucket() {
        let app = app();
        let work = app
            .labels()
            .create_label(NewLabel {
                name: "Work".into(),
                color: Some("blue".into()),
            })
            .await
            .unwrap();
        let home = app
            .labels()
            .create_label(NewLabel {
                name: "Home".into(),
                color: Some("green".into()),
            })
            .await
            .unwrap();

        app.tasks()
            .create_task(new_task("review PR", vec![work.id.clone()]))
            .await
            .unwrap();
        app.tasks()
            .create_task(new_task("mow lawn", vec![home.id.clone()]))
            .await
            .unwrap();
        app.tasks()
            .create_task(new_task("both worlds", vec![work.id.clone(), home.id.clone()]))
            .await
            .unwrap();
        app.tasks()
            .create_task(new_task("floating", vec![]))
            .await
            .unwrap();

        let grouped = app
            .get_all_tasks_group_by_labels(&FilterParams::default(), true)
            .await
            .unwrap();

        assert_eq!(grouped.len(), 3);
        assert_eq!(grouped[&work.id].len(), 2);
        assert_eq!(grouped[&home.id].len(), 2);
        assert_eq!(grouped[UNLABELED].len(), 1);
        assert_eq!(grouped[UNLABELED][0].title, "floating");
    }

    #[tokio::test]
    async fn unlabeled_bucket_is_opt_in() {
        let app = app();
        app.labels()
            .create_label(NewLabel {
                name: "Solo".into(),
                color: None,
            })
            .await
            .unwrap();
        app.tasks()
            .create_task(new_task("floating", vec![]))
            .await
            .unwrap();

        let grouped = app
            .get_all_tasks_group_by_labels(&FilterParams::default(), false)
            .await
            .unwrap();
        assert_eq!(grouped.len(), 1);
        assert!(!grouped.contains_key(UNLABELED));
    }
}
