//! End-to-end scenarios over the full service stack.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use daymark_core::{
    AppService, EntityKind, FileKeyValueStore, FilterParams, KeyValueStore, MemoryKeyValueStore,
    NewLabel, NewNote, NewTask, StorageService, StoreError, GLOBAL_CAPACITY,
};

fn app() -> AppService {
    AppService::new(Arc::new(MemoryKeyValueStore::new()))
}

fn new_task(title: &str) -> NewTask {
    NewTask {
        title: title.into(),
        start: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
        end: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
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
async fn note_hydration_and_dangling_label_failure() {
    let app = app();

    let work = app
        .labels()
        .create_label(NewLabel {
            name: "Work".into(),
            color: Some("blue".into()),
        })
        .await
        .unwrap();

    app.notes()
        .create_note(NewNote {
            title: "Standup notes".into(),
            content: "discussed the roadmap".into(),
            label_ids: Some(vec![work.id.clone()]),
        })
        .await
        .unwrap();

    let notes = app
        .notes()
        .get_all_notes(&FilterParams::default())
        .await
        .unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].labels.len(), 1);
    assert_eq!(notes[0].labels[0].id, work.id);
    assert_eq!(notes[0].labels[0].name, "Work");

    // Soft-delete the label: hydration of the referencing note now hard-fails
    // instead of silently dropping the dangling reference.
    app.labels().delete_label(&work.id).await.unwrap();

    let err = app
        .notes()
        .get_all_notes(&FilterParams::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
async fn task_instance_protection_end_to_end() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());
    let app = AppService::new(store.clone());

    let definition = app.tasks().create_task(new_task("water plants")).await.unwrap();

    // A task without a parent is a definition; force delete must refuse and
    // leave the key untouched.
    let before = store
        .get(&EntityKind::Task.key(&definition.id))
        .await
        .unwrap()
        .unwrap();
    let err = app
        .tasks()
        .delete_task_instance(&definition.id)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotAnInstance(_)));
    let after = store
        .get(&EntityKind::Task.key(&definition.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(before, after);

    // A generated occurrence hard-deletes: the key is truly gone, unlike a
    // soft delete.
    let mut occurrence = new_task("water plants (occurrence)");
    occurrence.parent_task_id = Some(definition.id.clone());
    let occurrence = app.tasks().create_task(occurrence).await.unwrap();

    app.tasks()
        .delete_task_instance(&occurrence.id)
        .await
        .unwrap();
    assert!(matches!(
        app.tasks().get_task(&occurrence.id).await.unwrap_err(),
        StoreError::NotFound(_)
    ));
    assert!(store
        .get(&EntityKind::Task.key(&occurrence.id))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn task_hydration_includes_note_and_parent() {
    let app = app();

    let note = app
        .notes()
        .create_note(NewNote {
            title: "Watering schedule".into(),
            content: "every third day".into(),
            label_ids: None,
        })
        .await
        .unwrap();
    let definition = app.tasks().create_task(new_task("water plants")).await.unwrap();

    let mut occurrence = new_task("water plants today");
    occurrence.note_id = Some(note.id.clone());
    occurrence.parent_task_id = Some(definition.id.clone());
    let occurrence = app.tasks().create_task(occurrence).await.unwrap();

    let hydrated = app.tasks().get_task(&occurrence.id).await.unwrap();
    assert_eq!(hydrated.note.as_ref().unwrap().title, "Watering schedule");
    assert_eq!(
        hydrated.parent_task.as_ref().unwrap().title,
        "water plants"
    );
}

#[tokio::test]
async fn global_capacity_ceiling_rejects_writes() {
    let store = Arc::new(MemoryKeyValueStore::new());
    // Fill the store to the ceiling with raw keys; the storage service only
    // counts keys, it does not care what they hold.
    for n in 0..GLOBAL_CAPACITY {
        store.set(&format!("@task:prefill-{n}"), "{}").await.unwrap();
    }

    let app = AppService::new(store);
    let err = app
        .labels()
        .create_label(NewLabel {
            name: "one over".into(),
            color: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::CapacityExceeded(_)));
}

#[tokio::test]
async fn documents_survive_a_store_reopen() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("daymark.json");

    let label_id = {
        let store = FileKeyValueStore::new(path.clone()).unwrap();
        let app = AppService::new(Arc::new(store));
        let label = app
            .labels()
            .create_label(NewLabel {
                name: "Persistent".into(),
                color: Some("purple".into()),
            })
            .await
            .unwrap();
        label.id
    };

    let store = FileKeyValueStore::new(path).unwrap();
    let app = AppService::new(Arc::new(store));
    let label = app.labels().get_label(&label_id).await.unwrap();
    assert_eq!(label.name, "Persistent");
    assert_eq!(label.color, "purple");
}

#[tokio::test]
async fn empty_scan_is_ok_and_empty() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());
    let storage = StorageService::new(store);
    let app_empty: Vec<daymark_core::LabelEntity> = storage
        .get_all_by_type(EntityKind::Label, &FilterParams::default())
        .await
        .unwrap();
    assert!(app_empty.is_empty());
}
