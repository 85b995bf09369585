//! Daymark storage core: the local document store and query layer behind the
//! Daymark productivity app (notes, tasks, labels, calendar).
//!
//! Everything persists through an opaque async key-value map. On top of it
//! sit a generic storage service (soft deletion, capacity ceilings, linear
//! scan + sort + paginate), per-entity DAOs (validation, defaults, criteria
//! filters), a mapping layer that hydrates cross-entity references, and thin
//! services the UI calls into. No operation panics across the public
//! boundary; everything returns `Result<T, StoreError>`.

pub mod codec;
pub mod dao;
pub mod error;
pub mod kv;
pub mod mapping;
pub mod models;
pub mod query;
pub mod services;
pub mod storage;

pub use dao::{LabelDao, NoteDao, TaskDao, TYPE_CAPACITY};
pub use error::{Result, StoreError};
pub use kv::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use mapping::Mapper;
pub use models::{
    EntityKind, Label, LabelEntity, LabelPatch, NewLabel, NewNote, NewTask, Note, NoteEntity,
    NotePatch, Repeat, RepeatUnit, Task, TaskEntity, TaskPatch,
};
pub use query::{FilterParams, SortOrder, UNLABELED};
pub use services::{AppService, LabelService, NoteService, TaskService};
pub use storage::{StorageService, GLOBAL_CAPACITY};
