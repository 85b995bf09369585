//! Thin orchestration over the DAOs: run the data access, hydrate on the read
//! path, and surface every outcome as the uniform `Result<T, StoreError>`.
//! Write paths return raw entities; hydration never runs inside a write.

mod app;
mod labels;
mod notes;
mod tasks;

pub use app::AppService;
pub use labels::LabelService;
pub use notes::NoteService;
pub use tasks::TaskService;
