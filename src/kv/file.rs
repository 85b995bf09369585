//! File-backed key-value store.
//!
//! A dedicated worker thread owns the map and its backing file; callers send
//! closures over an mpsc channel and await the reply on a oneshot. This
//! serializes every store access through a single writer, which is the only
//! concurrency guarantee the layers above assume (single-key atomicity).
//!
//! The whole map is persisted as one JSON object. Writes go through a temp
//! file and rename so readers never observe a partial file.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc, Mutex};
use std::thread::{self, JoinHandle};

use async_trait::async_trait;
use log::{error, info};
use tokio::sync::oneshot;

use super::KeyValueStore;
use crate::error::{Result, StoreError};

struct StoreState {
    entries: HashMap<String, String>,
    path: PathBuf,
}

impl StoreState {
    fn load(path: &Path) -> Result<Self> {
        let entries = if path.exists() {
            let contents = fs::read_to_string(path)?;
            if contents.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str(&contents)
                    .map_err(|err| StoreError::Io(format!("corrupt store file: {err}")))?
            }
        } else {
            HashMap::new()
        };
        Ok(Self {
            entries,
            path: path.to_path_buf(),
        })
    }

    fn flush(&self) -> Result<()> {
        let json = serde_json::to_string(&self.entries)?;
        let temp_path = self.path.with_extension("tmp");
        let mut file = File::create(&temp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

type KvTask = Box<dyn FnOnce(&mut StoreState) + Send + 'static>;

enum KvCommand {
    Execute(KvTask),
    Shutdown,
}

struct FileStoreInner {
    sender: mpsc::Sender<KvCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for FileStoreInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(KvCommand::Shutdown) {
                error!("Failed to send shutdown to store thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("Failed to join store thread: {join_err:?}");
            }
        }
    }
}

#[derive(Clone)]
pub struct FileKeyValueStore {
    inner: Arc<FileStoreInner>,
    path: Arc<PathBuf>,
}

impl FileKeyValueStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                StoreError::Io(format!(
                    "failed to create store directory {}: {err}",
                    parent.display()
                ))
            })?;
        }

        let (command_tx, command_rx) = mpsc::channel::<KvCommand>();
        let (ready_tx, ready_rx) = mpsc::channel();
        let path_for_thread = path.clone();

        let worker = thread::Builder::new()
            .name("daymark-store".into())
            .spawn(move || {
                let mut state = match StoreState::load(&path_for_thread) {
                    Ok(state) => state,
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };

                if ready_tx.send(Ok(())).is_err() {
                    error!("Store initialization receiver dropped before ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        KvCommand::Execute(task) => task(&mut state),
                        KvCommand::Shutdown => break,
                    }
                }

                info!("Store thread shutting down");
            })
            .map_err(|err| StoreError::Io(format!("failed to spawn store worker: {err}")))?;

        ready_rx
            .recv()
            .map_err(|_| StoreError::Io("store worker exited before signaling readiness".into()))??;

        info!("Key-value store initialized at {}", path.display());

        Ok(Self {
            inner: Arc::new(FileStoreInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
            path: Arc::new(path),
        })
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut StoreState) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sender = self.inner.sender.clone();
        let (reply_tx, reply_rx) = oneshot::channel();

        let command = KvCommand::Execute(Box::new(move |state| {
            let result = task(state);
            if reply_tx.send(result).is_err() {
                error!("Store caller dropped before receiving result");
            }
        }));

        sender
            .send(command)
            .map_err(|err| StoreError::Io(format!("failed to send command to store thread: {err}")))?;

        reply_rx
            .await
            .map_err(|_| StoreError::Io("store thread terminated unexpectedly".into()))?
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        self.execute(move |state| Ok(state.entries.get(&key).cloned()))
            .await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let key = key.to_string();
        let value = value.to_string();
        self.execute(move |state| {
            state.entries.insert(key, value);
            state.flush()
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        self.execute(move |state| {
            if state.entries.remove(&key).is_some() {
                state.flush()?;
            }
            Ok(())
        })
        .await
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        let prefix = prefix.to_string();
        self.execute(move |state| {
            Ok(state
                .entries
                .keys()
                .filter(|key| key.starts_with(&prefix))
                .cloned()
                .collect())
        })
        .await
    }

    async fn multi_get(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        let keys = keys.to_vec();
        self.execute(move |state| {
            Ok(keys
                .iter()
                .map(|key| state.entries.get(key).cloned())
                .collect())
        })
        .await
    }

    async fn multi_remove(&self, keys: &[String]) -> Result<()> {
        let keys = keys.to_vec();
        self.execute(move |state| {
            let mut changed = false;
            for key in &keys {
                changed |= state.entries.remove(key).is_some();
            }
            if changed {
                state.flush()?;
            }
            Ok(())
        })
        .await
    }
}
