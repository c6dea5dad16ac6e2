//! Asynchronous entry points over the synchronous core.
//!
//! The [`Dispatcher`] runs each operation on tokio's blocking pool and
//! serializes operations per dataset, so callers on an async runtime (or a
//! foreign event loop via the `queue_*` callbacks) never block and never
//! race on the same index. Failures are reported as the core error's
//! display text.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex};

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::Mutex;

use crate::dataset::{Dataset, DATASET_DIR};
use crate::error::{CoreError, CoreResult};
use crate::index::path::absolute;
use crate::index::DepthPolicy;

/// Options for [`Dispatcher::add`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddOptions {
    pub recursive: bool,
}

/// Options for [`Dispatcher::list`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListOptions {
    pub recursive: bool,
    /// Negative means unbounded. Ignored unless `recursive`.
    pub max_recursion_depth: i32,
}

impl From<ListOptions> for DepthPolicy {
    fn from(options: ListOptions) -> Self {
        DepthPolicy::new(options.recursive, options.max_recursion_depth)
    }
}

/// Runs dataset operations off the async threads, one at a time per dataset.
///
/// Cloning is cheap; clones share the per-dataset locks.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

struct Inner {
    handle: Handle,
    locks: StdMutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl Dispatcher {
    /// Creates a dispatcher that spawns work on `handle`.
    pub fn new(handle: Handle) -> Self {
        Self {
            inner: Arc::new(Inner {
                handle,
                locks: StdMutex::new(HashMap::new()),
            }),
        }
    }

    /// Creates a dispatcher on the current runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    /// Initializes a dataset in `directory`; yields the `.strata` path.
    pub async fn init(&self, directory: impl AsRef<Path>) -> Result<String, String> {
        let directory = directory.as_ref();
        self.run(directory, |root| {
            Dataset::init(root).map(|path| path.display().to_string())
        })
        .await
    }

    /// Adds `paths`; yields the added entries as a JSON array.
    pub async fn add(
        &self,
        ddb_path: impl AsRef<Path>,
        paths: Vec<PathBuf>,
        options: AddOptions,
    ) -> Result<serde_json::Value, String> {
        self.run(ddb_path.as_ref(), move |root| {
            let entries = Dataset::open(root)?.add(&paths, options.recursive)?;
            Ok(serde_json::to_value(entries)?)
        })
        .await
    }

    /// Removes `paths`; yields `true` once the removal is committed.
    pub async fn remove(
        &self,
        ddb_path: impl AsRef<Path>,
        paths: Vec<PathBuf>,
    ) -> Result<bool, String> {
        self.run(ddb_path.as_ref(), move |root| {
            Dataset::open(root)?.remove(&paths)?;
            Ok(true)
        })
        .await
    }

    /// Lists `paths`; yields the matched entries as a JSON array.
    pub async fn list(
        &self,
        ddb_path: impl AsRef<Path>,
        paths: Vec<PathBuf>,
        options: ListOptions,
    ) -> Result<serde_json::Value, String> {
        self.run(ddb_path.as_ref(), move |root| {
            let entries = Dataset::open(root)?.list(&paths, options.into())?;
            Ok(serde_json::to_value(entries)?)
        })
        .await
    }

    /// Schedules [`Dispatcher::init`]; `callback` runs exactly once with its result.
    pub fn queue_init<F>(&self, directory: PathBuf, callback: F)
    where
        F: FnOnce(Result<String, String>) + Send + 'static,
    {
        let this = self.clone();
        self.inner
            .handle
            .spawn(async move { callback(this.init(directory).await) });
    }

    /// Schedules [`Dispatcher::add`]; `callback` runs exactly once with its result.
    pub fn queue_add<F>(&self, ddb_path: PathBuf, paths: Vec<PathBuf>, options: AddOptions, callback: F)
    where
        F: FnOnce(Result<serde_json::Value, String>) + Send + 'static,
    {
        let this = self.clone();
        self.inner
            .handle
            .spawn(async move { callback(this.add(ddb_path, paths, options).await) });
    }

    /// Schedules [`Dispatcher::remove`]; `callback` runs exactly once with its result.
    pub fn queue_remove<F>(&self, ddb_path: PathBuf, paths: Vec<PathBuf>, callback: F)
    where
        F: FnOnce(Result<bool, String>) + Send + 'static,
    {
        let this = self.clone();
        self.inner
            .handle
            .spawn(async move { callback(this.remove(ddb_path, paths).await) });
    }

    /// Schedules [`Dispatcher::list`]; `callback` runs exactly once with its result.
    pub fn queue_list<F>(&self, ddb_path: PathBuf, paths: Vec<PathBuf>, options: ListOptions, callback: F)
    where
        F: FnOnce(Result<serde_json::Value, String>) + Send + 'static,
    {
        let this = self.clone();
        self.inner
            .handle
            .spawn(async move { callback(this.list(ddb_path, paths, options).await) });
    }

    async fn run<T, F>(&self, ddb_path: &Path, job: F) -> Result<T, String>
    where
        T: Send + 'static,
        F: FnOnce(&Path) -> CoreResult<T> + Send + 'static,
    {
        let root = dataset_root(ddb_path).map_err(|e| e.to_string())?;
        let guard = self.lock_for(&root).lock_owned().await;

        // The guard moves into the blocking task so the dataset stays locked
        // until the job finishes, even if the caller stops waiting.
        let job_root = root.clone();
        let task = self.inner.handle.spawn_blocking(move || {
            let _guard = guard;
            job(&job_root)
        });
        let outcome = task.await;
        self.release(&root);

        match outcome {
            Ok(result) => result.map_err(|e| {
                tracing::debug!("dispatched job failed: {e}");
                e.to_string()
            }),
            Err(join_err) => Err(format!("dataset job did not complete: {join_err}")),
        }
    }

    fn lock_for(&self, root: &Path) -> Arc<Mutex<()>> {
        let mut locks = self
            .inner
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(locks.entry(root.to_path_buf()).or_default())
    }

    /// Forgets the lock of `root` once no job holds or awaits it.
    fn release(&self, root: &Path) {
        let mut locks = self
            .inner
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if locks
            .get(root)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(root);
        }
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.inner
            .locks
            .lock()
            .map_or_else(|poisoned| poisoned.into_inner().len(), |locks| locks.len())
    }
}

/// Canonical dataset root for either a dataset root or its `.strata`
/// directory. Every alias of a dataset maps to the same root.
fn dataset_root(ddb_path: &Path) -> CoreResult<PathBuf> {
    let path = absolute(ddb_path)?;
    let root = match (path.file_name(), path.parent()) {
        (Some(name), Some(parent)) if name == DATASET_DIR => parent.to_path_buf(),
        _ => path,
    };
    fs::canonicalize(&root).map_err(|e| CoreError::from_io(e, &root))
}
