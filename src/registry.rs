//! Task registry: identity allocation and ownership of archive jobs.
//!
//! The registry is the single authority for whether a task exists. Jobs are
//! handed out as shared handles (`Arc<Mutex<ArchiveJob>>`), never copied, so
//! a mutation made through one handle is seen by every other holder.

use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::archive::ArchiveJob;
use crate::config::TaskConfig;
use crate::error::{Error, Result};
use crate::types::TaskId;

/// Size of the space task identities are drawn from
pub const ID_SPACE: u64 = 10_000_000_000;

/// Draws attempted before giving up on a free identity
pub const MAX_ID_ATTEMPTS: usize = 10;

/// Shared handle to a live job; lock it to read or mutate
pub type JobHandle = Arc<Mutex<ArchiveJob>>;

type IdSource = Box<dyn Fn() -> u64 + Send + Sync>;

/// Mapping from task identity to its archive job
pub struct TaskRegistry {
    tasks: RwLock<HashMap<TaskId, JobHandle>>,
    max_tasks: usize,
    job_capacity: usize,
    allowed_extensions: Arc<[String]>,
    id_source: IdSource,
}

impl std::fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRegistry")
            .field("max_tasks", &self.max_tasks)
            .field("job_capacity", &self.job_capacity)
            .field("allowed_extensions", &self.allowed_extensions)
            .finish_non_exhaustive()
    }
}

impl TaskRegistry {
    /// Create a registry drawing identities uniformly from `0..ID_SPACE`
    pub fn new(config: &TaskConfig) -> Self {
        Self::with_id_source(config, || rand::thread_rng().gen_range(0..ID_SPACE))
    }

    /// Create a registry with a custom identity source
    pub fn with_id_source<F>(config: &TaskConfig, id_source: F) -> Self
    where
        F: Fn() -> u64 + Send + Sync + 'static,
    {
        Self {
            tasks: RwLock::new(HashMap::new()),
            max_tasks: config.max_tasks,
            job_capacity: config.max_files_per_archive,
            allowed_extensions: config.allowed_extensions.iter().cloned().collect(),
            id_source: Box::new(id_source),
        }
    }

    /// Global task capacity
    pub fn max_tasks(&self) -> usize {
        self.max_tasks
    }

    /// Allocate an identity and register an empty job under it
    ///
    /// The capacity check, identity draw and insertion all happen under the
    /// write lock.
    ///
    /// # Errors
    ///
    /// - [`Error::TooManyTasks`] when `max_tasks` tasks are already live
    /// - [`Error::IdentityExhausted`] when every draw collided
    pub async fn create(&self) -> Result<TaskId> {
        let mut tasks = self.tasks.write().await;

        if tasks.len() >= self.max_tasks {
            return Err(Error::TooManyTasks {
                max_tasks: self.max_tasks,
            });
        }

        let id = self.allocate_id(&tasks)?;
        let job = ArchiveJob::new(self.job_capacity, Arc::clone(&self.allowed_extensions));
        tasks.insert(id, Arc::new(Mutex::new(job)));

        Ok(id)
    }

    fn allocate_id(&self, tasks: &HashMap<TaskId, JobHandle>) -> Result<TaskId> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = TaskId((self.id_source)());
            if !tasks.contains_key(&id) {
                return Ok(id);
            }
        }
        Err(Error::IdentityExhausted {
            attempts: MAX_ID_ATTEMPTS,
        })
    }

    /// Look up a live job
    pub async fn get(&self, id: TaskId) -> Option<JobHandle> {
        self.tasks.read().await.get(&id).cloned()
    }

    /// Whether `id` names a live task
    pub async fn contains(&self, id: TaskId) -> bool {
        self.tasks.read().await.contains_key(&id)
    }

    /// Remove a task; returns whether it was present
    ///
    /// Removing an absent task is not an error.
    pub async fn remove(&self, id: TaskId) -> bool {
        self.tasks.write().await.remove(&id).is_some()
    }

    /// Number of live tasks
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    /// Whether no task is live
    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}
