//! Task creation, removal and service shutdown.

use std::sync::atomic::Ordering;

use crate::error::{Error, Result};
use crate::types::{Event, TaskId};

use super::ZipCollector;

impl ZipCollector {
    /// Start a new, empty task
    ///
    /// # Errors
    ///
    /// - [`Error::TooManyTasks`] when the global task capacity is reached
    /// - [`Error::IdentityExhausted`] when no free identity could be drawn
    /// - [`Error::ShuttingDown`] after [`ZipCollector::shutdown`]
    pub async fn create_task(&self) -> Result<TaskId> {
        if !self.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        let id = self.registry.create().await.inspect_err(|e| {
            tracing::warn!(error = %e, "failed to create task");
        })?;

        tracing::info!(task_id = %id, "task created");
        self.emit(Event::TaskCreated { id });
        Ok(id)
    }

    /// Remove a task, discarding whatever it collected
    ///
    /// Idempotent: dropping an unknown or already dropped task does nothing.
    pub async fn drop_task(&self, id: TaskId) {
        if self.registry.remove(id).await {
            tracing::info!(task_id = %id, "task dropped");
            self.emit(Event::TaskDropped { id });
        }
    }

    /// Stop accepting new tasks and signal the API server to stop
    ///
    /// Live tasks are left in place; there is nothing to persist.
    pub fn shutdown(&self) {
        tracing::info!("Initiating graceful shutdown");
        self.accepting_new.store(false, Ordering::SeqCst);
        self.shutdown_token.cancel();
    }

    /// Whether new tasks are accepted
    pub fn is_accepting(&self) -> bool {
        self.accepting_new.load(Ordering::SeqCst)
    }

    /// Resolves once [`ZipCollector::shutdown`] has been called
    pub async fn shutdown_requested(&self) {
        self.shutdown_token.cancelled().await
    }
}
