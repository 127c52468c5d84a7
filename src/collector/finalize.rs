//! Status polling and archive finalization.

use futures::stream::{self, StreamExt};
use std::sync::Arc;

use crate::archive::JobPoll;
use crate::error::{Error, Result};
use crate::registry::JobHandle;
use crate::types::{Event, TaskId, TaskStatus};

use super::ZipCollector;

/// Returns a finalizing job to `Full` unless disarmed
///
/// Held for the whole of a finalization, so a poll that is dropped midway
/// (client gone, request cancelled) leaves the task retryable instead of
/// stuck in `Finalizing`.
struct FinalizeGuard {
    id: TaskId,
    handle: Option<JobHandle>,
}

impl FinalizeGuard {
    fn new(id: TaskId, handle: &JobHandle) -> Self {
        Self {
            id,
            handle: Some(Arc::clone(handle)),
        }
    }

    fn disarm(&mut self) {
        self.handle = None;
    }
}

impl Drop for FinalizeGuard {
    fn drop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        tracing::warn!(task_id = %self.id, "finalization abandoned, task is full again");
        match handle.try_lock() {
            Ok(mut job) => job.abort_finalization(),
            Err(_) => {
                // Lock is busy; release it from a task instead of blocking in drop
                if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                    let handle = Arc::clone(&handle);
                    runtime.spawn(async move { handle.lock().await.abort_finalization() });
                }
            }
        }
    }
}

impl ZipCollector {
    /// Report a task's status, assembling its archive once it is full
    ///
    /// While the task is collecting this only returns the status text. The
    /// first poll after the task fills up fetches every entry, writes the
    /// archive, removes the task and returns the archive bytes. Entries whose
    /// fetch fails are left out of the archive without failing the poll.
    ///
    /// # Errors
    ///
    /// - [`Error::TaskNotFound`] for an unknown (or already delivered) task
    /// - [`Error::Finalizing`] when another poll is assembling this task
    /// - [`Error::Assembly`] when the archive cannot be written; the task
    ///   stays full so the poll can be retried
    pub async fn report_status(&self, id: TaskId) -> Result<TaskStatus> {
        let handle = self
            .registry
            .get(id)
            .await
            .ok_or(Error::TaskNotFound(id))?;

        let poll = handle.lock().await.poll();
        match poll {
            JobPoll::Collecting { remaining, message } => {
                Ok(TaskStatus::Collecting { remaining, message })
            }
            JobPoll::AlreadyFinalizing => Err(Error::Finalizing(id)),
            JobPoll::Finalize(pairs) => self.finalize(id, &handle, pairs).await,
        }
    }

    async fn finalize(
        &self,
        id: TaskId,
        handle: &JobHandle,
        pairs: Vec<(String, String)>,
    ) -> Result<TaskStatus> {
        let mut guard = FinalizeGuard::new(id, handle);
        let total = pairs.len();
        tracing::info!(task_id = %id, entries = total, "assembling archive");

        let fetched = self.fetch_entries(id, pairs).await;
        let entries = fetched.len();
        let skipped = total - entries;

        let assemble = self.assembler();
        let assembled = tokio::task::spawn_blocking(move || assemble(&fetched))
            .await
            .map_err(|e| Error::Assembly {
                reason: format!("archive task failed: {e}"),
            })
            .and_then(|result| result);

        let bytes = match assembled {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(task_id = %id, error = %e, "archive assembly failed");
                handle.lock().await.abort_finalization();
                guard.disarm();
                return Err(e);
            }
        };

        tracing::info!(
            task_id = %id,
            entries,
            skipped,
            bytes = bytes.len(),
            "archive ready"
        );
        self.emit(Event::ArchiveReady {
            id,
            entries,
            skipped,
            bytes: bytes.len(),
        });
        self.drop_task(id).await;
        guard.disarm();

        Ok(TaskStatus::Archive(bytes))
    }

    /// Fetch `(name, url)` pairs with bounded concurrency
    ///
    /// Failed fetches are logged and left out. The result is sorted by name.
    async fn fetch_entries(
        &self,
        id: TaskId,
        pairs: Vec<(String, String)>,
    ) -> Vec<(String, Vec<u8>)> {
        let concurrency = self.config.fetch.max_concurrent_fetches.max(1);

        let results: Vec<_> = stream::iter(pairs)
            .map(|(name, url)| {
                let fetcher = Arc::clone(&self.fetcher);
                async move {
                    let result = fetcher.fetch(&url).await;
                    (name, url, result)
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut fetched: Vec<(String, Vec<u8>)> = results
            .into_iter()
            .filter_map(|(name, url, result)| match result {
                Ok(bytes) => Some((name, bytes)),
                Err(e) => {
                    tracing::warn!(
                        task_id = %id,
                        name = %name,
                        url = %url,
                        error = %e,
                        "skipping entry, fetch failed"
                    );
                    None
                }
            })
            .collect();

        fetched.sort_by(|a, b| a.0.cmp(&b.0));
        fetched
    }
}
