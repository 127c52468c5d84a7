//! Adding references to a task.

use crate::error::{Error, Result, ToHttpStatus};
use crate::types::{AddReport, AddedReference, Event, RejectedReference, TaskId};

use super::ZipCollector;

impl ZipCollector {
    /// Add one URL to a task
    ///
    /// The reference is validated against the task first (capacity, name,
    /// extension), then checked for reachability with the fetch capability,
    /// and only then stored. Storing re-checks capacity under the job lock,
    /// so concurrent additions can never overfill a task.
    ///
    /// # Errors
    ///
    /// - [`Error::TaskNotFound`] for an unknown task
    /// - [`Error::ArchiveFull`] when the task holds its maximum
    /// - [`Error::InvalidUrl`], [`Error::MalformedName`],
    ///   [`Error::ExtensionNotAllowed`] for unusable URLs
    /// - [`Error::Fetch`] when the URL is unreachable
    pub async fn add_reference(&self, id: TaskId, url: &str) -> Result<AddedReference> {
        let url = url.trim();

        let handle = self
            .registry
            .get(id)
            .await
            .ok_or(Error::TaskNotFound(id))?;
        handle.lock().await.check_reference(url)?;

        self.fetcher.probe(url).await?;

        // The task may have been dropped or finalized while probing.
        let handle = self
            .registry
            .get(id)
            .await
            .ok_or(Error::TaskNotFound(id))?;
        let (name, remaining) = {
            let mut job = handle.lock().await;
            let name = job.add_reference(url)?;
            (name, job.remaining())
        };

        tracing::debug!(task_id = %id, url = %url, name = %name, remaining, "reference added");
        self.emit(Event::ReferenceAdded {
            id,
            name: name.clone(),
            url: url.to_string(),
        });

        Ok(AddedReference {
            url: url.to_string(),
            name,
            remaining,
        })
    }

    /// Add several URLs to a task, in order
    ///
    /// Blank entries are skipped. A failure on one URL does not stop the
    /// others; it is reported in [`AddReport::rejected`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::TaskNotFound`] if the task does not exist when the
    /// batch starts.
    pub async fn add_references<I, S>(&self, id: TaskId, urls: I) -> Result<AddReport>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if !self.registry.contains(id).await {
            return Err(Error::TaskNotFound(id));
        }

        let mut report = AddReport::default();
        for url in urls {
            let url = url.as_ref().trim();
            if url.is_empty() {
                continue;
            }

            match self.add_reference(id, url).await {
                Ok(added) => report.added.push(added),
                Err(e) => {
                    tracing::warn!(task_id = %id, url = %url, error = %e, "reference rejected");
                    report.rejected.push(RejectedReference {
                        url: url.to_string(),
                        code: e.error_code().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }
}
