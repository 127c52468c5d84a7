//! Per-task archive jobs.
//!
//! An [`ArchiveJob`] accumulates named remote references up to its capacity
//! and walks the `Collecting → Full → Finalizing` state machine. It performs
//! no I/O itself: reachability checks and content fetching happen in the
//! service, and [`writer::write_archive`] turns fetched content into bytes.
//!
//! Jobs are only ever reached through the registry's shared, lock-protected
//! handle, so every method here runs under the per-job lock.

pub mod naming;
pub mod writer;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::JobState;

pub use naming::CandidateName;
pub use writer::write_archive;

/// What a status poll should do next, decided under the job lock
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobPoll {
    /// Still collecting; report the status text
    Collecting {
        /// References that can still be added
        remaining: usize,
        /// Status text
        message: String,
    },
    /// The job was full and is now finalizing; fetch these `(name, url)` pairs
    Finalize(Vec<(String, String)>),
    /// Another poll is already finalizing this job
    AlreadyFinalizing,
}

/// One task's accumulated set of references
#[derive(Debug)]
pub struct ArchiveJob {
    /// Final in-archive name -> source URL
    entries: BTreeMap<String, String>,
    capacity: usize,
    allowed_extensions: Arc<[String]>,
    status_message: String,
    state: JobState,
}

impl ArchiveJob {
    /// Create an empty job
    pub fn new(capacity: usize, allowed_extensions: Arc<[String]>) -> Self {
        Self {
            entries: BTreeMap::new(),
            capacity,
            allowed_extensions,
            status_message: status_text(capacity),
            state: JobState::Collecting,
        }
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries are stored yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries that can still be added
    pub fn remaining(&self) -> usize {
        self.capacity.saturating_sub(self.entries.len())
    }

    /// Current lifecycle state
    pub fn state(&self) -> JobState {
        self.state
    }

    /// Human-readable remaining-capacity text
    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    /// Stored `name -> url` pairs
    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    /// Validate `url` against capacity, naming and the extension whitelist
    /// without storing it
    ///
    /// Lets the caller reject a reference before paying for a network
    /// round-trip. [`ArchiveJob::add_reference`] repeats every check.
    pub fn check_reference(&self, url: &str) -> Result<CandidateName> {
        if self.state != JobState::Collecting || self.entries.len() >= self.capacity {
            return Err(Error::ArchiveFull {
                capacity: self.capacity,
            });
        }

        let candidate = naming::candidate_name(url)?;
        if !self
            .allowed_extensions
            .iter()
            .any(|allowed| *allowed == candidate.extension)
        {
            return Err(Error::ExtensionNotAllowed {
                extension: candidate.extension,
            });
        }

        Ok(candidate)
    }

    /// Store `url`, returning the entry name it was stored under
    ///
    /// Capacity check, naming, collision resolution and insertion happen as
    /// one step; the caller holds the job lock for its duration.
    ///
    /// # Errors
    ///
    /// - [`Error::ArchiveFull`] when the job already holds `capacity` entries
    /// - [`Error::InvalidUrl`] / [`Error::MalformedName`] for unusable URLs
    /// - [`Error::ExtensionNotAllowed`] when the extension is not whitelisted
    pub fn add_reference(&mut self, url: &str) -> Result<String> {
        let candidate = self.check_reference(url)?;

        let count = self.entries.len();
        let name = naming::resolve_collision(&candidate, count, |n| self.entries.contains_key(n));
        if name != candidate.file_name() {
            tracing::debug!(
                original = %candidate.file_name(),
                renamed = %name,
                "entry name collision, renamed"
            );
        }

        self.entries.insert(name.clone(), url.to_string());
        self.status_message = status_text(self.remaining());
        if self.entries.len() == self.capacity {
            self.state = JobState::Full;
        }

        Ok(name)
    }

    /// Decide what a status poll does, moving `Full` to `Finalizing`
    ///
    /// The check and the transition happen together, so only one poll ever
    /// receives [`JobPoll::Finalize`] for a given full job.
    pub fn poll(&mut self) -> JobPoll {
        match self.state {
            JobState::Collecting => JobPoll::Collecting {
                remaining: self.remaining(),
                message: self.status_message.clone(),
            },
            JobState::Full => {
                self.state = JobState::Finalizing;
                JobPoll::Finalize(
                    self.entries
                        .iter()
                        .map(|(name, url)| (name.clone(), url.clone()))
                        .collect(),
                )
            }
            JobState::Finalizing => JobPoll::AlreadyFinalizing,
        }
    }

    /// Return a finalizing job to `Full` after a failed assembly
    pub fn abort_finalization(&mut self) {
        if self.state == JobState::Finalizing {
            self.state = JobState::Full;
        }
    }
}

fn status_text(remaining: usize) -> String {
    format!("remaining capacity = {remaining}")
}
