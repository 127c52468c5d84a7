//! Core types for zip-collector

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Opaque identifier for a collection task
///
/// Drawn at random from a sparse space, so it carries no information about
/// creation order or how many tasks exist. Only meaningful while the task is
/// live in the registry.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl TaskId {
    /// Get the inner u64 value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for TaskId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<TaskId> for u64 {
    fn from(id: TaskId) -> Self {
        id.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Lifecycle state of an archive job
///
/// `Finalized` has no variant: a finalized job no longer exists in the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Accepting references (`len(entries) < capacity`)
    Collecting,
    /// Capacity reached, next status poll assembles the archive
    Full,
    /// A status poll is currently fetching and assembling the archive
    Finalizing,
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobState::Collecting => "collecting",
            JobState::Full => "full",
            JobState::Finalizing => "finalizing",
        };
        f.write_str(s)
    }
}

/// Result of polling a task's status
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskStatus {
    /// Task is still collecting references
    Collecting {
        /// Number of references that can still be added
        remaining: usize,
        /// Human-readable status text (`remaining capacity = N`)
        message: String,
    },
    /// Task was full and has been turned into an archive; the task is gone
    Archive(Vec<u8>),
}

impl TaskStatus {
    /// Whether this status carries the finished archive
    pub fn is_archive(&self) -> bool {
        matches!(self, TaskStatus::Archive(_))
    }
}

/// A reference accepted into a task
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AddedReference {
    /// Source URL as submitted
    pub url: String,
    /// Name of the entry inside the archive (after collision renaming)
    pub name: String,
    /// Remaining capacity after this insertion
    pub remaining: usize,
}

/// A reference that was refused, with the reason
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RejectedReference {
    /// Source URL as submitted
    pub url: String,
    /// Machine-readable error code (same codes as API errors)
    pub code: String,
    /// Human-readable reason
    pub message: String,
}

/// Outcome of submitting several URLs to one task
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AddReport {
    /// References that were stored
    pub added: Vec<AddedReference>,
    /// References that were refused
    pub rejected: Vec<RejectedReference>,
}

impl AddReport {
    /// True when every submitted URL was stored
    pub fn all_added(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Event emitted during a task's lifecycle
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A new task was allocated
    TaskCreated {
        /// Task ID
        id: TaskId,
    },

    /// A reference was stored in a task
    ReferenceAdded {
        /// Task ID
        id: TaskId,
        /// Entry name inside the archive
        name: String,
        /// Source URL
        url: String,
    },

    /// A task's archive was assembled and handed out
    ArchiveReady {
        /// Task ID
        id: TaskId,
        /// Number of entries written to the archive
        entries: usize,
        /// Number of entries skipped because their fetch failed
        skipped: usize,
        /// Size of the archive in bytes
        bytes: usize,
    },

    /// A task was removed from the registry
    TaskDropped {
        /// Task ID
        id: TaskId,
    },
}
