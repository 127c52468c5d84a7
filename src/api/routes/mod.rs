//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`tasks`] - Task creation, reference submission, status and removal
//! - [`system`] - Health, events, OpenAPI

use serde::{Deserialize, Serialize};

use crate::types::TaskId;

mod system;
mod tasks;

pub use system::*;
pub use tasks::*;

// ============================================================================
// Query/Response Types (shared across handlers)
// ============================================================================

/// Query parameters naming a task
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct TaskQuery {
    /// Task ID
    #[schema(value_type = u64)]
    pub id: TaskId,
}

/// Query parameters for POST /api/zip/add
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct AddQuery {
    /// Task ID
    #[schema(value_type = u64)]
    pub id: TaskId,
    /// One URL, or several separated by commas
    pub url: String,
}

/// Response for POST /api/zip
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CreateTaskResponse {
    /// Identity of the new task
    #[schema(value_type = u64)]
    pub id: TaskId,
}

/// Response for GET /api/zip/status while the task is collecting
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct StatusResponse {
    /// Task ID
    #[schema(value_type = u64)]
    pub id: TaskId,
    /// References that can still be added
    pub remaining: usize,
    /// Status text, `remaining capacity = N`
    pub message: String,
}

/// Response for GET /health
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    /// Always `ok`
    pub status: String,
    /// Number of live tasks
    pub tasks: usize,
    /// Maximum number of live tasks
    pub max_tasks: usize,
    /// Crate version
    pub version: String,
}
