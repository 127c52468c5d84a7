//! Error types for zip-collector
//!
//! This module provides error handling for the library, including:
//! - The task/archive error taxonomy (capacity, not found, validation, fetch, assembly)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::types::TaskId;

/// Result type alias for zip-collector operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for zip-collector
///
/// No variant is retried by the library; retry policy belongs to the caller.
#[derive(Debug, Error)]
pub enum Error {
    /// The registry already holds the maximum number of live tasks
    #[error("server is busy: {max_tasks} tasks already in progress")]
    TooManyTasks {
        /// Configured global task capacity
        max_tasks: usize,
    },

    /// The task already holds as many references as it can
    #[error("reached limit of {capacity} files in zip archive")]
    ArchiveFull {
        /// Per-task capacity
        capacity: usize,
    },

    /// Every identity drawn for a new task collided with a live one
    #[error("failed to allocate a task id after {attempts} attempts")]
    IdentityExhausted {
        /// Number of draws attempted
        attempts: usize,
    },

    /// Unknown task identity
    #[error("task {0} not found")]
    TaskNotFound(TaskId),

    /// URL could not be parsed or has no usable path
    #[error("invalid url {url}: {reason}")]
    InvalidUrl {
        /// The submitted URL
        url: String,
        /// Why the URL was refused
        reason: String,
    },

    /// The URL's final path segment cannot be used as a file name
    #[error("malformed file name in url {url}")]
    MalformedName {
        /// The submitted URL
        url: String,
    },

    /// The derived file extension is not on the whitelist
    #[error("extension not allowed: {extension}")]
    ExtensionNotAllowed {
        /// The extension derived from the URL
        extension: String,
    },

    /// Fetching remote content failed
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Writing the archive container failed
    #[error("failed to assemble archive: {reason}")]
    Assembly {
        /// The underlying encoder error
        reason: String,
    },

    /// Another status poll is already assembling this task's archive
    #[error("task {0} is already being finalized")]
    Finalizing(TaskId),

    /// Shutdown in progress - not accepting new tasks
    #[error("shutdown in progress: not accepting new tasks")]
    ShuttingDown,

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "MAX_TASKS")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),
}

/// Errors from the injected fetch capability
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Request could not be sent or the connection failed
    #[error("request to {url} failed: {reason}")]
    Request {
        /// Requested URL
        url: String,
        /// Transport error message
        reason: String,
    },

    /// The request exceeded the configured timeout
    #[error("request to {url} timed out after {secs}s")]
    Timeout {
        /// Requested URL
        url: String,
        /// Timeout in seconds
        secs: u64,
    },

    /// Remote answered with a non-success status
    #[error("bad status code {status} from {url}")]
    Status {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// Response body could not be read
    #[error("failed to read body from {url}: {reason}")]
    Body {
        /// Requested URL
        url: String,
        /// Read error message
        reason: String,
    },
}

impl FetchError {
    /// URL the failed fetch was made against
    pub fn url(&self) -> &str {
        match self {
            FetchError::Request { url, .. }
            | FetchError::Timeout { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::Body { url, .. } => url,
        }
    }
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "task_not_found",
///     "message": "task 123 not found",
///     "details": {
///       "task_id": 123
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "task_not_found", "archive_full")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - rejected input
            Error::InvalidUrl { .. } => 400,
            Error::MalformedName { .. } => 400,
            Error::ExtensionNotAllowed { .. } => 400,
            Error::Config { .. } => 400,

            // 404 Not Found
            Error::TaskNotFound(_) => 404,

            // 409 Conflict - task is not in a state that accepts the operation
            Error::ArchiveFull { .. } => 409,
            Error::Finalizing(_) => 409,

            // 500 Internal Server Error
            Error::Assembly { .. } => 500,
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,

            // 502 Bad Gateway - remote file unreachable
            Error::Fetch(_) => 502,

            // 503 Service Unavailable - retry later
            Error::TooManyTasks { .. } => 503,
            Error::IdentityExhausted { .. } => 503,
            Error::ShuttingDown => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::TooManyTasks { .. } => "too_many_tasks",
            Error::ArchiveFull { .. } => "archive_full",
            Error::IdentityExhausted { .. } => "identity_exhausted",
            Error::TaskNotFound(_) => "task_not_found",
            Error::InvalidUrl { .. } => "invalid_url",
            Error::MalformedName { .. } => "malformed_name",
            Error::ExtensionNotAllowed { .. } => "extension_not_allowed",
            Error::Fetch(_) => "fetch_failed",
            Error::Assembly { .. } => "assembly_failed",
            Error::Finalizing(_) => "finalizing",
            Error::ShuttingDown => "shutting_down",
            Error::Config { .. } => "config_error",
            Error::Io(_) => "io_error",
            Error::ApiServerError(_) => "api_server_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::TaskNotFound(id) | Error::Finalizing(id) => Some(serde_json::json!({
                "task_id": id,
            })),
            Error::TooManyTasks { max_tasks } => Some(serde_json::json!({
                "max_tasks": max_tasks,
            })),
            Error::ArchiveFull { capacity } => Some(serde_json::json!({
                "capacity": capacity,
            })),
            Error::ExtensionNotAllowed { extension } => Some(serde_json::json!({
                "extension": extension,
            })),
            Error::InvalidUrl { url, .. } | Error::MalformedName { url } => {
                Some(serde_json::json!({
                    "url": url,
                }))
            }
            Error::Fetch(FetchError::Status { url, status }) => Some(serde_json::json!({
                "url": url,
                "upstream_status": status,
            })),
            Error::Fetch(e) => Some(serde_json::json!({
                "url": e.url(),
            })),
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
