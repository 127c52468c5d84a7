//! # zip-collector
//!
//! Collects remote file URLs into short-lived tasks and hands each task out
//! as a single ZIP archive once it is full.
//!
//! ## How it works
//!
//! - A client creates a task and receives an opaque [`TaskId`]
//! - URLs are added to the task; each one is checked for a usable file name,
//!   a whitelisted extension and reachability before it is stored
//! - Polling the task reports its remaining capacity; the first poll after
//!   the task fills up fetches every file, writes the archive and removes
//!   the task
//!
//! Nothing is persisted. Tasks live in memory until they are delivered or
//! dropped.
//!
//! ## Quick Start
//!
//! ```no_run
//! use zip_collector::{Config, TaskStatus, ZipCollector};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let collector = ZipCollector::new(Config::default())?;
//!
//!     let id = collector.create_task().await?;
//!     for url in [
//!         "https://example.com/a.pdf",
//!         "https://example.com/b.pdf",
//!         "https://example.com/scan.jpeg",
//!     ] {
//!         collector.add_reference(id, url).await?;
//!     }
//!
//!     if let TaskStatus::Archive(bytes) = collector.report_status(id).await? {
//!         std::fs::write("files.zip", bytes)?;
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Archive jobs, entry naming and ZIP writing
pub mod archive;
/// Collection service (decomposed into focused submodules)
pub mod collector;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Remote content fetching
pub mod fetch;
/// Live task registry
pub mod registry;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use archive::ArchiveJob;
pub use collector::ZipCollector;
pub use config::{ApiConfig, Config, FetchConfig, TaskConfig};
pub use error::{ApiError, Error, ErrorDetail, FetchError, Result, ToHttpStatus};
pub use fetch::{Fetcher, HttpFetcher};
pub use registry::TaskRegistry;
pub use types::{
    AddReport, AddedReference, Event, JobState, RejectedReference, TaskId, TaskStatus,
};

/// Helper function to run the collector with graceful signal handling.
///
/// Waits for a termination signal (or a shutdown requested elsewhere) and
/// then calls the collector's `shutdown()` method, which also stops the API
/// server.
///
/// On Unix this listens for SIGTERM and SIGINT, falling back to Ctrl+C if
/// the handlers cannot be registered. Elsewhere it listens for Ctrl+C.
///
/// # Example
///
/// ```no_run
/// use zip_collector::{Config, ZipCollector, run_with_shutdown};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let collector = Arc::new(ZipCollector::new(Config::default())?);
///     let server = collector.spawn_api_server();
///
///     run_with_shutdown(Arc::clone(&collector)).await;
///     server.await??;
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(collector: std::sync::Arc<ZipCollector>) {
    tokio::select! {
        _ = wait_for_signal() => {}
        _ = collector.shutdown_requested() => {}
    }
    collector.shutdown();
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("Received SIGTERM signal"),
                _ = sigint.recv() => tracing::info!("Received SIGINT signal (Ctrl+C)"),
            }
        }
        // Registration can fail in restricted environments (containers)
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register signal handlers, waiting for Ctrl+C");
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C signal"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl+C signal"),
    }
}
