//! The archive collection service, split into focused submodules.
//!
//! `ZipCollector` composes the task registry, the per-task archive jobs and
//! the injected fetch capability into the boundary operations:
//! - [`ingest`] - adding references (single and batch)
//! - [`finalize`] - status polling and archive assembly
//! - [`lifecycle`] - task creation/removal and shutdown

mod finalize;
mod ingest;
mod lifecycle;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::archive::write_archive;
use crate::config::Config;
use crate::error::Result;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::registry::TaskRegistry;
use crate::types::Event;

/// Event channel capacity; slow subscribers miss the oldest events
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Turns fetched `(name, bytes)` entries into archive bytes
type Assembler = fn(&[(String, Vec<u8>)]) -> Result<Vec<u8>>;

/// Collects remote file references into tasks and turns full tasks into ZIP archives
pub struct ZipCollector {
    /// Live tasks and their jobs
    pub(crate) registry: TaskRegistry,
    /// Injected fetch capability (reachability checks and content)
    pub(crate) fetcher: Arc<dyn Fetcher>,
    /// Validated configuration (read-only for the life of the service)
    pub config: Arc<Config>,
    /// Lifecycle event broadcaster
    pub(crate) event_tx: broadcast::Sender<Event>,
    /// Cleared on shutdown; new tasks are refused afterwards
    pub(crate) accepting_new: Arc<AtomicBool>,
    /// Cancelled on shutdown; the API server stops when it fires
    pub(crate) shutdown_token: CancellationToken,
    /// Replacement archive writer, so tests can make assembly fail
    #[cfg(test)]
    pub(crate) assemble: Assembler,
}

impl std::fmt::Debug for ZipCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipCollector")
            .field("registry", &self.registry)
            .field("fetcher", &self.fetcher.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ZipCollector {
    /// Create a collector fetching over HTTP
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use zip_collector::{Config, ZipCollector};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let collector = ZipCollector::new(Config::default())?;
    ///     let id = collector.create_task().await?;
    ///     collector.add_reference(id, "https://example.com/report.pdf").await?;
    ///     Ok(())
    /// }
    /// ```
    pub fn new(config: Config) -> Result<Self> {
        let config = config.validate()?;
        let fetcher = HttpFetcher::new(&config.fetch)?;
        Self::with_fetcher(config, Arc::new(fetcher))
    }

    /// Create a collector with a custom fetch capability
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        let config = config.validate()?;
        let registry = TaskRegistry::new(&config.tasks);
        Ok(Self::from_parts(config, registry, fetcher))
    }

    pub(crate) fn from_parts(
        config: Config,
        registry: TaskRegistry,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        tracing::debug!(
            fetcher = fetcher.name(),
            max_tasks = config.tasks.max_tasks,
            max_files_per_archive = config.tasks.max_files_per_archive,
            "collector initialised"
        );

        Self {
            registry,
            fetcher,
            config: Arc::new(config),
            event_tx,
            accepting_new: Arc::new(AtomicBool::new(true)),
            shutdown_token: CancellationToken::new(),
            #[cfg(test)]
            assemble: write_archive,
        }
    }

    /// Archive writer run on the blocking pool during finalization
    #[cfg(not(test))]
    fn assembler(&self) -> Assembler {
        write_archive
    }

    #[cfg(test)]
    fn assembler(&self) -> Assembler {
        self.assemble
    }

    /// Subscribe to task lifecycle events
    ///
    /// ```no_run
    /// # use zip_collector::{Config, ZipCollector};
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let collector = ZipCollector::new(Config::default())?;
    /// let mut events = collector.subscribe();
    /// tokio::spawn(async move {
    ///     while let Ok(event) = events.recv().await {
    ///         tracing::info!(?event, "task event");
    ///     }
    /// });
    /// # Ok(())
    /// # }
    /// ```
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Number of live tasks
    pub async fn task_count(&self) -> usize {
        self.registry.len().await
    }

    /// Maximum number of tasks alive at once
    pub fn max_tasks(&self) -> usize {
        self.registry.max_tasks()
    }

    /// Spawn the REST API server in a background task
    pub fn spawn_api_server(self: &Arc<Self>) -> tokio::task::JoinHandle<Result<()>> {
        let collector = Arc::clone(self);
        tokio::spawn(async move { crate::api::start_api_server(collector).await })
    }

    pub(crate) fn emit(&self, event: Event) {
        // no subscribers is fine
        let _ = self.event_tx.send(event);
    }
}
