use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use zip_collector::{Config, ZipCollector, run_with_shutdown};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("zip_collector=info,tower_http=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();
}

#[tokio::main]
async fn main() -> zip_collector::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env()?;
    tracing::info!(
        address = %config.api.bind_address(),
        max_tasks = config.tasks.max_tasks,
        max_files_per_archive = config.tasks.max_files_per_archive,
        allowed_extensions = ?config.tasks.allowed_extensions,
        "configuration loaded"
    );

    let collector = Arc::new(ZipCollector::new(config)?);
    let mut server = collector.spawn_api_server();

    tokio::select! {
        _ = run_with_shutdown(Arc::clone(&collector)) => {
            server_result(server.await)?;
        }
        // Server exited on its own, e.g. the address was taken
        result = &mut server => {
            collector.shutdown();
            server_result(result)?;
        }
    }

    tracing::info!(tasks = collector.task_count().await, "shut down");
    Ok(())
}

fn server_result(
    joined: Result<zip_collector::Result<()>, tokio::task::JoinError>,
) -> zip_collector::Result<()> {
    joined.map_err(|e| zip_collector::Error::ApiServerError(e.to_string()))?
}
