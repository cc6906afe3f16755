use anyhow::Result;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use wine_catalog::{
    catalog::Catalog, cli::Cli, loader, manager::spawn_manager, metrics, server::Server,
};

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Cli::parse().catalog_config();

    let table = loader::load_table(&config.csv);
    info!("initial count of records: {}", table.wines.len());
    let (catalog, manager_task) = spawn_manager(
        Catalog::new(table.wines, table.loaded),
        config.reply_timeout,
    );

    let reporter = tokio::spawn(metrics::run_reporter(
        catalog.clone(),
        config.metrics_interval,
    ));

    let listener = TcpListener::bind(config.listen).await?;
    let server = Server::new(listener, catalog.clone());
    info!("catalog listening on {}", server.local_addr()?);
    let served = server.run_until_ctrl_c().await;
    if let Err(err) = &served {
        warn!("server exited with error: {err:?}");
    }

    reporter.abort();
    if let Err(err) = catalog.shutdown() {
        warn!(error = %err, "catalog manager already stopped");
    }
    if let Err(err) = manager_task.await {
        warn!(error = ?err, "catalog manager task failed");
    }

    served
}
