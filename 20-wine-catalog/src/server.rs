use std::{future::Future, net::SocketAddr};

use anyhow::Result;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::{command::CatalogHandle, routes};

pub struct Server {
    listener: TcpListener,
    catalog: CatalogHandle,
}

impl Server {
    pub fn new(listener: TcpListener, catalog: CatalogHandle) -> Self {
        Self { listener, catalog }
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves until `shutdown` completes, then drains in-flight requests.
    ///
    /// The catalog manager is left running; stopping it is up to the caller.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Server { listener, catalog } = self;
        axum::serve(listener, routes::app(catalog))
            .with_graceful_shutdown(shutdown)
            .await?;
        info!("http server stopped");
        Ok(())
    }

    pub async fn run_until_ctrl_c(self) -> Result<()> {
        self.run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = ?err, "failed to install ctrl-c handler");
            }
        })
        .await
    }
}
