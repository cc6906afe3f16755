//! Command protocol between request handlers and the catalog manager.
//!
//! Handlers never touch the table or the counters. They hold a
//! [`CatalogHandle`], which turns each operation into a [`Command`] on an
//! unbounded mpsc channel. Operations that produce a result carry a oneshot
//! sender; the manager answers through it exactly once.

use std::time::Duration;

use tokio::{
    sync::{mpsc, oneshot},
    time::timeout,
};

use crate::{error::CatalogError, metrics::CounterSnapshot, record::NewWine};

/// JSON-encoded response body, or the failure to report to the client.
pub type Reply = Result<Vec<u8>, CatalogError>;

pub type ReplySender = oneshot::Sender<Reply>;

/// Messages consumed by the manager task, in channel order.
#[derive(Debug)]
pub enum Command {
    IncrementRequests,
    IncrementSuccesses,
    IncrementErrors,
    GetStatus {
        respond_to: ReplySender,
    },
    GetWines {
        start: Option<String>,
        count: Option<String>,
        respond_to: ReplySender,
    },
    GetWineById {
        id: i64,
        respond_to: ReplySender,
    },
    PutWine {
        wine: NewWine,
        respond_to: ReplySender,
    },
    Snapshot {
        respond_to: oneshot::Sender<CounterSnapshot>,
    },
    Shutdown,
}

/// Cloneable client for the manager task.
///
/// Every call fails fast with [`CatalogError::ManagerUnavailable`] once the
/// manager has stopped, and every call that waits for a reply gives up after
/// the configured reply timeout.
#[derive(Debug, Clone)]
pub struct CatalogHandle {
    command_tx: mpsc::UnboundedSender<Command>,
    reply_timeout: Duration,
}

impl CatalogHandle {
    pub(crate) fn new(command_tx: mpsc::UnboundedSender<Command>, reply_timeout: Duration) -> Self {
        Self {
            command_tx,
            reply_timeout,
        }
    }

    pub fn record_request(&self) -> Result<(), CatalogError> {
        self.send(Command::IncrementRequests)
    }

    pub fn record_success(&self) -> Result<(), CatalogError> {
        self.send(Command::IncrementSuccesses)
    }

    pub fn record_error(&self) -> Result<(), CatalogError> {
        self.send(Command::IncrementErrors)
    }

    pub async fn status(&self) -> Reply {
        self.request(|respond_to| Command::GetStatus { respond_to })
            .await?
    }

    /// Lists wines, optionally restricted to the window `[start, start + count)`.
    ///
    /// The bounds are passed through unparsed; the manager validates them.
    pub async fn wines(&self, start: Option<String>, count: Option<String>) -> Reply {
        self.request(|respond_to| Command::GetWines {
            start,
            count,
            respond_to,
        })
        .await?
    }

    pub async fn wine(&self, id: i64) -> Reply {
        self.request(|respond_to| Command::GetWineById { id, respond_to })
            .await?
    }

    pub async fn put_wine(&self, wine: NewWine) -> Reply {
        self.request(|respond_to| Command::PutWine { wine, respond_to })
            .await?
    }

    pub async fn snapshot(&self) -> Result<CounterSnapshot, CatalogError> {
        self.request(|respond_to| Command::Snapshot { respond_to })
            .await
    }

    /// Asks the manager to stop. Commands queued behind this one are dropped.
    pub fn shutdown(&self) -> Result<(), CatalogError> {
        self.send(Command::Shutdown)
    }

    pub(crate) fn send(&self, command: Command) -> Result<(), CatalogError> {
        self.command_tx
            .send(command)
            .map_err(|_| CatalogError::ManagerUnavailable)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, CatalogError> {
        let (respond_to, response) = oneshot::channel();
        self.send(build(respond_to))?;

        // On timeout the receiver is dropped here, so a late reply is discarded
        // by the manager instead of being delivered to nobody.
        match timeout(self.reply_timeout, response).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => Err(CatalogError::ManagerUnavailable),
            Err(_) => Err(CatalogError::Timeout),
        }
    }
}
