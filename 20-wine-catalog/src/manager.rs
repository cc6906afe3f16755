//! The task that owns all mutable catalog state.
//!
//! [`spawn_manager`] moves the [`Catalog`] and the request counters into a
//! single Tokio task and hands back a [`CatalogHandle`]. The task processes
//! one [`Command`] at a time in channel order, so mutations never interleave
//! and every read observes a fully-applied prefix of the writes.
//!
//! The loop ends when it receives [`Command::Shutdown`] or when every handle
//! has been dropped. Once it ends the receiver is gone, so later sends fail
//! immediately and replies still queued are dropped, which wakes their
//! waiters with [`CatalogError::ManagerUnavailable`].

use std::time::Duration;

use chrono::Local;
use serde::Serialize;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    catalog::Catalog,
    command::{CatalogHandle, Command, Reply, ReplySender},
    error::CatalogError,
    metrics::CounterSnapshot,
    record::{NewWine, PutAck, WineList},
};

/// Request counters. Only ever incremented.
#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    requests: u64,
    successes: u64,
    errors: u64,
}

/// Spawns the manager task for `catalog`.
///
/// The returned join handle completes once the loop has exited.
pub fn spawn_manager(catalog: Catalog, reply_timeout: Duration) -> (CatalogHandle, JoinHandle<()>) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let manager = Manager::new(catalog, command_rx);
    let task = tokio::spawn(manager.run());
    (CatalogHandle::new(command_tx, reply_timeout), task)
}

struct Manager {
    catalog: Catalog,
    counters: Counters,
    command_rx: mpsc::UnboundedReceiver<Command>,
}

impl Manager {
    fn new(catalog: Catalog, command_rx: mpsc::UnboundedReceiver<Command>) -> Self {
        Self {
            catalog,
            counters: Counters::default(),
            command_rx,
        }
    }

    async fn run(mut self) {
        info!(
            wines = self.catalog.len(),
            loaded = self.catalog.is_loaded(),
            "catalog manager started"
        );

        while let Some(command) = self.command_rx.recv().await {
            if !self.handle(command) {
                break;
            }
        }

        info!(
            requests = self.counters.requests,
            successes = self.counters.successes,
            errors = self.counters.errors,
            "catalog manager stopped"
        );
    }

    /// Applies one command. Returns `false` when the loop should stop.
    fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::IncrementRequests => self.counters.requests += 1,
            Command::IncrementSuccesses => self.counters.successes += 1,
            Command::IncrementErrors => self.counters.errors += 1,
            Command::GetStatus { respond_to } => {
                debug!("checking status of wine csv load");
                let report = self.catalog.status(Local::now());
                respond(respond_to, encode(&report));
            }
            Command::GetWines {
                start,
                count,
                respond_to,
            } => {
                debug!(?start, ?count, "listing wines");
                let reply = self
                    .catalog
                    .page(start.as_deref(), count.as_deref())
                    .and_then(|wines| encode(&WineList { wines }));
                respond(respond_to, reply);
            }
            Command::GetWineById { id, respond_to } => {
                debug!(id, "looking up wine");
                let reply = self.catalog.get(id).and_then(|wine| encode(&wine));
                respond(respond_to, reply);
            }
            Command::PutWine { wine, respond_to } => {
                self.put(wine);
                respond(respond_to, encode(&PutAck::successful()));
            }
            Command::Snapshot { respond_to } => {
                let snapshot = CounterSnapshot {
                    requests: self.counters.requests,
                    successes: self.counters.successes,
                    errors: self.counters.errors,
                    wines: self.catalog.len(),
                };
                if respond_to.send(snapshot).is_err() {
                    debug!("snapshot requester went away");
                }
            }
            Command::Shutdown => {
                info!("catalog manager shutting down");
                return false;
            }
        }
        true
    }

    fn put(&mut self, wine: NewWine) {
        // Handlers reject empty titles; anything else that gets here is stored as-is.
        if wine.title.is_empty() {
            warn!("appending wine with an empty title");
        }
        let appended = self.catalog.append(wine);
        info!(id = %appended.id, title = %appended.title, "added wine");
    }
}

fn encode<T: Serialize>(value: &T) -> Reply {
    serde_json::to_vec(value).map_err(|err| {
        warn!(error = %err, "failed to encode reply");
        CatalogError::from(err)
    })
}

fn respond(respond_to: ReplySender, reply: Reply) {
    if respond_to.send(reply).is_err() {
        debug!("requester went away before the reply was sent");
    }
}

#[cfg(test)]
mod tests {
    use futures::future::join_all;
    use serde_json::{Value, json};
    use tokio::{sync::oneshot, time::timeout};

    use super::*;
    use crate::record::{Wine, WineSummary};

    const REPLY_TIMEOUT: Duration = Duration::from_secs(1);

    fn seeded(n: usize) -> Catalog {
        let wines = (0..n)
            .map(|i| Wine::from_new(i, NewWine::titled(format!("wine {i}"))))
            .collect();
        Catalog::new(wines, true)
    }

    fn json_of(bytes: Vec<u8>) -> Value {
        serde_json::from_slice(&bytes).expect("reply is json")
    }

    async fn window(catalog: &CatalogHandle, start: &str, count: &str) -> Reply {
        catalog
            .wines(Some(start.to_string()), Some(count.to_string()))
            .await
    }

    #[tokio::test]
    async fn append_then_read_back() {
        let (catalog, _task) = spawn_manager(seeded(3), REPLY_TIMEOUT);

        let page = json_of(window(&catalog, "1", "1").await.unwrap());
        assert_eq!(page, json!({"wines": [{"id": "1", "title": "wine 1"}]}));

        let ack = json_of(catalog.put_wine(NewWine::titled("New")).await.unwrap());
        assert_eq!(ack, json!({"status": "successful put"}));

        let wine = json_of(catalog.wine(3).await.unwrap());
        assert_eq!(wine, json!({"id": "3", "title": "New"}));

        let page = json_of(window(&catalog, "3", "1").await.unwrap());
        assert_eq!(page, json!({"wines": [{"id": "3", "title": "New"}]}));

        assert_eq!(
            window(&catalog, "4", "1").await,
            Err(CatalogError::WindowOutOfRange)
        );
        assert_eq!(
            window(&catalog, "5", "1").await,
            Err(CatalogError::StartOutOfRange)
        );
    }

    #[tokio::test]
    async fn lists_everything_without_a_window() {
        let (catalog, _task) = spawn_manager(seeded(2), REPLY_TIMEOUT);
        let list: WineList = serde_json::from_slice(&catalog.wines(None, None).await.unwrap()).unwrap();
        assert_eq!(
            list.wines,
            vec![
                WineSummary {
                    id: "0".into(),
                    title: "wine 0".into()
                },
                WineSummary {
                    id: "1".into(),
                    title: "wine 1".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn unknown_id_is_not_available() {
        let (catalog, _task) = spawn_manager(seeded(2), REPLY_TIMEOUT);
        assert_eq!(catalog.wine(2).await, Err(CatalogError::IdNotAvailable));
        assert_eq!(catalog.wine(-3).await, Err(CatalogError::IdNotAvailable));
    }

    #[tokio::test]
    async fn concurrent_puts_get_contiguous_ids() {
        let (catalog, _task) = spawn_manager(seeded(3), REPLY_TIMEOUT);

        let puts = (0..50).map(|i| {
            let catalog = catalog.clone();
            tokio::spawn(async move { catalog.put_wine(NewWine::titled(format!("new {i}"))).await })
        });
        for result in join_all(puts).await {
            result.expect("task").expect("put");
        }

        let list: WineList = serde_json::from_slice(&catalog.wines(None, None).await.unwrap()).unwrap();
        assert_eq!(list.wines.len(), 53);
        for (position, wine) in list.wines.iter().enumerate() {
            assert_eq!(wine.id, position.to_string());
        }

        let mut titles: Vec<&str> = list.wines[3..].iter().map(|w| w.title.as_str()).collect();
        titles.sort_unstable();
        titles.dedup();
        assert_eq!(titles.len(), 50);
    }

    #[tokio::test]
    async fn counters_settle_consistently() {
        let (catalog, _task) = spawn_manager(seeded(1), REPLY_TIMEOUT);

        let calls = (0..100).map(|i| {
            let catalog = catalog.clone();
            tokio::spawn(async move {
                catalog.record_request().unwrap();
                let id = if i % 3 == 0 { 5 } else { 0 };
                match catalog.wine(id).await {
                    Ok(_) => catalog.record_success().unwrap(),
                    Err(_) => catalog.record_error().unwrap(),
                }
            })
        });
        join_all(calls).await;

        let snapshot = catalog.snapshot().await.unwrap();
        assert_eq!(snapshot.requests, 100);
        assert_eq!(snapshot.errors, 34);
        assert_eq!(snapshot.successes, 66);
        assert_eq!(snapshot.requests, snapshot.successes + snapshot.errors);
        assert_eq!(snapshot.wines, 1);
    }

    #[tokio::test]
    async fn status_reflects_load_flag_after_writes() {
        let (catalog, _task) = spawn_manager(Catalog::new(Vec::new(), false), REPLY_TIMEOUT);
        catalog.put_wine(NewWine::titled("late")).await.unwrap();

        let status = json_of(catalog.status().await.unwrap());
        assert_eq!(status["status"], "error");
        assert_eq!(status["msg"], "failed to load csv");
        assert!(status["ts"].as_str().is_some_and(|ts| !ts.is_empty()));
    }

    #[tokio::test]
    async fn empty_title_does_not_disturb_ids() {
        let (catalog, _task) = spawn_manager(seeded(1), REPLY_TIMEOUT);
        catalog.put_wine(NewWine::default()).await.unwrap();
        catalog.put_wine(NewWine::titled("next")).await.unwrap();

        let wine = json_of(catalog.wine(2).await.unwrap());
        assert_eq!(wine, json!({"id": "2", "title": "next"}));
    }

    #[tokio::test]
    async fn shutdown_makes_later_calls_fail_fast() {
        let (catalog, task) = spawn_manager(seeded(1), REPLY_TIMEOUT);
        catalog.shutdown().unwrap();
        task.await.unwrap();

        let result = timeout(Duration::from_millis(100), catalog.status())
            .await
            .expect("call must not block");
        assert_eq!(result, Err(CatalogError::ManagerUnavailable));
        assert_eq!(catalog.record_request(), Err(CatalogError::ManagerUnavailable));
    }

    #[tokio::test]
    async fn dropping_every_handle_stops_the_manager() {
        let (catalog, task) = spawn_manager(seeded(1), REPLY_TIMEOUT);
        drop(catalog);
        timeout(Duration::from_secs(1), task)
            .await
            .expect("manager exits")
            .unwrap();
    }

    #[tokio::test]
    async fn unanswered_request_times_out() {
        // A receiver that is never polled stands in for a stuck manager.
        let (command_tx, _command_rx) = mpsc::unbounded_channel();
        let catalog = CatalogHandle::new(command_tx, Duration::from_millis(20));
        assert_eq!(catalog.status().await, Err(CatalogError::Timeout));
    }

    #[tokio::test]
    async fn orphaned_reply_does_not_stop_the_manager() {
        let (catalog, _task) = spawn_manager(seeded(1), REPLY_TIMEOUT);

        let (tx, rx) = oneshot::channel();
        drop(rx);
        catalog.send(Command::GetStatus { respond_to: tx }).unwrap();

        assert!(catalog.status().await.is_ok());
    }
}
