//! HTTP wine catalog backed by a single-owner state task.
//!
//! The service loads a CSV file of wine reviews once at startup and then
//! serves read and append requests against the in-memory table. All mutable
//! state (the table, the load status, and the request counters) lives inside
//! one Tokio task. Everything else talks to it by sending commands over an
//! mpsc channel and awaiting a oneshot reply, so there are no locks anywhere.
//!
//! - [`cli`] parses the command-line interface into a [`cli::CatalogConfig`].
//! - [`loader`] reads the CSV file into the initial table.
//! - [`record`] defines the wine record and its JSON projections.
//! - [`catalog`] holds the table and implements pagination, lookup and append.
//! - [`command`] is the command protocol plus the cloneable [`command::CatalogHandle`].
//! - [`error`] is the client-facing error type and its HTTP mapping.
//! - [`manager`] runs the task that owns the catalog and the counters.
//! - [`routes`] maps HTTP requests onto commands.
//! - [`metrics`] periodically logs counter deltas.
//! - [`server`] binds the router to a listener with graceful shutdown.

pub mod catalog;
pub mod cli;
pub mod command;
pub mod error;
pub mod loader;
pub mod manager;
pub mod metrics;
pub mod record;
pub mod routes;
pub mod server;
