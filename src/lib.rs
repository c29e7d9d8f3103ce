//! Kanban - event-sourced kanban boards.
//!
//! Wires the domain model, a durable event store and the replay layer into
//! one [`App`].

pub mod app;
pub mod config;
pub mod error;
pub mod report;

pub use app::{App, BoardRepository, WorkItemRepository};
pub use config::{Config, ConfigError, StoreBackend};
pub use error::AppError;
