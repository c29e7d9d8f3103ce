//! Kanban Replay - rebuilding state from the event log.
//!
//! Repositories and projections read the log through an [`EventPlayer`];
//! the [`PersistenceSubscriber`] is what writes it.

pub mod cache;
pub mod overdue;
pub mod persistence;
pub mod player;
pub mod projection;
pub mod repository;

pub use cache::LruCache;
pub use overdue::{any_overdue_work_items, locate_overdue_work_items};
pub use persistence::PersistenceSubscriber;
pub use player::EventPlayer;
pub use projection::LeadTimeProjection;
pub use repository::{Repository, DEFAULT_CACHE_CAPACITY};
