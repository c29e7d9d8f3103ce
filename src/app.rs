use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use kanban_core::{
    Board, Clock, CoreError, DomainContext, EntityId, EventStore, MessageHub, SystemClock,
    WorkItem,
};
use kanban_db::{init_database, JsonlEventStore, RedbEventStore};
use kanban_replay::{
    locate_overdue_work_items, EventPlayer, LeadTimeProjection, PersistenceSubscriber, Repository,
};

use crate::config::{Config, StoreBackend};
use crate::error::AppError;

pub type BoardRepository = Repository<Board, dyn EventStore>;
pub type WorkItemRepository = Repository<WorkItem, dyn EventStore>;

/// One assembled kanban engine: every event a command publishes on the hub
/// is appended to the store, and the repositories read it back.
pub struct App {
    hub: Arc<MessageHub>,
    store: Arc<dyn EventStore>,
    ctx: DomainContext,
    boards: BoardRepository,
    work_items: WorkItemRepository,
    _persistence: PersistenceSubscriber,
}

impl App {
    /// Open the configured store and wire everything to it.
    pub fn open(config: &Config) -> Result<Self, AppError> {
        let store: Arc<dyn EventStore> = match config.backend {
            StoreBackend::Jsonl => Arc::new(JsonlEventStore::open(&config.store_path)?),
            StoreBackend::Redb => Arc::new(RedbEventStore::new(init_database(&config.store_path)?)),
        };
        info!(
            path = %config.store_path.display(),
            backend = ?config.backend,
            "Event store opened"
        );
        Ok(Self::new(store, config.cache_capacity))
    }

    pub fn new(store: Arc<dyn EventStore>, cache_capacity: usize) -> Self {
        Self::with_clock(store, cache_capacity, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(
        store: Arc<dyn EventStore>,
        cache_capacity: usize,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let hub = Arc::new(MessageHub::new());
        let persistence = PersistenceSubscriber::attach(hub.clone(), store.clone());
        Self {
            ctx: DomainContext::with_clock(hub.clone(), clock),
            boards: Repository::with_capacity(store.clone(), cache_capacity),
            work_items: Repository::with_capacity(store.clone(), cache_capacity),
            hub,
            store,
            _persistence: persistence,
        }
    }

    /// Context to pass to aggregate commands.
    pub fn ctx(&self) -> &DomainContext {
        &self.ctx
    }

    pub fn hub(&self) -> &Arc<MessageHub> {
        &self.hub
    }

    pub fn store(&self) -> &Arc<dyn EventStore> {
        &self.store
    }

    pub fn boards(&self) -> &BoardRepository {
        &self.boards
    }

    pub fn work_items(&self) -> &WorkItemRepository {
        &self.work_items
    }

    /// Lead-time statistics for a board, primed from the log and kept live.
    pub fn lead_time_projection(&self, board_id: EntityId) -> Result<LeadTimeProjection, CoreError> {
        let player = EventPlayer::new(self.store.clone());
        LeadTimeProjection::subscribe(board_id, &player, self.hub.clone())
    }

    pub fn overdue_work_items(
        &self,
        board: &Board,
        today: NaiveDate,
    ) -> Result<Vec<Arc<WorkItem>>, CoreError> {
        locate_overdue_work_items(board, &self.work_items, today)
    }
}
