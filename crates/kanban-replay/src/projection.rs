use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Duration;
use tracing::{debug, info};

use kanban_core::{
    CoreError, EntityId, Event, EventHandler, EventPredicate, EventStore, LeadTimeState,
    MessageHub,
};

use crate::player::EventPlayer;

/// Live lead-time statistics for one board.
///
/// Subscribing first replays the board's history from the store, then keeps
/// the state current from events published on the hub.
pub struct LeadTimeProjection {
    board_id: EntityId,
    state: Arc<Mutex<LeadTimeState>>,
    hub: Arc<MessageHub>,
    predicate: EventPredicate,
    handler: EventHandler,
}

fn concerns(board_id: EntityId, event: &Event) -> bool {
    event.originator_id == board_id && LeadTimeState::is_relevant(event)
}

impl LeadTimeProjection {
    pub fn subscribe<S: EventStore + ?Sized>(
        board_id: EntityId,
        player: &EventPlayer<S>,
        hub: Arc<MessageHub>,
    ) -> Result<Self, CoreError> {
        let mut state = LeadTimeState::new();
        let mut primed = 0usize;
        for event in player.stream(Box::new(move |e: &Event| concerns(board_id, e)))? {
            state.apply(&event?)?;
            primed += 1;
        }
        debug!(%board_id, events = primed, "Lead-time projection primed");

        let state = Arc::new(Mutex::new(state));
        let predicate: EventPredicate = Arc::new(move |e: &Event| concerns(board_id, e));
        let sink = state.clone();
        let handler: EventHandler = Arc::new(move |e: &Event| {
            sink.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .apply(e)
                .map_err(CoreError::from)
        });
        hub.subscribe(predicate.clone(), handler.clone());

        Ok(Self {
            board_id,
            state,
            hub,
            predicate,
            handler,
        })
    }

    pub fn board_id(&self) -> EntityId {
        self.board_id
    }

    /// Mean time from scheduling to retirement, or `None` before the first
    /// work item has been retired.
    pub fn average_lead_time(&self) -> Option<Duration> {
        self.state().average_lead_time()
    }

    pub fn lead_times(&self) -> Vec<Duration> {
        self.state().lead_times()
    }

    pub fn lead_time_of(&self, work_item_id: EntityId) -> Option<Duration> {
        self.state().lead_time_of(work_item_id)
    }

    /// Number of work items scheduled but not yet retired or abandoned.
    pub fn in_flight(&self) -> usize {
        self.state().in_flight()
    }

    /// Stop following the hub. The statistics gathered so far stay readable.
    pub fn close(&self) -> bool {
        let removed = self.hub.unsubscribe(&self.predicate, &self.handler);
        if removed {
            info!(board_id = %self.board_id, "Lead-time projection closed");
        }
        removed
    }

    fn state(&self) -> MutexGuard<'_, LeadTimeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for LeadTimeProjection {
    fn drop(&mut self) {
        self.close();
    }
}
