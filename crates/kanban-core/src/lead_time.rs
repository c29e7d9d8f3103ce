use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::error::ConsistencyError;
use crate::event::{BoardEvent, Event, Payload};
use crate::id::EntityId;

/// Lead-time bookkeeping for one board: when each in-flight work item was
/// scheduled, and how long each retired work item took.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadTimeState {
    in_flight: HashMap<EntityId, DateTime<Utc>>,
    completed: HashMap<EntityId, Duration>,
}

impl LeadTimeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an event can change lead-time state.
    pub fn is_relevant(event: &Event) -> bool {
        matches!(
            event.payload,
            Payload::Board(
                BoardEvent::WorkItemScheduled(_)
                    | BoardEvent::WorkItemAbandoned(_)
                    | BoardEvent::WorkItemRetired(_)
            )
        )
    }

    /// Fold one event in. Events that do not move work items on or off the
    /// board are ignored.
    pub fn apply(&mut self, event: &Event) -> Result<(), ConsistencyError> {
        match &event.payload {
            Payload::Board(BoardEvent::WorkItemScheduled(scheduled)) => {
                let id = scheduled.work_item_id;
                if self.in_flight.contains_key(&id) {
                    return Err(ConsistencyError::DuplicateSchedule(id));
                }
                self.in_flight.insert(id, event.timestamp);
            }
            Payload::Board(BoardEvent::WorkItemRetired(retired)) => {
                let id = retired.work_item_id;
                let started = self
                    .in_flight
                    .remove(&id)
                    .ok_or(ConsistencyError::RetireUntracked(id))?;
                self.completed.insert(id, event.timestamp - started);
            }
            Payload::Board(BoardEvent::WorkItemAbandoned(abandoned)) => {
                let id = abandoned.work_item_id;
                self.in_flight
                    .remove(&id)
                    .ok_or(ConsistencyError::AbandonUntracked(id))?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Mean lead time over retired work items, or `None` if none retired yet.
    pub fn average_lead_time(&self) -> Option<Duration> {
        let count = i32::try_from(self.completed.len()).ok().filter(|&n| n > 0)?;
        let total = self
            .completed
            .values()
            .fold(Duration::zero(), |acc, d| acc + *d);
        Some(total / count)
    }

    pub fn lead_time_of(&self, work_item_id: EntityId) -> Option<Duration> {
        self.completed.get(&work_item_id).copied()
    }

    pub fn lead_times(&self) -> Vec<Duration> {
        self.completed.values().copied().collect()
    }

    pub fn scheduled_at(&self, work_item_id: EntityId) -> Option<DateTime<Utc>> {
        self.in_flight.get(&work_item_id).copied()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn completed(&self) -> usize {
        self.completed.len()
    }
}
