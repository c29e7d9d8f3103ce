//! Finding work items that are still on a board after their due date.

use std::sync::Arc;

use chrono::NaiveDate;

use kanban_core::{Board, CoreError, EntityId, EventStore, WorkItem};

use crate::repository::Repository;

fn is_overdue(work_item: &WorkItem, today: NaiveDate) -> bool {
    matches!(work_item.due_date(), Ok(Some(due)) if due < today)
}

/// Work items scheduled on `board` whose due date is before `today`, in
/// column order then priority order.
pub fn locate_overdue_work_items<S: EventStore + ?Sized>(
    board: &Board,
    work_items: &Repository<WorkItem, S>,
    today: NaiveDate,
) -> Result<Vec<Arc<WorkItem>>, CoreError> {
    let mut scheduled: Vec<EntityId> = Vec::new();
    for column in board.columns()? {
        scheduled.extend_from_slice(column.work_item_ids()?);
    }
    work_items.all_where(|w| is_overdue(w, today), Some(scheduled.as_slice()))
}

pub fn any_overdue_work_items<S: EventStore + ?Sized>(
    board: &Board,
    work_items: &Repository<WorkItem, S>,
    today: NaiveDate,
) -> Result<bool, CoreError> {
    Ok(!locate_overdue_work_items(board, work_items, today)?.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanban_core::{DomainContext, InMemoryEventStore, MessageHub};

    use crate::persistence::PersistenceSubscriber;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_only_scheduled_past_due_items() {
        let hub = Arc::new(MessageHub::new());
        let store = Arc::new(InMemoryEventStore::new());
        let _persistence = PersistenceSubscriber::attach(hub.clone(), store.clone());
        let ctx = DomainContext::new(hub);

        let mut board = Board::start_project(&ctx, "Test", "A test project").unwrap();
        board.add_column(&ctx, "To do", None).unwrap();
        board.add_column(&ctx, "Doing", None).unwrap();

        let late = WorkItem::register(&ctx, "Late", Some(date(2013, 1, 12)), None).unwrap();
        let due_today = WorkItem::register(&ctx, "Today", Some(date(2013, 1, 20)), None).unwrap();
        let undated = WorkItem::register(&ctx, "Undated", None, None).unwrap();
        let unscheduled =
            WorkItem::register(&ctx, "Backlog", Some(date(2012, 6, 1)), None).unwrap();

        board.schedule_work_item(&ctx, &late).unwrap();
        board.schedule_work_item(&ctx, &due_today).unwrap();
        board.schedule_work_item(&ctx, &undated).unwrap();
        board.advance_work_item(&ctx, &late).unwrap();

        let repo: Repository<WorkItem, _> = Repository::new(store);
        let today = date(2013, 1, 20);

        let overdue = locate_overdue_work_items(&board, &repo, today).unwrap();
        let ids: Vec<EntityId> = overdue.iter().map(|w| w.id()).collect();
        assert_eq!(ids, vec![late.id()]);
        assert!(!ids.contains(&unscheduled.id()));
        assert!(any_overdue_work_items(&board, &repo, today).unwrap());
        assert!(!any_overdue_work_items(&board, &repo, date(2013, 1, 1)).unwrap());
    }
}
