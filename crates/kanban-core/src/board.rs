//! The Kanban board aggregate and the columns it owns.
//!
//! Every command validates against the current in-memory state, builds one
//! self-sufficient event (positional indices included, so replay never has
//! to search), applies it through [`Board::mutate`] and publishes it.

use crate::entity::EntityBase;
use crate::error::{ConsistencyError, ConstraintError, CoreError, DiscardedEntityError, ValidationError};
use crate::event::{
    BoardAttribute, BoardCreated, BoardEvent, ColumnAttribute, ColumnAttributeChanged,
    ColumnRemoved, Discarded, Event, NewColumnAdded, NewColumnInserted, Payload,
    WorkItemAbandoned, WorkItemAdvanced, WorkItemRetired, WorkItemScheduled,
};
use crate::hub::DomainContext;
use crate::id::{EntityId, EntityKind};
use crate::mutator::Aggregate;
use crate::validation::Validator;
use crate::work_item::WorkItem;

/// One stage of a board's process. Owned by its board, never addressed alone.
///
/// `work_item_ids` is in priority order: earliest scheduled first.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    base: EntityBase,
    name: String,
    wip_limit: Option<u32>,
    work_item_ids: Vec<EntityId>,
}

impl Column {
    fn new(id: EntityId, name: String, wip_limit: Option<u32>) -> Self {
        Self {
            base: EntityBase::new("Column", id, 0),
            name,
            wip_limit,
            work_item_ids: Vec::new(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.base.id()
    }

    pub fn version(&self) -> u64 {
        self.base.version()
    }

    pub fn is_discarded(&self) -> bool {
        self.base.is_discarded()
    }

    pub fn name(&self) -> Result<&str, CoreError> {
        self.base.check_not_discarded()?;
        Ok(&self.name)
    }

    /// Maximum number of work items, or `None` for unlimited.
    pub fn wip_limit(&self) -> Result<Option<u32>, CoreError> {
        self.base.check_not_discarded()?;
        Ok(self.wip_limit)
    }

    pub fn number_of_work_items(&self) -> Result<usize, CoreError> {
        self.base.check_not_discarded()?;
        Ok(self.work_item_ids.len())
    }

    /// True iff the column is unlimited or holds fewer items than its limit.
    pub fn can_accept_work_item(&self) -> Result<bool, CoreError> {
        self.base.check_not_discarded()?;
        Ok(self.accepts())
    }

    pub fn work_item_ids(&self) -> Result<&[EntityId], CoreError> {
        self.base.check_not_discarded()?;
        Ok(&self.work_item_ids)
    }

    pub fn contains(&self, work_item_id: EntityId) -> Result<bool, CoreError> {
        self.base.check_not_discarded()?;
        Ok(self.work_item_ids.contains(&work_item_id))
    }

    fn accepts(&self) -> bool {
        self.wip_limit
            .map_or(true, |limit| self.work_item_ids.len() < limit as usize)
    }

    fn work_limit_error(&self) -> ConstraintError {
        ConstraintError::WorkLimit {
            column: self.name.clone(),
            limit: self.wip_limit.unwrap_or_default(),
        }
    }

    fn take_at(&mut self, priority: usize, expected: EntityId) -> Result<(), ConsistencyError> {
        match self.work_item_ids.get(priority) {
            Some(&found) if found == expected => {
                self.work_item_ids.remove(priority);
                Ok(())
            }
            found => Err(ConsistencyError::PriorityMismatch {
                expected,
                priority,
                found: found.copied(),
            }),
        }
    }
}

/// A board that tracks work items through a left-to-right sequence of columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    base: EntityBase,
    name: String,
    description: String,
    columns: Vec<Column>,
}

impl Board {
    /// Start a new project board, publishing its `Created` event.
    pub fn start_project(
        ctx: &DomainContext,
        name: &str,
        description: &str,
    ) -> Result<Board, CoreError> {
        Validator::validate_non_empty("Board name", name)?;
        Validator::validate_non_empty("Board description", description)?;

        let event = Event::new(
            EntityId::new(),
            0,
            ctx.now(),
            BoardEvent::Created(BoardCreated {
                name: name.to_string(),
                description: description.to_string(),
            }),
        );
        let board = Board::mutate(None, &event)?;
        ctx.publish(&event)?;
        Ok(board)
    }

    pub fn id(&self) -> EntityId {
        self.base.id()
    }

    pub fn version(&self) -> u64 {
        self.base.version()
    }

    pub fn is_discarded(&self) -> bool {
        self.base.is_discarded()
    }

    pub fn name(&self) -> Result<&str, CoreError> {
        self.base.check_not_discarded()?;
        Ok(&self.name)
    }

    pub fn description(&self) -> Result<&str, CoreError> {
        self.base.check_not_discarded()?;
        Ok(&self.description)
    }

    pub fn set_name(&mut self, ctx: &DomainContext, name: &str) -> Result<(), CoreError> {
        self.base.check_not_discarded()?;
        Validator::validate_non_empty("Board name", name)?;
        self.commit(
            ctx,
            BoardEvent::AttributeChanged(BoardAttribute::Name(name.to_string())),
        )
    }

    pub fn set_description(
        &mut self,
        ctx: &DomainContext,
        description: &str,
    ) -> Result<(), CoreError> {
        self.base.check_not_discarded()?;
        Validator::validate_non_empty("Board description", description)?;
        self.commit(
            ctx,
            BoardEvent::AttributeChanged(BoardAttribute::Description(description.to_string())),
        )
    }

    pub fn columns(&self) -> Result<&[Column], CoreError> {
        self.base.check_not_discarded()?;
        Ok(&self.columns)
    }

    pub fn column_names(&self) -> Result<Vec<&str>, CoreError> {
        self.base.check_not_discarded()?;
        Ok(self.columns.iter().map(|c| c.name.as_str()).collect())
    }

    pub fn column_with_name(&self, name: &str) -> Result<&Column, CoreError> {
        self.base.check_not_discarded()?;
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| ValidationError::UnknownColumnName(name.to_string()).into())
    }

    pub fn column_with_id(&self, column_id: EntityId) -> Result<&Column, CoreError> {
        self.base.check_not_discarded()?;
        self.columns
            .iter()
            .find(|c| c.id() == column_id)
            .ok_or_else(|| ValidationError::ColumnNotOnBoard(column_id, self.id()).into())
    }

    /// Whether a work item is scheduled in any column of this board.
    pub fn contains_work_item(&self, work_item_id: EntityId) -> Result<bool, CoreError> {
        self.base.check_not_discarded()?;
        Ok(self.locate(work_item_id).is_some())
    }

    /// Add a column at the right-hand end of the board. Returns its id.
    pub fn add_column(
        &mut self,
        ctx: &DomainContext,
        name: &str,
        wip_limit: Option<u32>,
    ) -> Result<EntityId, CoreError> {
        self.base.check_not_discarded()?;
        self.validate_column_name(name)?;

        let column_id = EntityId::new();
        self.commit(
            ctx,
            BoardEvent::NewColumnAdded(NewColumnAdded {
                column_id,
                column_name: name.to_string(),
                wip_limit,
            }),
        )?;
        Ok(column_id)
    }

    /// Insert a column immediately to the left of an existing one. Returns its id.
    pub fn insert_column_before(
        &mut self,
        ctx: &DomainContext,
        succeeding_column_id: EntityId,
        name: &str,
        wip_limit: Option<u32>,
    ) -> Result<EntityId, CoreError> {
        self.base.check_not_discarded()?;
        self.validate_column_name(name)?;
        self.column_index(succeeding_column_id)?;

        let column_id = EntityId::new();
        self.commit(
            ctx,
            BoardEvent::NewColumnInserted(NewColumnInserted {
                column_id,
                column_name: name.to_string(),
                wip_limit,
                succeeding_column_id,
            }),
        )?;
        Ok(column_id)
    }

    /// Remove an empty column.
    pub fn remove_column(&mut self, ctx: &DomainContext, column_id: EntityId) -> Result<(), CoreError> {
        self.base.check_not_discarded()?;
        let column = &self.columns[self.column_index(column_id)?];
        if !column.work_item_ids.is_empty() {
            return Err(ConstraintError::ColumnNotEmpty {
                name: column.name.clone(),
                count: column.work_item_ids.len(),
            }
            .into());
        }

        self.commit(ctx, BoardEvent::ColumnRemoved(ColumnRemoved { column_id }))
    }

    pub fn remove_column_by_name(&mut self, ctx: &DomainContext, name: &str) -> Result<(), CoreError> {
        let column_id = self.column_with_name(name)?.id();
        self.remove_column(ctx, column_id)
    }

    pub fn rename_column(
        &mut self,
        ctx: &DomainContext,
        column_id: EntityId,
        name: &str,
    ) -> Result<(), CoreError> {
        self.base.check_not_discarded()?;
        self.column_index(column_id)?;
        Validator::validate_column_name(
            name,
            self.columns
                .iter()
                .filter(|c| c.id() != column_id)
                .map(|c| c.name.as_str()),
        )?;
        self.commit(
            ctx,
            BoardEvent::ColumnAttributeChanged(ColumnAttributeChanged {
                column_id,
                attribute: ColumnAttribute::Name(name.to_string()),
            }),
        )
    }

    /// Change a column's limit. Items already above a lowered limit stay put;
    /// the limit only gates future insertions.
    pub fn set_column_wip_limit(
        &mut self,
        ctx: &DomainContext,
        column_id: EntityId,
        wip_limit: Option<u32>,
    ) -> Result<(), CoreError> {
        self.base.check_not_discarded()?;
        self.column_index(column_id)?;
        self.commit(
            ctx,
            BoardEvent::ColumnAttributeChanged(ColumnAttributeChanged {
                column_id,
                attribute: ColumnAttribute::WipLimit(wip_limit),
            }),
        )
    }

    /// Enqueue a work item at the back of the first column.
    pub fn schedule_work_item(
        &mut self,
        ctx: &DomainContext,
        work_item: &WorkItem,
    ) -> Result<(), CoreError> {
        self.base.check_not_discarded()?;
        check_work_item(work_item)?;

        let Some(first) = self.columns.first() else {
            return Err(ConstraintError::NoColumns(self.id()).into());
        };
        if self.locate(work_item.id()).is_some() {
            return Err(ConstraintError::AlreadyScheduled(work_item.id()).into());
        }
        if !first.accepts() {
            return Err(first.work_limit_error().into());
        }

        self.commit(
            ctx,
            BoardEvent::WorkItemScheduled(WorkItemScheduled {
                work_item_id: work_item.id(),
            }),
        )
    }

    /// Take a work item off the board from whichever column holds it.
    pub fn abandon_work_item(
        &mut self,
        ctx: &DomainContext,
        work_item: &WorkItem,
    ) -> Result<(), CoreError> {
        self.base.check_not_discarded()?;
        check_work_item(work_item)?;
        let (column_index, priority) = self.locate_or_err(work_item.id())?;

        self.commit(
            ctx,
            BoardEvent::WorkItemAbandoned(WorkItemAbandoned {
                work_item_id: work_item.id(),
                column_index,
                priority,
            }),
        )
    }

    /// Move a work item to the back of the next column.
    pub fn advance_work_item(
        &mut self,
        ctx: &DomainContext,
        work_item: &WorkItem,
    ) -> Result<(), CoreError> {
        self.base.check_not_discarded()?;
        check_work_item(work_item)?;
        let (source_column_index, priority) = self.locate_or_err(work_item.id())?;

        let Some(destination) = self.columns.get(source_column_index + 1) else {
            return Err(ConstraintError::LastColumn(work_item.id()).into());
        };
        if !destination.accepts() {
            return Err(destination.work_limit_error().into());
        }

        self.commit(
            ctx,
            BoardEvent::WorkItemAdvanced(WorkItemAdvanced {
                work_item_id: work_item.id(),
                source_column_index,
                priority,
            }),
        )
    }

    /// Remove a finished work item from the last column.
    pub fn retire_work_item(
        &mut self,
        ctx: &DomainContext,
        work_item: &WorkItem,
    ) -> Result<(), CoreError> {
        self.base.check_not_discarded()?;
        check_work_item(work_item)?;

        let Some(last) = self.columns.last() else {
            return Err(ConstraintError::NoColumns(self.id()).into());
        };
        let Some(priority) = last.work_item_ids.iter().position(|&id| id == work_item.id()) else {
            return Err(ConstraintError::NotInLastColumn(work_item.id()).into());
        };

        self.commit(
            ctx,
            BoardEvent::WorkItemRetired(WorkItemRetired {
                work_item_id: work_item.id(),
                priority,
            }),
        )
    }

    /// Discard this board and its columns. Scheduled work items are untouched.
    pub fn discard(&mut self, ctx: &DomainContext) -> Result<(), CoreError> {
        self.base.check_not_discarded()?;
        self.commit(ctx, BoardEvent::Discarded(Discarded {}))
    }

    fn validate_column_name(&self, name: &str) -> Result<(), ValidationError> {
        Validator::validate_column_name(name, self.columns.iter().map(|c| c.name.as_str()))
    }

    fn column_index(&self, column_id: EntityId) -> Result<usize, ValidationError> {
        self.columns
            .iter()
            .position(|c| c.id() == column_id)
            .ok_or(ValidationError::ColumnNotOnBoard(column_id, self.id()))
    }

    /// Column index and priority of a work item, if it is on this board.
    fn locate(&self, work_item_id: EntityId) -> Option<(usize, usize)> {
        self.columns.iter().enumerate().find_map(|(index, column)| {
            column
                .work_item_ids
                .iter()
                .position(|&id| id == work_item_id)
                .map(|priority| (index, priority))
        })
    }

    fn locate_or_err(&self, work_item_id: EntityId) -> Result<(usize, usize), ValidationError> {
        self.locate(work_item_id)
            .ok_or(ValidationError::WorkItemNotOnBoard(work_item_id, self.id()))
    }

    fn commit(&mut self, ctx: &DomainContext, payload: BoardEvent) -> Result<(), CoreError> {
        let event = Event::new(self.id(), self.version(), ctx.now(), payload);
        self.when(&event)?;
        ctx.publish(&event)
    }

    fn replay_column_index(&self, column_id: EntityId) -> Result<usize, ConsistencyError> {
        self.columns
            .iter()
            .position(|c| c.id() == column_id)
            .ok_or(ConsistencyError::UnknownColumn(column_id))
    }

    fn replay_column_in_range(&self, index: usize) -> Result<(), ConsistencyError> {
        if index >= self.columns.len() {
            return Err(ConsistencyError::ColumnIndexOutOfRange {
                board: self.id(),
                index,
            });
        }
        Ok(())
    }

    /// Apply one event to an existing board. Nothing is modified unless the
    /// whole event applies.
    fn when(&mut self, event: &Event) -> Result<(), CoreError> {
        let Payload::Board(payload) = &event.payload else {
            return Err(ConsistencyError::UnhandledEvent {
                topic: event.topic(),
                target: "Board",
            }
            .into());
        };
        self.base.validate_event_originator(event)?;
        self.base.check_not_discarded()?;

        match payload {
            BoardEvent::Created(_) => {
                return Err(ConsistencyError::AlreadyCreated {
                    topic: event.topic(),
                    id: self.id(),
                }
                .into());
            }
            BoardEvent::AttributeChanged(attribute) => match attribute {
                BoardAttribute::Name(name) => self.name = name.clone(),
                BoardAttribute::Description(description) => self.description = description.clone(),
            },
            BoardEvent::ColumnAttributeChanged(change) => {
                let index = self.replay_column_index(change.column_id)?;
                let column = &mut self.columns[index];
                match &change.attribute {
                    ColumnAttribute::Name(name) => column.name = name.clone(),
                    ColumnAttribute::WipLimit(limit) => column.wip_limit = *limit,
                }
                column.base.increment_version();
            }
            BoardEvent::NewColumnAdded(added) => {
                self.columns.push(Column::new(
                    added.column_id,
                    added.column_name.clone(),
                    added.wip_limit,
                ));
            }
            BoardEvent::NewColumnInserted(inserted) => {
                let index = self.replay_column_index(inserted.succeeding_column_id)?;
                self.columns.insert(
                    index,
                    Column::new(
                        inserted.column_id,
                        inserted.column_name.clone(),
                        inserted.wip_limit,
                    ),
                );
            }
            BoardEvent::ColumnRemoved(removed) => {
                let index = self.replay_column_index(removed.column_id)?;
                let mut column = self.columns.remove(index);
                column.base.mark_discarded();
            }
            BoardEvent::WorkItemScheduled(scheduled) => {
                self.replay_column_in_range(0)?;
                let first = &mut self.columns[0];
                first.work_item_ids.push(scheduled.work_item_id);
                first.base.increment_version();
            }
            BoardEvent::WorkItemAbandoned(abandoned) => {
                self.replay_column_in_range(abandoned.column_index)?;
                let column = &mut self.columns[abandoned.column_index];
                column.take_at(abandoned.priority, abandoned.work_item_id)?;
                column.base.increment_version();
            }
            BoardEvent::WorkItemAdvanced(advanced) => {
                let source = advanced.source_column_index;
                let next = source
                    .checked_add(1)
                    .ok_or(ConsistencyError::ColumnIndexOutOfRange {
                        board: self.base.id(),
                        index: source,
                    })?;
                self.replay_column_in_range(next)?;
                self.columns[source].take_at(advanced.priority, advanced.work_item_id)?;
                self.columns[source].base.increment_version();
                let destination = &mut self.columns[next];
                destination.work_item_ids.push(advanced.work_item_id);
                destination.base.increment_version();
            }
            BoardEvent::WorkItemRetired(retired) => {
                let Some(last) = self.columns.last_mut() else {
                    return Err(ConsistencyError::ColumnIndexOutOfRange {
                        board: self.base.id(),
                        index: 0,
                    }
                    .into());
                };
                last.take_at(retired.priority, retired.work_item_id)?;
                last.base.increment_version();
            }
            BoardEvent::Discarded(_) => {
                for column in &mut self.columns {
                    column.base.mark_discarded();
                }
                self.columns.clear();
                self.base.mark_discarded();
            }
        }
        self.base.increment_version();
        Ok(())
    }
}

fn check_work_item(work_item: &WorkItem) -> Result<(), DiscardedEntityError> {
    if work_item.is_discarded() {
        return Err(DiscardedEntityError {
            kind: "WorkItem",
            id: work_item.id(),
        });
    }
    Ok(())
}

impl Aggregate for Board {
    const KIND: EntityKind = EntityKind::Board;

    fn id(&self) -> EntityId {
        self.base.id()
    }

    fn version(&self) -> u64 {
        self.base.version()
    }

    fn is_discarded(&self) -> bool {
        self.base.is_discarded()
    }

    fn name(&self) -> Result<&str, CoreError> {
        Board::name(self)
    }

    fn mutate(prior: Option<Self>, event: &Event) -> Result<Self, CoreError> {
        match (prior, &event.payload) {
            (None, Payload::Board(BoardEvent::Created(created))) => {
                let base = EntityBase::new("Board", event.originator_id, 0);
                base.validate_event_originator(event)?;
                let mut board = Board {
                    base,
                    name: created.name.clone(),
                    description: created.description.clone(),
                    columns: Vec::new(),
                };
                board.base.increment_version();
                Ok(board)
            }
            (None, _) => Err(ConsistencyError::MissingCreation {
                topic: event.topic(),
                id: event.originator_id,
            }
            .into()),
            (Some(mut board), _) => {
                board.when(event)?;
                Ok(board)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono::Utc;

    use super::*;
    use crate::hub::MessageHub;
    use crate::mutator::replay;

    struct Fixture {
        ctx: DomainContext,
        log: Arc<Mutex<Vec<Event>>>,
    }

    impl Fixture {
        fn new() -> Self {
            let hub = Arc::new(MessageHub::new());
            let log = Arc::new(Mutex::new(Vec::new()));
            let sink = log.clone();
            hub.subscribe(
                Arc::new(|_: &Event| true),
                Arc::new(move |e: &Event| {
                    sink.lock().unwrap().push(e.clone());
                    Ok(())
                }),
            );
            Self {
                ctx: DomainContext::new(hub),
                log,
            }
        }

        fn board(&self) -> Board {
            Board::start_project(&self.ctx, "Test", "A test project").unwrap()
        }

        fn item(&self, name: &str) -> WorkItem {
            WorkItem::register(&self.ctx, name, None, None).unwrap()
        }

        fn events_for(&self, id: EntityId) -> Vec<Event> {
            self.log
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.originator_id == id)
                .cloned()
                .collect()
        }

        fn event_count(&self) -> usize {
            self.log.lock().unwrap().len()
        }
    }

    fn three_column_board(f: &Fixture) -> Board {
        let mut board = f.board();
        board.add_column(&f.ctx, "To do", Some(20)).unwrap();
        board.add_column(&f.ctx, "Doing", Some(3)).unwrap();
        board.add_column(&f.ctx, "Done", None).unwrap();
        board
    }

    #[test]
    fn test_start_project() {
        let f = Fixture::new();
        let board = f.board();

        assert_eq!(board.name().unwrap(), "Test");
        assert_eq!(board.description().unwrap(), "A test project");
        assert_eq!(board.version(), 1);
        assert!(board.columns().unwrap().is_empty());
    }

    #[test]
    fn test_start_project_validates() {
        let f = Fixture::new();
        assert!(matches!(
            Board::start_project(&f.ctx, "", "d"),
            Err(CoreError::Validation(ValidationError::Empty("Board name")))
        ));
        assert!(matches!(
            Board::start_project(&f.ctx, "n", ""),
            Err(CoreError::Validation(ValidationError::Empty("Board description")))
        ));
        assert_eq!(f.event_count(), 0);
    }

    #[test]
    fn test_add_columns_in_order() {
        let f = Fixture::new();
        let board = three_column_board(&f);

        assert_eq!(board.column_names().unwrap(), vec!["To do", "Doing", "Done"]);
        assert_eq!(board.column_with_name("Doing").unwrap().wip_limit().unwrap(), Some(3));
        assert_eq!(board.column_with_name("Done").unwrap().wip_limit().unwrap(), None);
        assert_eq!(board.version(), 4);
    }

    #[test]
    fn test_duplicate_column_name_leaves_board_unchanged() {
        let f = Fixture::new();
        let mut board = three_column_board(&f);
        let before = board.clone();
        let events = f.event_count();

        let err = board.add_column(&f.ctx, "Doing", None).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::DuplicateColumnName(_))
        ));
        assert_eq!(board, before);
        assert_eq!(f.event_count(), events);
    }

    #[test]
    fn test_insert_column_before() {
        let f = Fixture::new();
        let mut board = three_column_board(&f);
        let todo = board.column_with_name("To do").unwrap().id();

        board.insert_column_before(&f.ctx, todo, "Impeded", Some(7)).unwrap();

        assert_eq!(
            board.column_names().unwrap(),
            vec!["Impeded", "To do", "Doing", "Done"]
        );
    }

    #[test]
    fn test_insert_before_foreign_column_fails() {
        let f = Fixture::new();
        let mut board = three_column_board(&f);
        let mut other = f.board();
        let foreign = other.add_column(&f.ctx, "Elsewhere", None).unwrap();

        let err = board
            .insert_column_before(&f.ctx, foreign, "Impeded", None)
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::ColumnNotOnBoard(_, _))
        ));
    }

    #[test]
    fn test_remove_empty_column() {
        let f = Fixture::new();
        let mut board = three_column_board(&f);

        board.remove_column_by_name(&f.ctx, "Doing").unwrap();
        assert_eq!(board.column_names().unwrap(), vec!["To do", "Done"]);
    }

    #[test]
    fn test_remove_non_empty_column_is_constraint_error() {
        let f = Fixture::new();
        let mut board = three_column_board(&f);
        let item = f.item("Feature 1");
        board.schedule_work_item(&f.ctx, &item).unwrap();
        let before = board.clone();

        let todo = board.column_with_name("To do").unwrap().id();
        let err = board.remove_column(&f.ctx, todo).unwrap_err();

        assert!(err.is_constraint());
        assert!(!err.is_work_limit());
        assert_eq!(board, before);
    }

    #[test]
    fn test_rename_and_relimit_column() {
        let f = Fixture::new();
        let mut board = three_column_board(&f);
        let doing = board.column_with_name("Doing").unwrap().id();

        board.rename_column(&f.ctx, doing, "In progress").unwrap();
        board.set_column_wip_limit(&f.ctx, doing, Some(1)).unwrap();

        let column = board.column_with_id(doing).unwrap();
        assert_eq!(column.name().unwrap(), "In progress");
        assert_eq!(column.wip_limit().unwrap(), Some(1));
        assert_eq!(column.version(), 2);

        assert!(matches!(
            board.rename_column(&f.ctx, doing, "Done"),
            Err(CoreError::Validation(ValidationError::DuplicateColumnName(_)))
        ));
    }

    #[test]
    fn test_rename_column_to_its_own_name() {
        let f = Fixture::new();
        let mut board = three_column_board(&f);
        let doing = board.column_with_name("Doing").unwrap().id();

        board.rename_column(&f.ctx, doing, "Doing").unwrap();

        let column = board.column_with_id(doing).unwrap();
        assert_eq!(column.name().unwrap(), "Doing");
        assert_eq!(column.version(), 1);
        assert_eq!(board.column_names().unwrap(), vec!["To do", "Doing", "Done"]);
    }

    #[test]
    fn test_schedule_requires_columns() {
        let f = Fixture::new();
        let mut board = f.board();
        let item = f.item("Feature 1");

        let err = board.schedule_work_item(&f.ctx, &item).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Constraint(ConstraintError::NoColumns(_))
        ));
    }

    #[test]
    fn test_schedule_appends_to_first_column_in_fifo_order() {
        let f = Fixture::new();
        let mut board = three_column_board(&f);
        let a = f.item("a");
        let b = f.item("b");

        board.schedule_work_item(&f.ctx, &a).unwrap();
        board.schedule_work_item(&f.ctx, &b).unwrap();

        let todo = board.column_with_name("To do").unwrap();
        assert_eq!(todo.work_item_ids().unwrap(), &[a.id(), b.id()]);
        assert_eq!(todo.version(), 2);
    }

    #[test]
    fn test_schedule_twice_is_constraint_error() {
        let f = Fixture::new();
        let mut board = three_column_board(&f);
        let item = f.item("Feature 1");
        board.schedule_work_item(&f.ctx, &item).unwrap();

        let err = board.schedule_work_item(&f.ctx, &item).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Constraint(ConstraintError::AlreadyScheduled(_))
        ));
    }

    #[test]
    fn test_schedule_discarded_item_fails() {
        let f = Fixture::new();
        let mut board = three_column_board(&f);
        let mut item = f.item("Feature 1");
        item.discard(&f.ctx).unwrap();

        assert!(matches!(
            board.schedule_work_item(&f.ctx, &item),
            Err(CoreError::Discarded(_))
        ));
    }

    #[test]
    fn test_schedule_into_full_column_is_work_limit_error() {
        let f = Fixture::new();
        let mut board = f.board();
        board.add_column(&f.ctx, "Tiny", Some(1)).unwrap();
        board.schedule_work_item(&f.ctx, &f.item("a")).unwrap();
        let before = board.clone();

        let err = board.schedule_work_item(&f.ctx, &f.item("b")).unwrap_err();
        assert!(err.is_work_limit());
        assert!(err.is_constraint());
        assert_eq!(board, before);
    }

    #[test]
    fn test_zero_limit_accepts_nothing() {
        let f = Fixture::new();
        let mut board = f.board();
        board.add_column(&f.ctx, "Frozen", Some(0)).unwrap();

        assert!(!board.columns().unwrap()[0].can_accept_work_item().unwrap());
        assert!(board
            .schedule_work_item(&f.ctx, &f.item("a"))
            .unwrap_err()
            .is_work_limit());
    }

    #[test]
    fn test_advance_into_full_column_is_work_limit_error() {
        let f = Fixture::new();
        let mut board = f.board();
        board.add_column(&f.ctx, "To do", None).unwrap();
        board.add_column(&f.ctx, "Doing", Some(1)).unwrap();
        let a = f.item("a");
        let b = f.item("b");
        board.schedule_work_item(&f.ctx, &a).unwrap();
        board.schedule_work_item(&f.ctx, &b).unwrap();
        board.advance_work_item(&f.ctx, &a).unwrap();
        let before = board.clone();

        let err = board.advance_work_item(&f.ctx, &b).unwrap_err();
        assert!(err.is_work_limit());
        assert_eq!(board, before);
        assert!(board.column_with_name("Doing").unwrap().number_of_work_items().unwrap() <= 1);
    }

    #[test]
    fn test_advance_from_last_column_fails() {
        let f = Fixture::new();
        let mut board = three_column_board(&f);
        let item = f.item("Feature 1");
        board.schedule_work_item(&f.ctx, &item).unwrap();
        board.advance_work_item(&f.ctx, &item).unwrap();
        board.advance_work_item(&f.ctx, &item).unwrap();

        let err = board.advance_work_item(&f.ctx, &item).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Constraint(ConstraintError::LastColumn(_))
        ));
        assert!(board.column_with_name("Done").unwrap().contains(item.id()).unwrap());
    }

    #[test]
    fn test_advance_unscheduled_item_fails() {
        let f = Fixture::new();
        let mut board = three_column_board(&f);
        let err = board.advance_work_item(&f.ctx, &f.item("x")).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::WorkItemNotOnBoard(_, _))
        ));
    }

    #[test]
    fn test_retire_only_from_last_column() {
        let f = Fixture::new();
        let mut board = three_column_board(&f);
        let item = f.item("Feature 1");
        board.schedule_work_item(&f.ctx, &item).unwrap();
        board.advance_work_item(&f.ctx, &item).unwrap();

        let err = board.retire_work_item(&f.ctx, &item).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Constraint(ConstraintError::NotInLastColumn(_))
        ));

        board.advance_work_item(&f.ctx, &item).unwrap();
        board.retire_work_item(&f.ctx, &item).unwrap();
        assert!(!board.contains_work_item(item.id()).unwrap());
    }

    #[test]
    fn test_retire_on_board_without_columns_fails() {
        let f = Fixture::new();
        let mut board = f.board();
        let err = board.retire_work_item(&f.ctx, &f.item("x")).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Constraint(ConstraintError::NoColumns(_))
        ));
    }

    #[test]
    fn test_abandon_from_any_column_records_position() {
        let f = Fixture::new();
        let mut board = three_column_board(&f);
        let a = f.item("a");
        let b = f.item("b");
        board.schedule_work_item(&f.ctx, &a).unwrap();
        board.schedule_work_item(&f.ctx, &b).unwrap();

        board.abandon_work_item(&f.ctx, &b).unwrap();

        let last = f.log.lock().unwrap().last().cloned().unwrap();
        assert_eq!(
            last.payload,
            Payload::Board(BoardEvent::WorkItemAbandoned(WorkItemAbandoned {
                work_item_id: b.id(),
                column_index: 0,
                priority: 1,
            }))
        );
        assert_eq!(
            board.column_with_name("To do").unwrap().work_item_ids().unwrap(),
            &[a.id()]
        );
    }

    #[test]
    fn test_discarded_board_is_inert() {
        let f = Fixture::new();
        let mut board = three_column_board(&f);
        board.discard(&f.ctx).unwrap();

        assert!(board.is_discarded());
        assert!(matches!(board.name(), Err(CoreError::Discarded(_))));
        assert!(matches!(board.columns(), Err(CoreError::Discarded(_))));
        assert!(matches!(
            board.add_column(&f.ctx, "More", None),
            Err(CoreError::Discarded(_))
        ));
        assert!(matches!(board.discard(&f.ctx), Err(CoreError::Discarded(_))));
    }

    #[test]
    fn test_version_increments_by_one_per_event() {
        let f = Fixture::new();
        let mut board = three_column_board(&f);
        let item = f.item("Feature 1");
        board.schedule_work_item(&f.ctx, &item).unwrap();
        board.advance_work_item(&f.ctx, &item).unwrap();

        let events = f.events_for(board.id());
        for (expected, event) in events.iter().enumerate() {
            assert_eq!(event.originator_version, expected as u64);
        }
        assert_eq!(board.version(), events.len() as u64);
    }

    #[test]
    fn test_replay_reproduces_live_board() {
        let f = Fixture::new();
        let mut board = three_column_board(&f);
        let items: Vec<WorkItem> = (1..=4).map(|n| f.item(&format!("Feature {n}"))).collect();

        board.set_name(&f.ctx, "Another name").unwrap();
        board.set_description(&f.ctx, "A different description").unwrap();
        let todo = board.column_with_name("To do").unwrap().id();
        board.insert_column_before(&f.ctx, todo, "Backlog", None).unwrap();
        for item in &items {
            board.schedule_work_item(&f.ctx, item).unwrap();
        }
        board.abandon_work_item(&f.ctx, &items[1]).unwrap();
        for _ in 0..3 {
            board.advance_work_item(&f.ctx, &items[2]).unwrap();
        }
        board.advance_work_item(&f.ctx, &items[3]).unwrap();
        board.retire_work_item(&f.ctx, &items[2]).unwrap();
        board.remove_column_by_name(&f.ctx, "Done").unwrap();

        let replayed: Board = replay(&f.events_for(board.id())).unwrap().unwrap();
        assert_eq!(replayed, board);
    }

    #[test]
    fn test_replay_rejects_stale_event() {
        let f = Fixture::new();
        let board = f.board();
        let mut copy_a = board.clone();
        let copy_b = board.clone();

        copy_a.add_column(&f.ctx, "A", None).unwrap();
        let stale = Event::new(
            copy_b.id(),
            copy_b.version(),
            Utc::now(),
            BoardEvent::NewColumnAdded(NewColumnAdded {
                column_id: EntityId::new(),
                column_name: "B".to_string(),
                wip_limit: None,
            }),
        );

        let err = Board::mutate(Some(copy_a), &stale).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Consistency(ConsistencyError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn test_replay_rejects_mismatched_priority() {
        let f = Fixture::new();
        let mut board = three_column_board(&f);
        let a = f.item("a");
        board.schedule_work_item(&f.ctx, &a).unwrap();
        let before = board.clone();

        let bogus = Event::new(
            board.id(),
            board.version(),
            Utc::now(),
            BoardEvent::WorkItemAdvanced(WorkItemAdvanced {
                work_item_id: EntityId::new(),
                source_column_index: 0,
                priority: 0,
            }),
        );
        let err = Board::mutate(Some(board), &bogus).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Consistency(ConsistencyError::PriorityMismatch { .. })
        ));
        assert_eq!(before.column_with_name("To do").unwrap().work_item_ids().unwrap(), &[a.id()]);
    }

    #[test]
    fn test_replay_rejects_advance_from_unrepresentable_column() {
        let f = Fixture::new();
        let mut board = three_column_board(&f);
        let a = f.item("a");
        board.schedule_work_item(&f.ctx, &a).unwrap();

        let bogus = Event::new(
            board.id(),
            board.version(),
            Utc::now(),
            BoardEvent::WorkItemAdvanced(WorkItemAdvanced {
                work_item_id: a.id(),
                source_column_index: usize::MAX,
                priority: 0,
            }),
        );
        let err = Board::mutate(Some(board), &bogus).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Consistency(ConsistencyError::ColumnIndexOutOfRange { index: usize::MAX, .. })
        ));
    }

    #[test]
    fn test_mutate_rejects_work_item_events() {
        let f = Fixture::new();
        let board = f.board();
        let item = f.item("a");
        let foreign = f.events_for(item.id()).remove(0);

        assert!(matches!(
            Board::mutate(Some(board), &foreign),
            Err(CoreError::Consistency(ConsistencyError::UnhandledEvent { .. }))
        ));
    }
}
