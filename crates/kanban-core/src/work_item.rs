use chrono::NaiveDate;

use crate::entity::EntityBase;
use crate::error::{ConsistencyError, CoreError};
use crate::event::{Discarded, Event, Payload, WorkItemAttribute, WorkItemCreated, WorkItemEvent};
use crate::hub::DomainContext;
use crate::id::{EntityId, EntityKind};
use crate::mutator::Aggregate;
use crate::validation::Validator;

/// A unit of work that can be scheduled on at most one board at a time.
///
/// Boards refer to work items only by id; a work item knows nothing about
/// where it is scheduled.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItem {
    base: EntityBase,
    name: String,
    due_date: Option<NaiveDate>,
    content: Option<String>,
}

impl WorkItem {
    /// Register a new work item, publishing its `Created` event.
    pub fn register(
        ctx: &DomainContext,
        name: &str,
        due_date: Option<NaiveDate>,
        content: Option<String>,
    ) -> Result<WorkItem, CoreError> {
        Validator::validate_non_empty("Work item name", name)?;

        let event = Event::new(
            EntityId::new(),
            0,
            ctx.now(),
            WorkItemEvent::Created(WorkItemCreated {
                name: name.to_string(),
                due_date,
                content,
            }),
        );
        let work_item = WorkItem::mutate(None, &event)?;
        ctx.publish(&event)?;
        Ok(work_item)
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

    pub fn due_date(&self) -> Result<Option<NaiveDate>, CoreError> {
        self.base.check_not_discarded()?;
        Ok(self.due_date)
    }

    pub fn content(&self) -> Result<Option<&str>, CoreError> {
        self.base.check_not_discarded()?;
        Ok(self.content.as_deref())
    }

    pub fn set_name(&mut self, ctx: &DomainContext, name: &str) -> Result<(), CoreError> {
        self.base.check_not_discarded()?;
        Validator::validate_non_empty("Work item name", name)?;
        self.commit(
            ctx,
            WorkItemEvent::AttributeChanged(WorkItemAttribute::Name(name.to_string())),
        )
    }

    pub fn set_due_date(
        &mut self,
        ctx: &DomainContext,
        due_date: Option<NaiveDate>,
    ) -> Result<(), CoreError> {
        self.base.check_not_discarded()?;
        self.commit(
            ctx,
            WorkItemEvent::AttributeChanged(WorkItemAttribute::DueDate(due_date)),
        )
    }

    pub fn set_content(
        &mut self,
        ctx: &DomainContext,
        content: Option<String>,
    ) -> Result<(), CoreError> {
        self.base.check_not_discarded()?;
        self.commit(
            ctx,
            WorkItemEvent::AttributeChanged(WorkItemAttribute::Content(content)),
        )
    }

    /// Discard this work item. It can no longer be used afterwards.
    pub fn discard(&mut self, ctx: &DomainContext) -> Result<(), CoreError> {
        self.base.check_not_discarded()?;
        self.commit(ctx, WorkItemEvent::Discarded(Discarded {}))
    }

    fn commit(&mut self, ctx: &DomainContext, payload: WorkItemEvent) -> Result<(), CoreError> {
        let event = Event::new(self.id(), self.version(), ctx.now(), payload);
        self.when(&event)?;
        ctx.publish(&event)
    }

    fn when(&mut self, event: &Event) -> Result<(), CoreError> {
        let Payload::WorkItem(payload) = &event.payload else {
            return Err(ConsistencyError::UnhandledEvent {
                topic: event.topic(),
                target: "WorkItem",
            }
            .into());
        };
        self.base.validate_event_originator(event)?;

        match payload {
            WorkItemEvent::Created(_) => {
                return Err(ConsistencyError::AlreadyCreated {
                    topic: event.topic(),
                    id: self.id(),
                }
                .into())
            }
            WorkItemEvent::AttributeChanged(attribute) => match attribute {
                WorkItemAttribute::Name(name) => self.name = name.clone(),
                WorkItemAttribute::DueDate(due_date) => self.due_date = *due_date,
                WorkItemAttribute::Content(content) => self.content = content.clone(),
            },
            WorkItemEvent::Discarded(_) => self.base.mark_discarded(),
        }
        self.base.increment_version();
        Ok(())
    }
}

impl Aggregate for WorkItem {
    const KIND: EntityKind = EntityKind::WorkItem;

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
        WorkItem::name(self)
    }

    fn mutate(prior: Option<Self>, event: &Event) -> Result<Self, CoreError> {
        match (prior, &event.payload) {
            (None, Payload::WorkItem(WorkItemEvent::Created(created))) => {
                let base = EntityBase::new("WorkItem", event.originator_id, 0);
                base.validate_event_originator(event)?;
                let mut work_item = WorkItem {
                    base,
                    name: created.name.clone(),
                    due_date: created.due_date,
                    content: created.content.clone(),
                };
                work_item.base.increment_version();
                Ok(work_item)
            }
            (None, _) => Err(ConsistencyError::MissingCreation {
                topic: event.topic(),
                id: event.originator_id,
            }
            .into()),
            (Some(mut work_item), _) => {
                work_item.when(event)?;
                Ok(work_item)
            }
        }
    }
}
