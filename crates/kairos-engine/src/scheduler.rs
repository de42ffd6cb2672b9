//! Orchestration: resolve a work item, find free time before its deadline, place
//! blocks, and write them to the calendar.
//!
//! The scheduler never samples the wall clock. `now` is always supplied by the
//! caller, so the same inputs and collaborator responses give the same plan.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use tracing::{debug, info, warn};

use crate::allocator::{allocate_blocks, allocated_duration, shortfall, WorkRequirement};
use crate::collaborator::{
    BusyIntervalProvider, EventLabel, EventSink, LabelTemplate, WorkItem, WorkItemResolver,
};
use crate::error::{CollaboratorError, EngineError, Result};
use crate::freebusy::find_free_slots;
use crate::interval::{BusyInterval, FreeSlot, Horizon, ScheduledBlock};
use crate::zone;

/// Run the gap finder and the allocator over in-memory data.
///
/// This is the pure core of [`Scheduler::plan`], usable without any collaborator.
pub fn plan_blocks(
    busy: &[BusyInterval],
    horizon: &Horizon,
    requirement: &WorkRequirement,
) -> Vec<ScheduledBlock> {
    let free = find_free_slots(busy, horizon);
    allocate_blocks(requirement, &free)
}

/// The outcome of planning one work item, before anything is written.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub item: WorkItem,
    pub horizon: Horizon,
    pub requirement: WorkRequirement,
    pub free_slots: Vec<FreeSlot>,
    pub blocks: Vec<ScheduledBlock>,
}

impl Plan {
    pub fn allocated(&self) -> Duration {
        allocated_duration(&self.blocks)
    }

    /// Requested time that could not be placed before the deadline.
    pub fn shortfall(&self) -> Duration {
        shortfall(&self.requirement, &self.blocks)
    }

    pub fn is_fully_scheduled(&self) -> bool {
        self.shortfall() == Duration::zero()
    }
}

/// Result of writing one block to the event sink.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockOutcome {
    pub block: ScheduledBlock,
    /// The created event id, or why the sink refused the block.
    pub result: std::result::Result<String, CollaboratorError>,
}

impl BlockOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// A plan plus the per-block results of writing it out.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleReport {
    pub plan: Plan,
    pub label: EventLabel,
    pub outcomes: Vec<BlockOutcome>,
}

impl ScheduleReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &BlockOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &BlockOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn all_written(&self) -> bool {
        self.outcomes.iter().all(BlockOutcome::is_success)
    }

    pub fn shortfall(&self) -> Duration {
        self.plan.shortfall()
    }
}

/// Schedules one work item at a time against one calendar.
pub struct Scheduler<P, R, S> {
    calendar: P,
    items: R,
    sink: S,
    zone: Tz,
    labels: LabelTemplate,
}

impl<P, R, S> Scheduler<P, R, S>
where
    P: BusyIntervalProvider,
    R: WorkItemResolver,
    S: EventSink,
{
    /// `zone` is used to read due dates that carry no UTC offset.
    pub fn new(calendar: P, items: R, sink: S, zone: Tz) -> Self {
        Self {
            calendar,
            items,
            sink,
            zone,
            labels: LabelTemplate::default(),
        }
    }

    pub fn with_labels(mut self, labels: LabelTemplate) -> Self {
        self.labels = labels;
        self
    }

    /// Compute blocks for `item_id` without writing anything.
    ///
    /// # Errors
    /// - `EngineError::Upstream` if the resolver or calendar fails.
    /// - `EngineError::Unschedulable` if the item has no usable due date.
    pub fn plan(
        &self,
        item_id: &str,
        requirement: WorkRequirement,
        now: DateTime<Utc>,
    ) -> Result<Plan> {
        let item = self.items.resolve(item_id)?;
        let due = self.due_date(&item)?;
        let horizon = Horizon::new(now, due);

        let busy = if horizon.is_empty() {
            debug!(item = %item.id, %due, "deadline is not after now; nothing to fetch");
            Vec::new()
        } else {
            self.calendar.busy_intervals(&horizon)?
        };

        let free_slots = find_free_slots(&busy, &horizon);
        let blocks = allocate_blocks(&requirement, &free_slots);
        debug!(
            item = %item.id,
            busy = busy.len(),
            free = free_slots.len(),
            blocks = blocks.len(),
            "planned work item"
        );

        let plan = Plan {
            item,
            horizon,
            requirement,
            free_slots,
            blocks,
        };

        if !plan.is_fully_scheduled() {
            warn!(
                item = %plan.item.id,
                requested_minutes = requirement.total().num_minutes(),
                shortfall_minutes = plan.shortfall().num_minutes(),
                "not enough free time before the deadline"
            );
        }

        Ok(plan)
    }

    /// Plan `item_id` and create one calendar event per block.
    ///
    /// A sink failure for one block does not stop the others; every block gets
    /// a [`BlockOutcome`].
    ///
    /// # Errors
    /// Same as [`Scheduler::plan`]. Sink failures are reported in the outcomes,
    /// never as an `Err`.
    pub fn schedule(
        &self,
        item_id: &str,
        requirement: WorkRequirement,
        now: DateTime<Utc>,
    ) -> Result<ScheduleReport> {
        let plan = self.plan(item_id, requirement, now)?;
        let label = self.labels.render(&plan.item);

        let outcomes = plan
            .blocks
            .iter()
            .map(|block| {
                let result = self.sink.create_event(block, &label);
                match &result {
                    Ok(event_id) => info!(
                        item = %plan.item.id,
                        event = %event_id,
                        start = %block.start,
                        end = %block.end,
                        "scheduled block"
                    ),
                    Err(err) => warn!(
                        item = %plan.item.id,
                        start = %block.start,
                        end = %block.end,
                        error = %err,
                        "failed to create event for block"
                    ),
                }
                BlockOutcome {
                    block: block.clone(),
                    result,
                }
            })
            .collect();

        Ok(ScheduleReport {
            plan,
            label,
            outcomes,
        })
    }

    fn due_date(&self, item: &WorkItem) -> Result<DateTime<Utc>> {
        let text = item
            .due_at
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| EngineError::Unschedulable {
                item: item.id.clone(),
                reason: "no due date".to_string(),
            })?;

        zone::parse_timestamp(text, self.zone).map_err(|err| EngineError::Unschedulable {
            item: item.id.clone(),
            reason: err.to_string(),
        })
    }
}
