//! # kairos-engine
//!
//! Deadline-driven scheduling of work blocks into a calendar's free time.
//!
//! Given the busy intervals already on a calendar, a work item's deadline and
//! how many hours it needs, the engine finds the gaps before the deadline and
//! places the work into them greedily: one-hour blocks when the work can be
//! split, a single contiguous block when it cannot.
//!
//! The gap finder and allocator are pure functions. The [`scheduler`] wires them
//! to a calendar and a task tracker through the traits in [`collaborator`].
//!
//! ## Modules
//!
//! - [`interval`] — Busy intervals, horizons, free slots, scheduled blocks
//! - [`freebusy`] — Compute free time slots inside a horizon
//! - [`allocator`] — Place a work requirement into free slots
//! - [`zone`] — Normalize provider timestamps to UTC
//! - [`collaborator`] — Calendar / task-tracker / event-sink interfaces
//! - [`scheduler`] — Resolve, plan, and write one work item
//! - [`error`] — Error types

pub mod allocator;
pub mod collaborator;
pub mod error;
pub mod freebusy;
pub mod interval;
pub mod scheduler;
pub mod zone;

pub use allocator::{allocate_blocks, WorkRequirement};
pub use collaborator::{
    BusyIntervalProvider, EventLabel, EventSink, LabelTemplate, WorkItem, WorkItemResolver,
};
pub use error::{CollaboratorError, EngineError};
pub use freebusy::find_free_slots;
pub use interval::{BusyInterval, FreeSlot, Horizon, ScheduledBlock};
pub use scheduler::{plan_blocks, BlockOutcome, Plan, ScheduleReport, Scheduler};
