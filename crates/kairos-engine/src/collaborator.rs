//! Interfaces to the outside world.
//!
//! The scheduler only ever talks to a calendar and a task tracker through these
//! traits. Implementations receive their configuration (credentials, file paths,
//! zone) at construction time; nothing here reads process environment.

use serde::{Deserialize, Serialize};

use crate::error::CollaboratorError;
use crate::interval::{BusyInterval, Horizon, ScheduledBlock};

/// A unit of work to schedule, as returned by a task tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: String,
    pub name: String,
    /// Raw due date text; parsed by the scheduler. `None` when the tracker has no due date.
    pub due_at: Option<String>,
    /// Display name of the course or project the item belongs to, if known.
    #[serde(default)]
    pub course: Option<String>,
}

/// Text attached to a created calendar entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLabel {
    pub summary: String,
    pub description: String,
}

/// Templates for [`EventLabel`]. `{name}` is replaced by the work item name and
/// `{course}` by its course (empty when unknown).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelTemplate {
    pub summary: String,
    pub description: String,
}

impl Default for LabelTemplate {
    fn default() -> Self {
        Self {
            summary: "Work on {name}".to_string(),
            description: "Time to work on {name}".to_string(),
        }
    }
}

impl LabelTemplate {
    pub fn render(&self, item: &WorkItem) -> EventLabel {
        let course = item.course.as_deref().unwrap_or("");
        let fill = |template: &str| {
            template
                .replace("{name}", &item.name)
                .replace("{course}", course)
        };
        EventLabel {
            summary: fill(&self.summary),
            description: fill(&self.description),
        }
    }
}

/// Read-only source of existing calendar commitments.
pub trait BusyIntervalProvider: Send + Sync {
    /// Busy intervals overlapping `horizon`. Intervals may extend past either end.
    fn busy_intervals(&self, horizon: &Horizon) -> Result<Vec<BusyInterval>, CollaboratorError>;
}

/// Looks up work items by identifier.
pub trait WorkItemResolver: Send + Sync {
    fn resolve(&self, id: &str) -> Result<WorkItem, CollaboratorError>;
}

/// Writes scheduled blocks to a calendar.
pub trait EventSink: Send + Sync {
    /// Create one calendar entry and return its identifier.
    fn create_event(
        &self,
        block: &ScheduledBlock,
        label: &EventLabel,
    ) -> Result<String, CollaboratorError>;
}

impl<T: BusyIntervalProvider + ?Sized> BusyIntervalProvider for &T {
    fn busy_intervals(&self, horizon: &Horizon) -> Result<Vec<BusyInterval>, CollaboratorError> {
        (**self).busy_intervals(horizon)
    }
}

impl<T: WorkItemResolver + ?Sized> WorkItemResolver for &T {
    fn resolve(&self, id: &str) -> Result<WorkItem, CollaboratorError> {
        (**self).resolve(id)
    }
}

impl<T: EventSink + ?Sized> EventSink for &T {
    fn create_event(
        &self,
        block: &ScheduledBlock,
        label: &EventLabel,
    ) -> Result<String, CollaboratorError> {
        (**self).create_event(block, label)
    }
}
