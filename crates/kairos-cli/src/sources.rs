//! File-backed collaborators: a calendar export, a to-do export, and an
//! append-only event log.
//!
//! Files are re-read on every call so each scheduling run sees current data.
//! Events appended to the log count as busy time for later runs, the way
//! events created on a live calendar would.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use kairos_engine::zone::{day_bounds, parse_timestamp};
use kairos_engine::{
    BusyInterval, BusyIntervalProvider, CollaboratorError, EventLabel, EventSink, Horizon,
    ScheduledBlock, WorkItem, WorkItemResolver,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

const CALENDAR: &str = "calendar";
const TODO: &str = "todo";
const EVENT_LOG: &str = "event-log";

fn read_json<T: serde::de::DeserializeOwned>(
    path: &Path,
    collaborator: &str,
) -> Result<T, CollaboratorError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        CollaboratorError::new(collaborator, format!("cannot read {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&text).map_err(|e| {
        CollaboratorError::new(collaborator, format!("invalid JSON in {}: {}", path.display(), e))
    })
}

// ---------------------------------------------------------------------------
// Calendar export
// ---------------------------------------------------------------------------

/// Either a Google Calendar `events.list` response or a plain array of
/// `{start, end}` objects.
#[derive(Deserialize)]
#[serde(untagged)]
enum CalendarExport {
    Events { items: Vec<CalendarEvent> },
    Intervals(Vec<PlainInterval>),
}

#[derive(Deserialize)]
struct CalendarEvent {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    transparency: Option<String>,
    start: EventTime,
    end: EventTime,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventTime {
    #[serde(default)]
    date_time: Option<String>,
    /// All-day events carry a bare date instead; the end date is exclusive.
    #[serde(default)]
    date: Option<String>,
}

#[derive(Deserialize)]
struct PlainInterval {
    start: String,
    end: String,
}

/// Reads busy intervals from a calendar export file, plus the events already
/// written to an [`EventLog`] when one is attached.
pub struct CalendarFile {
    path: PathBuf,
    zone: Tz,
    event_log: Option<PathBuf>,
}

impl CalendarFile {
    pub fn new(path: impl Into<PathBuf>, zone: Tz) -> Self {
        Self {
            path: path.into(),
            zone,
            event_log: None,
        }
    }

    /// Also treat the events in this log as busy. A missing log holds no events.
    pub fn with_event_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.event_log = Some(path.into());
        self
    }

    /// Every busy interval in the export and the attached log, regardless of horizon.
    pub fn load(&self) -> Result<Vec<BusyInterval>, CollaboratorError> {
        let mut busy = self.load_export()?;
        if let Some(log) = &self.event_log {
            busy.extend(self.load_event_log(log)?);
        }
        Ok(busy)
    }

    fn load_export(&self) -> Result<Vec<BusyInterval>, CollaboratorError> {
        match read_json::<CalendarExport>(&self.path, CALENDAR)? {
            CalendarExport::Events { items } => {
                let mut busy = Vec::with_capacity(items.len());
                for event in items {
                    if let Some(interval) = self.event_interval(&event)? {
                        busy.push(interval);
                    }
                }
                Ok(busy)
            }
            CalendarExport::Intervals(intervals) => intervals
                .into_iter()
                .map(|raw| {
                    Ok(BusyInterval::new(
                        self.timestamp(&raw.start)?,
                        self.timestamp(&raw.end)?,
                    ))
                })
                .collect(),
        }
    }

    fn load_event_log(&self, path: &Path) -> Result<Vec<BusyInterval>, CollaboratorError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(CollaboratorError::new(
                    EVENT_LOG,
                    format!("cannot read {}: {}", path.display(), e),
                ))
            }
        };

        let mut busy = Vec::new();
        for (number, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let event: CalendarEvent = serde_json::from_str(line).map_err(|e| {
                CollaboratorError::new(
                    EVENT_LOG,
                    format!("invalid JSON in {} line {}: {}", path.display(), number + 1, e),
                )
            })?;
            if let Some(interval) = self.event_interval(&event)? {
                busy.push(interval);
            }
        }
        debug!(path = %path.display(), count = busy.len(), "loaded written events");
        Ok(busy)
    }

    /// `None` for events that do not block time.
    fn event_interval(
        &self,
        event: &CalendarEvent,
    ) -> Result<Option<BusyInterval>, CollaboratorError> {
        if event.status.as_deref() == Some("cancelled")
            || event.transparency.as_deref() == Some("transparent")
        {
            debug!(summary = ?event.summary, "skipping event that does not block time");
            return Ok(None);
        }
        let summary = event.summary.as_deref();
        let start = self.boundary(&event.start, summary)?;
        let end = self.boundary(&event.end, summary)?;
        Ok(Some(BusyInterval::new(start, end)))
    }

    fn boundary(
        &self,
        time: &EventTime,
        summary: Option<&str>,
    ) -> Result<DateTime<Utc>, CollaboratorError> {
        if let Some(text) = &time.date_time {
            return self.timestamp(text);
        }
        if let Some(text) = &time.date {
            let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|e| {
                CollaboratorError::new(CALENDAR, format!("invalid date '{}': {}", text, e))
            })?;
            let (start, _) = day_bounds(date, self.zone)
                .map_err(|e| CollaboratorError::new(CALENDAR, e.to_string()))?;
            return Ok(start);
        }
        Err(CollaboratorError::new(
            CALENDAR,
            format!(
                "event '{}' has neither dateTime nor date",
                summary.unwrap_or("(No title)")
            ),
        ))
    }

    fn timestamp(&self, text: &str) -> Result<DateTime<Utc>, CollaboratorError> {
        parse_timestamp(text, self.zone)
            .map_err(|e| CollaboratorError::new(CALENDAR, e.to_string()))
    }
}

impl BusyIntervalProvider for CalendarFile {
    fn busy_intervals(&self, horizon: &Horizon) -> Result<Vec<BusyInterval>, CollaboratorError> {
        let busy: Vec<BusyInterval> = self
            .load()?
            .into_iter()
            .filter(|b| horizon.overlaps(b.start, b.end))
            .collect();
        debug!(path = %self.path.display(), count = busy.len(), "loaded busy intervals");
        Ok(busy)
    }
}

// ---------------------------------------------------------------------------
// To-do export
// ---------------------------------------------------------------------------

/// A Canvas `users/self/todo` response, bare or wrapped as `{"assignments": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum TodoExport {
    Wrapped { assignments: Vec<TodoEntry> },
    Bare(Vec<TodoEntry>),
}

#[derive(Deserialize)]
struct TodoEntry {
    #[serde(default)]
    context_name: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
    /// Absent for to-do entries that are not assignments (e.g., quizzes to grade).
    #[serde(default)]
    assignment: Option<Assignment>,
}

#[derive(Deserialize)]
struct Assignment {
    id: Value,
    name: String,
    #[serde(default)]
    due_at: Option<String>,
    #[serde(default)]
    course_id: Option<Value>,
}

/// Canvas ids are JSON numbers; accept strings too.
fn id_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A to-do entry as shown by `kairos todo`.
#[derive(Debug, Clone, PartialEq)]
pub struct TodoListing {
    pub item: WorkItem,
    pub url: Option<String>,
}

/// Resolves work items from a to-do export file.
pub struct TodoFile {
    path: PathBuf,
    courses: BTreeMap<String, String>,
}

impl TodoFile {
    /// `courses` maps course ids to display names and takes precedence over
    /// the context name recorded in the export.
    pub fn new(path: impl Into<PathBuf>, courses: BTreeMap<String, String>) -> Self {
        Self {
            path: path.into(),
            courses,
        }
    }

    pub fn list(&self) -> Result<Vec<TodoListing>, CollaboratorError> {
        let entries = match read_json::<TodoExport>(&self.path, TODO)? {
            TodoExport::Wrapped { assignments } => assignments,
            TodoExport::Bare(entries) => entries,
        };

        Ok(entries
            .into_iter()
            .filter_map(|entry| {
                let assignment = entry.assignment?;
                let course = assignment
                    .course_id
                    .as_ref()
                    .and_then(|id| self.courses.get(&id_text(id)).cloned())
                    .or(entry.context_name);
                Some(TodoListing {
                    item: WorkItem {
                        id: id_text(&assignment.id),
                        name: assignment.name,
                        due_at: assignment.due_at,
                        course,
                    },
                    url: entry.html_url,
                })
            })
            .collect())
    }
}

impl WorkItemResolver for TodoFile {
    fn resolve(&self, id: &str) -> Result<WorkItem, CollaboratorError> {
        self.list()?
            .into_iter()
            .map(|listing| listing.item)
            .find(|item| item.id == id)
            .ok_or_else(|| {
                CollaboratorError::new(
                    TODO,
                    format!("no assignment with id '{}' in {}", id, self.path.display()),
                )
            })
    }
}

// ---------------------------------------------------------------------------
// Event log
// ---------------------------------------------------------------------------

/// Appends one Google Calendar `events.insert` body per created block.
///
/// Event ids carry a sequence number that continues from the lines already in
/// the log, so ids stay unique across runs and across threads sharing one log.
pub struct EventLog {
    path: PathBuf,
    calendar_id: String,
    zone: Tz,
    sequence: AtomicUsize,
}

impl EventLog {
    pub fn new(path: impl Into<PathBuf>, calendar_id: impl Into<String>, zone: Tz) -> Self {
        let path = path.into();
        let existing = existing_entries(&path);
        Self {
            path,
            calendar_id: calendar_id.into(),
            zone,
            sequence: AtomicUsize::new(existing),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn event_body(&self, id: &str, block: &ScheduledBlock, label: &EventLabel) -> Value {
        json!({
            "id": id,
            "calendarId": self.calendar_id,
            "summary": label.summary,
            "description": label.description,
            "start": {
                "dateTime": block.start.with_timezone(&self.zone).to_rfc3339(),
                "timeZone": self.zone.name(),
            },
            "end": {
                "dateTime": block.end.with_timezone(&self.zone).to_rfc3339(),
                "timeZone": self.zone.name(),
            },
            "reminders": {
                "useDefault": true,
            },
        })
    }
}

impl EventSink for EventLog {
    fn create_event(
        &self,
        block: &ScheduledBlock,
        label: &EventLabel,
    ) -> Result<String, CollaboratorError> {
        let number = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("kairos-{}-{}", block.start.format("%Y%m%dT%H%M%SZ"), number);
        let mut line = self.event_body(&id, block, label).to_string();
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                CollaboratorError::new(
                    EVENT_LOG,
                    format!("cannot open {}: {}", self.path.display(), e),
                )
            })?;
        // One write per line so concurrent appends do not interleave.
        file.write_all(line.as_bytes()).map_err(|e| {
            CollaboratorError::new(
                EVENT_LOG,
                format!("cannot write {}: {}", self.path.display(), e),
            )
        })?;

        Ok(id)
    }
}

/// Number of entries already in the log. An unreadable log counts as empty;
/// the first append reports the real problem.
fn existing_entries(path: &Path) -> usize {
    std::fs::read_to_string(path)
        .map(|text| text.lines().filter(|line| !line.trim().is_empty()).count())
        .unwrap_or(0)
}
