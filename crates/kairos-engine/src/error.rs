//! Error types for kairos-engine operations.

use thiserror::Error;

/// A failure reported by an external collaborator (calendar, task tracker, event sink).
///
/// The engine does not interpret the message; it only distinguishes collaborator
/// failures from its own validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{collaborator}: {message}")]
pub struct CollaboratorError {
    /// Which collaborator failed (e.g., "calendar", "todo", "event-sink").
    pub collaborator: String,
    pub message: String,
}

impl CollaboratorError {
    pub fn new(collaborator: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            collaborator: collaborator.into(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid requirement: {0}")]
    InvalidRequirement(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Work item '{item}' cannot be scheduled: {reason}")]
    Unschedulable { item: String, reason: String },

    #[error("Upstream unavailable: {0}")]
    Upstream(#[from] CollaboratorError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
