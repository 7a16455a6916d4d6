//! Error types for the attendance core.

use thiserror::Error;

use crate::id::{EventId, TrackId};

/// A user action was rejected before touching the event store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Title is required")]
    EmptyTitle,

    #[error("Start and end must fall on the same day")]
    CrossDaySelection,

    #[error("Cannot schedule a session in the past")]
    PastSelection,

    #[error("End time must be after start time")]
    EndBeforeStart,

    #[error("Select a track first")]
    NoTrackSelected,

    #[error("Unknown track: {0}")]
    UnknownTrack(TrackId),

    #[error("Unknown branch: {0}")]
    UnknownBranch(String),

    #[error("An offline session needs a branch")]
    MissingBranch,

    #[error("Event not found: {0}")]
    EventNotFound(EventId),
}

/// The bulk sync (or a remote delete) did not go through.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("A sync is already in progress")]
    InFlight,

    #[error("Nothing to sync")]
    NothingToSync,

    #[error("Backend rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Could not reach the backend: {0}")]
    Transport(String),

    #[error("Unexpected response from the backend: {0}")]
    Decode(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// The session could not be set up.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("No access token configured")]
    MissingToken,

    #[error("Unknown role '{0}'. Expected student, supervisor or admin")]
    UnknownRole(String),
}

/// Result type alias for store operations.
pub type ValidationResult<T> = Result<T, ValidationError>;
