//! Schedule events: one calendar-bound class meeting, online or offline.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::branch::Branch;
use crate::error::{ValidationError, ValidationResult};
use crate::id::{DraftId, EventId, ServerId, TrackId};

/// Where a session takes place.
///
/// An offline session always carries its branch and an online one never
/// does, so "online xor branch" holds by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Venue {
    Online,
    Offline(Branch),
}

impl Venue {
    pub fn is_online(&self) -> bool {
        matches!(self, Venue::Online)
    }

    pub fn branch(&self) -> Option<&Branch> {
        match self {
            Venue::Online => None,
            Venue::Offline(branch) => Some(branch),
        }
    }
}

/// Calendar colors for an event. A pure function of `is_online`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presentation {
    pub background_color: &'static str,
    pub border_color: &'static str,
    pub text_color: &'static str,
}

const ONLINE: Presentation = Presentation {
    background_color: "#2e7d32",
    border_color: "#1b5e20",
    text_color: "#ffffff",
};

const OFFLINE: Presentation = Presentation {
    background_color: "#1565c0",
    border_color: "#0d47a1",
    text_color: "#ffffff",
};

impl Presentation {
    pub fn for_online(is_online: bool) -> Self {
        if is_online { ONLINE } else { OFFLINE }
    }
}

/// A schedule event held by the event store.
///
/// Fields are only mutated through `EventStore`, which keeps the venue and
/// track invariants intact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEvent {
    pub(crate) id: EventId,
    pub(crate) title: String,
    pub(crate) instructor: Option<String>,
    pub(crate) start: NaiveDateTime,
    pub(crate) end: NaiveDateTime,
    pub(crate) venue: Venue,
    pub(crate) track_id: TrackId,
}

impl ScheduleEvent {
    pub fn id(&self) -> &EventId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn instructor(&self) -> Option<&str> {
        self.instructor.as_deref()
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn day(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn venue(&self) -> &Venue {
        &self.venue
    }

    pub fn is_online(&self) -> bool {
        self.venue.is_online()
    }

    pub fn branch(&self) -> Option<&Branch> {
        self.venue.branch()
    }

    pub fn track_id(&self) -> &TrackId {
        &self.track_id
    }

    pub fn presentation(&self) -> Presentation {
        Presentation::for_online(self.is_online())
    }

    pub fn duration_display(&self) -> String {
        format!("{} - {}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }

    /// Build an event from the backend's representation.
    ///
    /// A missing id yields a draft.
    pub fn from_wire(wire: WireEvent) -> ValidationResult<Self> {
        if wire.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if wire.track_id.is_empty() {
            return Err(ValidationError::NoTrackSelected);
        }
        if wire.end <= wire.start {
            return Err(ValidationError::EndBeforeStart);
        }
        let venue = if wire.is_online {
            Venue::Online
        } else {
            Venue::Offline(wire.branch.ok_or(ValidationError::MissingBranch)?)
        };
        let id = match wire.id {
            Some(id) => EventId::Persisted(id),
            None => EventId::Draft(DraftId::new()),
        };

        Ok(ScheduleEvent {
            id,
            title: wire.title,
            instructor: wire.instructor.filter(|s| !s.trim().is_empty()),
            start: wire.start,
            end: wire.end,
            venue,
            track_id: wire.track_id,
        })
    }

    /// The representation sent to the bulk endpoint; drafts go without an id.
    pub fn to_wire(&self) -> WireEvent {
        WireEvent {
            id: self.id.server_id().cloned(),
            title: self.title.clone(),
            instructor: self.instructor.clone(),
            start: self.start,
            end: self.end,
            is_online: self.is_online(),
            track_id: self.track_id.clone(),
            branch: self.branch().cloned(),
        }
    }
}

/// User input for a new event, captured from a selection on the calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    pub title: String,
    pub instructor: Option<String>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub is_online: bool,
}

impl EventDraft {
    pub fn new(title: impl Into<String>, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        EventDraft {
            title: title.into(),
            instructor: None,
            start,
            end,
            is_online: false,
        }
    }
}

/// Partial changes applied by `EventStore::update_event`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPatch {
    pub title: Option<String>,
    /// `Some(None)` clears the instructor.
    pub instructor: Option<Option<String>>,
    pub is_online: Option<bool>,
    /// Branch to use when the event is (or becomes) offline.
    pub branch: Option<Branch>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.instructor.is_none()
            && self.is_online.is_none()
            && self.branch.is_none()
    }
}

/// A schedule event as the backend sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireEvent {
    pub id: Option<ServerId>,
    pub title: String,
    #[serde(default)]
    pub instructor: Option<String>,
    #[serde(deserialize_with = "wire_time")]
    pub start: NaiveDateTime,
    #[serde(deserialize_with = "wire_time")]
    pub end: NaiveDateTime,
    pub is_online: bool,
    pub track_id: TrackId,
    #[serde(default)]
    pub branch: Option<Branch>,
}

/// Accept naive local timestamps as well as RFC 3339 ones with an offset.
fn wire_time<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.parse::<NaiveDateTime>()
        .or_else(|_| DateTime::parse_from_rfc3339(&raw).map(|dt| dt.naive_local()))
        .map_err(|_| serde::de::Error::custom(format!("invalid timestamp '{}'", raw)))
}
