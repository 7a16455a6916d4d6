//! Identifiers for events, tracks and backend records.
//!
//! Whether an event is new or already persisted is carried by the type of
//! its id, not by the shape of a string.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Client-generated id for an event the backend has not seen yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DraftId(Uuid);

impl DraftId {
    pub fn new() -> Self {
        DraftId(Uuid::new_v4())
    }
}

impl Default for DraftId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let simple = self.0.simple().to_string();
        write!(f, "draft:{}", &simple[..8])
    }
}

/// Opaque id assigned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ServerId(String);

impl ServerId {
    pub fn new(id: impl Into<String>) -> Self {
        ServerId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ServerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawId::deserialize(deserializer).map(|raw| ServerId(raw.into_string()))
    }
}

/// Id of a track (cohort/program).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        TrackId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TrackId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawId::deserialize(deserializer).map(|raw| TrackId(raw.into_string()))
    }
}

/// Id of a schedule event: either a local draft or a persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventId {
    Draft(DraftId),
    Persisted(ServerId),
}

impl EventId {
    pub fn is_draft(&self) -> bool {
        matches!(self, EventId::Draft(_))
    }

    /// The id to send to the backend; drafts are sent without one.
    pub fn server_id(&self) -> Option<&ServerId> {
        match self {
            EventId::Draft(_) => None,
            EventId::Persisted(id) => Some(id),
        }
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventId::Draft(id) => id.fmt(f),
            EventId::Persisted(id) => id.fmt(f),
        }
    }
}

impl From<ServerId> for EventId {
    fn from(id: ServerId) -> Self {
        EventId::Persisted(id)
    }
}

impl From<DraftId> for EventId {
    fn from(id: DraftId) -> Self {
        EventId::Draft(id)
    }
}

/// Backend primary keys come through as either JSON strings or integers.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum RawId {
    Text(String),
    Number(i64),
}

impl RawId {
    pub(crate) fn into_string(self) -> String {
        match self {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_id_accepts_numbers_and_strings() {
        let from_number: ServerId = serde_json::from_str("42").unwrap();
        let from_text: ServerId = serde_json::from_str("\"srv-42\"").unwrap();
        assert_eq!(from_number.as_str(), "42");
        assert_eq!(from_text.as_str(), "srv-42");
    }

    #[test]
    fn server_id_serializes_as_string() {
        let json = serde_json::to_string(&ServerId::new("7")).unwrap();
        assert_eq!(json, "\"7\"");
    }

    #[test]
    fn draft_ids_are_unique() {
        assert_ne!(DraftId::new(), DraftId::new());
    }

    #[test]
    fn only_persisted_ids_have_a_server_id() {
        let draft = EventId::Draft(DraftId::new());
        let persisted = EventId::Persisted(ServerId::new("srv-42"));
        assert!(draft.is_draft());
        assert_eq!(draft.server_id(), None);
        assert_eq!(persisted.server_id().map(ServerId::as_str), Some("srv-42"));
    }

    #[test]
    fn draft_display_is_short() {
        let shown = DraftId::new().to_string();
        assert!(shown.starts_with("draft:"));
        assert_eq!(shown.len(), "draft:".len() + 8);
    }
}
