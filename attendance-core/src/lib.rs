//! Core types for the attendance scheduling dashboard.
//!
//! This crate holds everything the scheduling shell and the backend client
//! share:
//! - `event` and `id` for schedule events and their identifiers
//! - `store` for the in-memory event store and its mutations
//! - `selector` for filtering events by track
//! - `sync` for planning and submitting a bulk sync
//! - `session` for the logged-in user's identity

pub mod branch;
pub mod error;
pub mod event;
pub mod id;
pub mod selection;
pub mod selector;
pub mod session;
pub mod store;
pub mod sync;
pub mod track;

pub use branch::{Branch, BranchDirectory};
pub use error::{SessionError, SyncError, ValidationError};
pub use event::{EventDraft, EventPatch, Presentation, ScheduleEvent, Venue, WireEvent};
pub use id::{DraftId, EventId, ServerId, TrackId};
pub use selection::{DayCheck, Selection};
pub use selector::{filter_by_track, TrackSelector};
pub use session::{Role, Session, SessionConfig};
pub use store::EventStore;
pub use sync::{
    BulkSyncRequest, BulkSyncResponse, SyncBackend, SyncGateway, SyncPlan, SyncReceipt,
};
pub use track::{Track, TrackPage};
