//! The in-memory event store.
//!
//! Holds every schedule event of the current session and exposes the
//! mutations the calendar gestures map to. Every mutation either applies in
//! full or returns a `ValidationError` and leaves the store untouched.

use chrono::{NaiveDate, NaiveDateTime};

use crate::branch::{Branch, BranchDirectory};
use crate::error::{ValidationError, ValidationResult};
use crate::event::{EventDraft, EventPatch, ScheduleEvent, Venue};
use crate::id::{DraftId, EventId, TrackId};
use crate::selection::{DayCheck, Selection};
use crate::sync::SyncReceipt;
use crate::track::Track;

#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<ScheduleEvent>,
    tracks: Vec<Track>,
    branches: BranchDirectory,
}

impl EventStore {
    pub fn new(branches: BranchDirectory) -> Self {
        EventStore {
            events: Vec::new(),
            tracks: Vec::new(),
            branches,
        }
    }

    /// Replace the known tracks (fetched once from the backend).
    pub fn set_tracks(&mut self, tracks: Vec<Track>) {
        self.tracks = tracks;
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, id: &TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| &t.id == id)
    }

    pub fn branches(&self) -> &BranchDirectory {
        &self.branches
    }

    pub fn events(&self) -> &[ScheduleEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, id: &EventId) -> Option<&ScheduleEvent> {
        self.events.iter().find(|e| &e.id == id)
    }

    fn get_mut(&mut self, id: &EventId) -> ValidationResult<&mut ScheduleEvent> {
        self.events
            .iter_mut()
            .find(|e| &e.id == id)
            .ok_or_else(|| ValidationError::EventNotFound(id.clone()))
    }

    /// The branch already used by an offline event on `day`, if any.
    pub fn branch_for_day(&self, day: NaiveDate) -> Option<&Branch> {
        self.events
            .iter()
            .filter(|e| e.day() == day)
            .find_map(|e| e.branch())
    }

    /// Branch for a new offline event: the day's branch, else the track default.
    fn resolve_branch(&self, track_id: &TrackId, day: NaiveDate) -> Option<Branch> {
        if let Some(branch) = self.branch_for_day(day) {
            return Some(branch.clone());
        }
        self.track(track_id)
            .and_then(|t| t.resolve_default_branch(&self.branches))
    }

    /// Create a draft event from a calendar selection.
    ///
    /// Returns the new event's id. Nothing is appended when the title is
    /// empty, the selection is invalid, or an offline event has no branch.
    pub fn create_event(
        &mut self,
        track_id: &TrackId,
        draft: EventDraft,
        now: NaiveDateTime,
    ) -> ValidationResult<EventId> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if track_id.is_empty() {
            return Err(ValidationError::NoTrackSelected);
        }
        if self.track(track_id).is_none() {
            return Err(ValidationError::UnknownTrack(track_id.clone()));
        }
        Selection::new(draft.start, draft.end).validate(now)?;

        let venue = if draft.is_online {
            Venue::Online
        } else {
            let branch = self
                .resolve_branch(track_id, draft.start.date())
                .ok_or(ValidationError::MissingBranch)?;
            Venue::Offline(branch)
        };

        let id = EventId::Draft(DraftId::new());
        let event = ScheduleEvent {
            id: id.clone(),
            title: title.to_string(),
            instructor: draft.instructor.filter(|s| !s.trim().is_empty()),
            start: draft.start,
            end: draft.end,
            venue,
            track_id: track_id.clone(),
        };

        tracing::debug!(%id, title = %event.title, day = %event.day(), "created draft event");
        self.events.push(event);
        Ok(id)
    }

    /// Insert an event loaded from the backend, replacing any event with the same id.
    pub fn insert(&mut self, event: ScheduleEvent) {
        match self.events.iter_mut().find(|e| e.id == event.id) {
            Some(existing) => *existing = event,
            None => self.events.push(event),
        }
    }

    /// Apply partial changes to an event.
    ///
    /// Going online clears the branch. Staying or going offline keeps a
    /// branch: the patch's, the event's current one, the day's, or the
    /// track default, in that order.
    pub fn update_event(&mut self, id: &EventId, patch: EventPatch) -> ValidationResult<()> {
        let current = self
            .get(id)
            .ok_or_else(|| ValidationError::EventNotFound(id.clone()))?;

        let title = match &patch.title {
            Some(t) if t.trim().is_empty() => return Err(ValidationError::EmptyTitle),
            Some(t) => Some(t.trim().to_string()),
            None => None,
        };

        let go_online = patch.is_online.unwrap_or_else(|| current.is_online());
        let venue = if go_online {
            Venue::Online
        } else {
            let branch = match (patch.branch, current.branch()) {
                (Some(branch), _) => Some(branch),
                (None, Some(existing)) => Some(existing.clone()),
                (None, None) => self.resolve_branch(&current.track_id, current.day()),
            };
            Venue::Offline(branch.ok_or(ValidationError::MissingBranch)?)
        };

        let event = self.get_mut(id)?;
        if let Some(title) = title {
            event.title = title;
        }
        if let Some(instructor) = patch.instructor {
            event.instructor = instructor.filter(|s| !s.trim().is_empty());
        }
        event.venue = venue;

        tracing::debug!(%id, online = go_online, "updated event");
        Ok(())
    }

    /// Flip an event between online and offline. Returns the new `is_online`.
    pub fn toggle_online(&mut self, id: &EventId) -> ValidationResult<bool> {
        let now_online = !self
            .get(id)
            .ok_or_else(|| ValidationError::EventNotFound(id.clone()))?
            .is_online();
        self.update_event(
            id,
            EventPatch {
                is_online: Some(now_online),
                ..Default::default()
            },
        )?;
        Ok(now_online)
    }

    /// Drag gesture: move the event to a new time range.
    pub fn move_event(
        &mut self,
        id: &EventId,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> ValidationResult<DayCheck> {
        self.reschedule(id, start, end, "move")
    }

    /// Resize gesture: change the event's start and/or end.
    pub fn resize_event(
        &mut self,
        id: &EventId,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> ValidationResult<DayCheck> {
        self.reschedule(id, start, end, "resize")
    }

    // Unlike creation, a range ending on another day is accepted here and only reported.
    fn reschedule(
        &mut self,
        id: &EventId,
        start: NaiveDateTime,
        end: NaiveDateTime,
        gesture: &str,
    ) -> ValidationResult<DayCheck> {
        if end <= start {
            return Err(ValidationError::EndBeforeStart);
        }
        let event = self.get_mut(id)?;
        event.start = start;
        event.end = end;

        let check = DayCheck::of(start, end);
        if check == DayCheck::CrossesDay {
            tracing::warn!(%id, gesture, %start, %end, "event now spans more than one day");
        } else {
            tracing::debug!(%id, gesture, %start, %end, "rescheduled event");
        }
        Ok(check)
    }

    /// Set the branch of every offline event starting on `day`.
    ///
    /// Online events on that day stay online. Returns how many events changed.
    pub fn assign_branch_to_day(&mut self, day: NaiveDate, branch_id: &str) -> ValidationResult<usize> {
        let branch = self
            .branches
            .get(branch_id)
            .cloned()
            .ok_or_else(|| ValidationError::UnknownBranch(branch_id.to_string()))?;

        let mut updated = 0;
        for event in self.events.iter_mut().filter(|e| e.day() == day) {
            if let Venue::Offline(existing) = &mut event.venue {
                *existing = branch.clone();
                updated += 1;
            }
        }

        tracing::info!(%day, branch = %branch.name, updated, "assigned branch to day");
        Ok(updated)
    }

    /// Remove an event from the store. Does not contact the backend.
    pub fn delete_event(&mut self, id: &EventId) -> ValidationResult<ScheduleEvent> {
        let index = self
            .events
            .iter()
            .position(|e| &e.id == id)
            .ok_or_else(|| ValidationError::EventNotFound(id.clone()))?;
        tracing::debug!(%id, "deleted event locally");
        Ok(self.events.remove(index))
    }

    /// Swap draft ids for the server ids a successful sync assigned.
    ///
    /// Returns how many events were re-keyed.
    pub fn reconcile(&mut self, receipt: &SyncReceipt) -> usize {
        let mut count = 0;
        for (draft, server) in &receipt.assigned {
            let draft_id = EventId::Draft(*draft);
            if let Some(event) = self.events.iter_mut().find(|e| e.id == draft_id) {
                event.id = EventId::Persisted(server.clone());
                count += 1;
            }
        }
        if count > 0 {
            tracing::info!(count, "replaced draft ids with server ids");
        }
        count
    }
}
