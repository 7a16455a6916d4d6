//! Track selection: which subset of the store the calendar shows.

use crate::event::ScheduleEvent;
use crate::id::TrackId;

/// Events belonging to `track_id`, in store order.
pub fn filter_by_track<'a>(events: &'a [ScheduleEvent], track_id: &TrackId) -> Vec<&'a ScheduleEvent> {
    events.iter().filter(|e| e.track_id() == track_id).collect()
}

/// The currently selected track. Nothing is shown until a track is picked.
#[derive(Debug, Clone, Default)]
pub struct TrackSelector {
    selected: Option<TrackId>,
}

impl TrackSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, track_id: TrackId) {
        tracing::debug!(track = %track_id, "selected track");
        self.selected = Some(track_id);
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&TrackId> {
        self.selected.as_ref()
    }

    pub fn filter<'a>(&self, events: &'a [ScheduleEvent]) -> Vec<&'a ScheduleEvent> {
        match &self.selected {
            Some(track_id) => filter_by_track(events, track_id),
            None => Vec::new(),
        }
    }
}
