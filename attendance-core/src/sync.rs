//! Bulk synchronization of the calendar with the backend.
//!
//! A sync sends the currently shown events in one request to the bulk
//! create-or-update endpoint. Drafts go without an id so the backend assigns
//! one; persisted events carry theirs. Nothing in the store changes unless
//! the request succeeds.

use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::SyncError;
use crate::event::{ScheduleEvent, WireEvent};
use crate::id::{DraftId, EventId, ServerId, TrackId};
use crate::store::EventStore;

/// Body of `POST /attendance/sessions/bulk-create-or-update/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSyncRequest {
    pub combined_events: Vec<WireEvent>,
}

/// Whatever the bulk endpoint tells us about the saved sessions.
///
/// The backend is not required to return anything; an empty response just
/// means draft ids cannot be replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSyncResponse {
    #[serde(default)]
    pub combined_events: Vec<SavedSession>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SavedSession {
    pub id: ServerId,
}

/// What a successful sync did to the local drafts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReceipt {
    /// Draft ids paired with the server ids the backend gave them.
    pub assigned: Vec<(DraftId, ServerId)>,
    /// Sessions loaded back from the backend for drafts it gave no id.
    pub reloaded: usize,
}

/// The shown events split into what the backend will create and update.
#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
    new_events: Vec<(DraftId, WireEvent)>,
    updated_events: Vec<WireEvent>,
}

impl SyncPlan {
    pub fn from_events<'a, I>(events: I) -> Self
    where
        I: IntoIterator<Item = &'a ScheduleEvent>,
    {
        let mut plan = SyncPlan::default();
        for event in events {
            match event.id() {
                EventId::Draft(draft) => plan.new_events.push((*draft, event.to_wire())),
                EventId::Persisted(_) => plan.updated_events.push(event.to_wire()),
            }
        }
        plan
    }

    pub fn new_events(&self) -> impl Iterator<Item = &WireEvent> {
        self.new_events.iter().map(|(_, wire)| wire)
    }

    pub fn updated_events(&self) -> &[WireEvent] {
        &self.updated_events
    }

    pub fn new_count(&self) -> usize {
        self.new_events.len()
    }

    pub fn updated_count(&self) -> usize {
        self.updated_events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.new_events.is_empty() && self.updated_events.is_empty()
    }

    /// New events first, then updated ones.
    pub fn request(&self) -> BulkSyncRequest {
        BulkSyncRequest {
            combined_events: self
                .new_events()
                .chain(self.updated_events.iter())
                .cloned()
                .collect(),
        }
    }

    /// Match the backend's saved sessions back to our drafts.
    ///
    /// Two shapes are understood: an echo of every combined event in request
    /// order (accepted only if the updated rows carry the ids we sent), or a
    /// list of just the created sessions. Ids that belong to an updated
    /// event, or that were already paired, are never given to a draft.
    fn receipt(&self, response: &BulkSyncResponse) -> SyncReceipt {
        let saved: Vec<&ServerId> = response.combined_events.iter().map(|s| &s.id).collect();
        let total = self.new_events.len() + self.updated_events.len();
        if saved.is_empty() {
            return SyncReceipt::default();
        }

        let created = if saved.len() == total {
            let (created, echoed) = saved.split_at(self.new_events.len());
            let echo_matches = echoed
                .iter()
                .zip(&self.updated_events)
                .all(|(id, wire)| wire.id.as_ref() == Some(*id));
            if !echo_matches {
                tracing::warn!("bulk sync response does not echo the updated sessions, ignoring it");
                return SyncReceipt::default();
            }
            created
        } else if saved.len() == self.new_events.len() {
            &saved[..]
        } else {
            tracing::warn!(
                expected = total,
                got = saved.len(),
                "bulk sync response does not line up with the request, ignoring it"
            );
            return SyncReceipt::default();
        };

        let mut taken: HashSet<&ServerId> = self
            .updated_events
            .iter()
            .filter_map(|wire| wire.id.as_ref())
            .collect();
        let assigned = self
            .new_events
            .iter()
            .zip(created)
            .filter(|(_, id)| taken.insert(**id))
            .map(|((draft, _), id)| (*draft, (*id).clone()))
            .collect();

        SyncReceipt {
            assigned,
            ..SyncReceipt::default()
        }
    }

    /// Drafts the receipt gave no server id, with the track each belongs to.
    fn unassigned<'a>(&'a self, receipt: &'a SyncReceipt) -> impl Iterator<Item = (DraftId, &'a TrackId)> {
        self.new_events
            .iter()
            .filter(move |(draft, _)| !receipt.assigned.iter().any(|(d, _)| d == draft))
            .map(|(draft, wire)| (*draft, &wire.track_id))
    }
}

/// The remote side of a sync.
pub trait SyncBackend {
    /// Create or update all sessions in one request.
    fn bulk_create_or_update(
        &self,
        request: &BulkSyncRequest,
    ) -> impl Future<Output = Result<BulkSyncResponse, SyncError>> + Send;

    /// Delete one persisted session.
    fn delete_session(&self, id: &ServerId) -> impl Future<Output = Result<(), SyncError>> + Send;

    /// Persisted sessions of one track.
    fn list_sessions(
        &self,
        track_id: &TrackId,
    ) -> impl Future<Output = Result<Vec<WireEvent>, SyncError>> + Send;
}

/// Submits sync plans, one at a time.
///
/// A second `submit` while one is outstanding fails with
/// `SyncError::InFlight` without contacting the backend.
pub struct SyncGateway<B> {
    backend: B,
    in_flight: AtomicBool,
}

impl<B: SyncBackend> SyncGateway<B> {
    pub fn new(backend: B) -> Self {
        SyncGateway {
            backend,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Send the plan to the backend. Does not touch any store.
    pub async fn submit(&self, plan: &SyncPlan) -> Result<SyncReceipt, SyncError> {
        if plan.is_empty() {
            return Err(SyncError::NothingToSync);
        }
        let _guard = InFlight::acquire(&self.in_flight)?;

        tracing::info!(
            new = plan.new_count(),
            updated = plan.updated_count(),
            "submitting bulk sync"
        );
        match self.backend.bulk_create_or_update(&plan.request()).await {
            Ok(response) => {
                let receipt = plan.receipt(&response);
                tracing::info!(assigned = receipt.assigned.len(), "bulk sync succeeded");
                Ok(receipt)
            }
            Err(err) => {
                tracing::warn!(error = %err, "bulk sync failed");
                Err(err)
            }
        }
    }

    /// Submit the plan and, on success, re-key the synced drafts in `store`.
    ///
    /// Drafts the response gave no id are dropped and their tracks are
    /// reloaded from the backend, so no draft outlives a successful sync.
    pub async fn sync(&self, store: &mut EventStore, plan: &SyncPlan) -> Result<SyncReceipt, SyncError> {
        let mut receipt = self.submit(plan).await?;
        store.reconcile(&receipt);

        let mut tracks: Vec<TrackId> = Vec::new();
        for (draft, track_id) in plan.unassigned(&receipt) {
            if let Err(err) = store.delete_event(&EventId::Draft(draft)) {
                tracing::debug!(error = %err, "synced draft already gone");
            }
            if !tracks.contains(track_id) {
                tracks.push(track_id.clone());
            }
        }

        for track_id in &tracks {
            match self.load_track(store, track_id).await {
                Ok(added) => receipt.reloaded += added,
                Err(err) => {
                    tracing::warn!(track = %track_id, error = %err, "could not reload sessions after sync")
                }
            }
        }
        Ok(receipt)
    }

    /// Load a track's persisted sessions into `store`.
    ///
    /// Events already in the store are left alone so unsynced local edits
    /// survive. Sessions the backend sends in an invalid shape are skipped.
    /// Returns how many events were added.
    pub async fn load_track(&self, store: &mut EventStore, track_id: &TrackId) -> Result<usize, SyncError> {
        let sessions = self.backend.list_sessions(track_id).await?;

        let mut added = 0;
        for wire in sessions {
            if wire.id.is_none() {
                tracing::warn!(title = %wire.title, "skipping session without an id");
                continue;
            }
            match ScheduleEvent::from_wire(wire) {
                Ok(event) if store.get(event.id()).is_none() => {
                    store.insert(event);
                    added += 1;
                }
                Ok(_) => {}
                Err(err) => tracing::warn!(error = %err, "skipping invalid session"),
            }
        }

        tracing::debug!(track = %track_id, added, "loaded sessions");
        Ok(added)
    }

    /// Delete an event on the backend (when persisted) and then locally.
    ///
    /// Drafts were never sent, so they are only removed locally. If the
    /// backend call fails the store keeps the event.
    pub async fn delete_remote(
        &self,
        store: &mut EventStore,
        id: &EventId,
    ) -> Result<ScheduleEvent, SyncError> {
        if store.get(id).is_none() {
            return Err(crate::error::ValidationError::EventNotFound(id.clone()).into());
        }
        if let EventId::Persisted(server_id) = id {
            self.backend.delete_session(server_id).await?;
            tracing::info!(%server_id, "deleted session on backend");
        }
        Ok(store.delete_event(id)?)
    }
}

struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, SyncError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| InFlight(flag))
            .map_err(|_| SyncError::InFlight)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
