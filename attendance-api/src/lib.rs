//! HTTP client for the attendance backend.
//!
//! Every request carries the session's bearer token. The client implements
//! `SyncBackend`, so a `SyncGateway` can drive it directly.

mod error;

use std::time::Duration;

use attendance_core::{
    BulkSyncRequest, BulkSyncResponse, ServerId, Session, SyncBackend, SyncError, Track, TrackId,
    TrackPage, WireEvent,
};
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

pub use error::{ApiError, ApiResult};

const TRACKS_PATH: &str = "attendance/tracks/";
const SESSIONS_PATH: &str = "attendance/sessions/";
const BULK_SYNC_PATH: &str = "attendance/sessions/bulk-create-or-update/";

/// Upper bound on pages followed when listing, in case `next` loops.
const MAX_PAGES: usize = 100;

pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    bearer: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Page {
        results: Vec<T>,
        #[serde(default)]
        next: Option<String>,
    },
    Bare(Vec<T>),
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(alias = "error", alias = "message")]
    detail: String,
}

impl ApiClient {
    /// Create a client for the backend at `base_url`.
    ///
    /// No timeout is applied unless one is given.
    pub fn new(base_url: &str, session: &Session, timeout: Option<Duration>) -> ApiResult<Self> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url,
            bearer: session.bearer(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> ApiResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// GET /attendance/tracks/, following pagination.
    pub async fn list_tracks(&self) -> ApiResult<Vec<Track>> {
        let mut tracks = Vec::new();
        let mut expected = None;
        let mut next = Some(self.url(TRACKS_PATH)?);

        for _ in 0..MAX_PAGES {
            let Some(url) = next.take() else { break };
            let page: TrackPage = self.get_json(url).await?;
            if expected.is_none() {
                expected = page.count;
                if let Some(count) = page.count {
                    tracks.reserve(usize::try_from(count).unwrap_or(0));
                }
            }
            tracks.extend(page.results);
            next = page.next.as_deref().map(Url::parse).transpose()?;
        }

        match expected {
            Some(count) if count != tracks.len() as u64 => {
                tracing::warn!(expected = count, got = tracks.len(), "track listing is incomplete")
            }
            _ => tracing::debug!(count = tracks.len(), "fetched tracks"),
        }
        Ok(tracks)
    }

    /// GET /attendance/sessions/?track_id=..., paginated or not.
    pub async fn list_sessions(&self, track_id: &TrackId) -> ApiResult<Vec<WireEvent>> {
        let mut url = self.url(SESSIONS_PATH)?;
        url.query_pairs_mut().append_pair("track_id", track_id.as_str());

        let mut sessions = Vec::new();
        let mut next = Some(url);
        for _ in 0..MAX_PAGES {
            let Some(url) = next.take() else { break };
            match self.get_json::<Listing<WireEvent>>(url).await? {
                Listing::Page { results, next: n } => {
                    sessions.extend(results);
                    next = n.as_deref().map(Url::parse).transpose()?;
                }
                Listing::Bare(results) => sessions.extend(results),
            }
        }

        tracing::debug!(track = %track_id, count = sessions.len(), "fetched sessions");
        Ok(sessions)
    }

    /// POST /attendance/sessions/bulk-create-or-update/
    ///
    /// The response body is optional; anything not shaped like a saved
    /// session list is treated as an empty response.
    pub async fn bulk_create_or_update(&self, request: &BulkSyncRequest) -> ApiResult<BulkSyncResponse> {
        let resp = self
            .http
            .post(self.url(BULK_SYNC_PATH)?)
            .header(AUTHORIZATION, &self.bearer)
            .json(request)
            .send()
            .await?;
        let resp = check_status(resp).await?;

        let body = resp.text().await?;
        if body.trim().is_empty() {
            return Ok(BulkSyncResponse::default());
        }
        Ok(serde_json::from_str(&body).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "bulk sync response has no saved sessions");
            BulkSyncResponse::default()
        }))
    }

    /// DELETE /attendance/sessions/{id}/
    pub async fn delete_session(&self, id: &ServerId) -> ApiResult<()> {
        let url = self.url(&format!("{}{}/", SESSIONS_PATH, id))?;
        let resp = self
            .http
            .delete(url)
            .header(AUTHORIZATION, &self.bearer)
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> ApiResult<T> {
        tracing::debug!(%url, "GET");
        let resp = self
            .http
            .get(url)
            .header(AUTHORIZATION, &self.bearer)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Turn a non-2xx response into `ApiError::Status` with the backend's message.
async fn check_status(resp: reqwest::Response) -> ApiResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|e| e.detail)
        .unwrap_or_else(|_| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                trimmed.chars().take(200).collect()
            }
        });

    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

impl SyncBackend for ApiClient {
    async fn bulk_create_or_update(&self, request: &BulkSyncRequest) -> Result<BulkSyncResponse, SyncError> {
        Ok(ApiClient::bulk_create_or_update(self, request).await?)
    }

    async fn delete_session(&self, id: &ServerId) -> Result<(), SyncError> {
        Ok(ApiClient::delete_session(self, id).await?)
    }

    async fn list_sessions(&self, track_id: &TrackId) -> Result<Vec<WireEvent>, SyncError> {
        Ok(ApiClient::list_sessions(self, track_id).await?)
    }
}
