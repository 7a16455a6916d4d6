//! Client integration tests with wiremock.

use attendance_api::{ApiClient, ApiError};
use attendance_core::{
    Branch, BranchDirectory, EventDraft, EventStore, Role, ScheduleEvent, ServerId, Session,
    SessionConfig, SyncError, SyncGateway, SyncPlan, Track, TrackId,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session() -> Session {
    Session::init(SessionConfig {
        token: Some("test-token".to_string()),
        role: Role::Supervisor,
        name: Some("Sara".to_string()),
    })
    .expect("valid session")
}

fn client(server: &MockServer) -> ApiClient {
    ApiClient::new(&server.uri(), &session(), None).expect("Failed to create client")
}

fn at(h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2030, 1, 15)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

#[tokio::test]
async fn list_tracks_follows_pagination() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/attendance/tracks/"))
        .and(query_param("page", "2"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2,
            "next": null,
            "results": [{"id": 2, "name": "AI", "branch_id": 1}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/attendance/tracks/"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2,
            "next": format!("{}/attendance/tracks/?page=2", server.uri()),
            "results": [{
                "id": 1,
                "name": "Web Development",
                "default_branch": {"id": 1, "name": "Smart Village"},
                "intake": 44
            }]
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    let tracks = client(&server).list_tracks().await.expect("Failed to list tracks");

    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].id, TrackId::new("1"));
    assert_eq!(tracks[1].name, "AI");
}

#[tokio::test]
async fn list_tracks_returns_what_was_fetched_when_count_disagrees() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/attendance/tracks/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 5,
            "next": null,
            "results": [{"id": 3, "name": "Cloud"}]
        })))
        .mount(&server)
        .await;

    let tracks = client(&server).list_tracks().await.expect("Failed to list tracks");

    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].name, "Cloud");
}

#[tokio::test]
async fn list_sessions_accepts_bare_array() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/attendance/sessions/"))
        .and(query_param("track_id", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 42,
            "title": "HTML",
            "instructor": "Mona",
            "start": "2030-01-15T09:00:00",
            "end": "2030-01-15T12:00:00",
            "isOnline": false,
            "trackId": 1,
            "branch": {"id": 1, "name": "Smart Village"}
        }])))
        .mount(&server)
        .await;

    let sessions = client(&server)
        .list_sessions(&TrackId::new("1"))
        .await
        .expect("Failed to list sessions");

    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id, Some(ServerId::new("42")));
    let event = ScheduleEvent::from_wire(sessions[0].clone()).unwrap();
    assert_eq!(event.branch().map(|b| b.name.as_str()), Some("Smart Village"));
}

#[tokio::test]
async fn gateway_syncs_through_client() {
    let server = MockServer::start().await;

    let mut store = EventStore::new(BranchDirectory::new(vec![Branch::new("1", "Smart Village")]));
    store.set_tracks(vec![
        Track::new("1", "Web").with_default_branch(Branch::new("1", "Smart Village")),
    ]);
    let draft = store
        .create_event(&TrackId::new("1"), EventDraft::new("HTML", at(9), at(12)), at(6))
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/attendance/sessions/bulk-create-or-update/"))
        .and(header("Authorization", "Bearer test-token"))
        .and(body_json(json!({
            "combinedEvents": [{
                "id": null,
                "title": "HTML",
                "instructor": null,
                "start": "2030-01-15T09:00:00",
                "end": "2030-01-15T12:00:00",
                "isOnline": false,
                "trackId": "1",
                "branch": {"id": "1", "name": "Smart Village"}
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "combinedEvents": [{"id": 101}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = SyncGateway::new(client(&server));
    let plan = SyncPlan::from_events(store.events());
    let receipt = gateway.sync(&mut store, &plan).await.expect("sync failed");

    assert_eq!(receipt.assigned.len(), 1);
    assert!(store.get(&draft).is_none());
    assert_eq!(
        store.events()[0].id().server_id(),
        Some(&ServerId::new("101"))
    );
}

#[tokio::test]
async fn sync_with_empty_response_reloads_saved_sessions() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/attendance/sessions/bulk-create-or-update/"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/attendance/sessions/"))
        .and(query_param("track_id", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 77,
            "title": "Standup",
            "start": "2030-01-15T09:00:00",
            "end": "2030-01-15T10:00:00",
            "isOnline": true,
            "trackId": 1
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let mut store = EventStore::new(BranchDirectory::default());
    store.set_tracks(vec![Track::new("1", "Web")]);
    let mut draft = EventDraft::new("Standup", at(9), at(10));
    draft.is_online = true;
    let id = store.create_event(&TrackId::new("1"), draft, at(6)).unwrap();

    let gateway = SyncGateway::new(client(&server));
    let plan = SyncPlan::from_events(store.events());
    let receipt = gateway.sync(&mut store, &plan).await.expect("sync failed");

    assert!(receipt.assigned.is_empty());
    assert_eq!(receipt.reloaded, 1);
    assert!(store.get(&id).is_none());
    assert!(store.events().iter().all(|e| !e.id().is_draft()));
    assert_eq!(store.events()[0].id().server_id(), Some(&ServerId::new("77")));
}

#[tokio::test]
async fn rejected_sync_maps_to_sync_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/attendance/sessions/bulk-create-or-update/"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"detail": "Invalid branch"})),
        )
        .mount(&server)
        .await;

    let mut store = EventStore::new(BranchDirectory::default());
    store.set_tracks(vec![Track::new("1", "Web")]);
    let mut draft = EventDraft::new("Standup", at(9), at(10));
    draft.is_online = true;
    store.create_event(&TrackId::new("1"), draft, at(6)).unwrap();

    let gateway = SyncGateway::new(client(&server));
    let plan = SyncPlan::from_events(store.events());
    let err = gateway.sync(&mut store, &plan).await.unwrap_err();

    match err {
        SyncError::Rejected { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid branch");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(store.events()[0].id().is_draft());
}

#[tokio::test]
async fn delete_session_hits_detail_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/attendance/sessions/42/"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .delete_session(&ServerId::new("42"))
        .await
        .expect("Failed to delete");
}

#[tokio::test]
async fn server_error_without_body_uses_reason() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/attendance/tracks/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client(&server).list_tracks().await.unwrap_err();
    match err {
        ApiError::Status { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "Service Unavailable");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn rejects_invalid_base_url() {
    assert!(matches!(
        ApiClient::new("not a url", &session(), None),
        Err(ApiError::Url(_))
    ));
}
