//! Shared test helpers for AniList integration tests
//!
//! Each helper mounts mock responses for the GraphQL endpoint and returns
//! an adapter pointing at the mock server.

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use listsync_anilist::client::AniListClient;
use listsync_anilist::provider::AniListService;
use listsync_core::domain::newtypes::{AccessToken, MediaId};

pub const TEST_TOKEN: &str = "test-access-token";

/// Starts a mock server and returns a (MockServer, AniListService) tuple
/// whose client posts to `<server>/graphql`.
pub async fn setup_anilist_mock() -> (MockServer, AniListService) {
    let server = MockServer::start().await;
    let client = AniListClient::with_base_url(format!("{}/graphql", server.uri()));
    (server, AniListService::new(client))
}

pub fn token() -> AccessToken {
    AccessToken::new(TEST_TOKEN).unwrap()
}

pub fn media(id: i64) -> MediaId {
    MediaId::new(id).unwrap()
}

/// Mounts a successful `SaveMediaListEntry` response with the given id.
pub async fn mount_save_success(server: &MockServer, entry_id: i64) {
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("authorization", format!("Bearer {TEST_TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {
                "SaveMediaListEntry": {
                    "id": entry_id,
                    "status": "CURRENT",
                    "progress": 6,
                    "score": 0,
                    "private": false
                }
            }
        })))
        .mount(server)
        .await;
}

/// Mounts a response with the given HTTP status and GraphQL error.
pub async fn mount_graphql_error(
    server: &MockServer,
    http_status: u16,
    message: &str,
    status: u16,
) {
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(http_status).set_body_json(serde_json::json!({
            "data": null,
            "errors": [{ "message": message, "status": status, "locations": [] }]
        })))
        .mount(server)
        .await;
}

/// Returns the `variables` object of every request the server received.
pub async fn received_variables(server: &MockServer) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|req| {
            let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
            body["variables"].clone()
        })
        .collect()
}
