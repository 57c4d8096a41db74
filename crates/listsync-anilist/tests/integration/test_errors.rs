//! Integration tests for HTTP and GraphQL error classification

use std::time::Duration;

use listsync_anilist::client::AniListClient;
use listsync_anilist::provider::AniListService;
use listsync_core::domain::entry::EntryFields;
use listsync_core::ports::list_service::{IListService, ListServiceError};
use wiremock::{
    matchers::{method, path},
    Mock, ResponseTemplate,
};

use crate::common;

async fn save(service: &AniListService) -> Result<(), ListServiceError> {
    service
        .save_entry(&common::token(), common::media(1), &EntryFields::progress_only(1))
        .await
        .map(|_| ())
}

#[tokio::test]
async fn test_429_with_retry_after_header() {
    let (server, service) = common::setup_anilist_mock().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("Retry-After", "2")
                .set_body_json(serde_json::json!({
                    "data": null,
                    "errors": [{ "message": "Too Many Requests.", "status": 429 }]
                })),
        )
        .mount(&server)
        .await;

    let err = save(&service).await.unwrap_err();

    assert_eq!(
        err,
        ListServiceError::RateLimited {
            retry_after: Some(Duration::from_secs(2)),
            message: "Too Many Requests.".to_string(),
        }
    );
}

#[tokio::test]
async fn test_429_without_header_leaves_wait_to_caller() {
    let (server, service) = common::setup_anilist_mock().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = save(&service).await.unwrap_err();

    match err {
        ListServiceError::RateLimited { retry_after, message } => {
            assert!(retry_after.is_none());
            assert_eq!(message, "Too Many Requests");
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rate_limit_reported_in_graphql_errors() {
    let (server, service) = common::setup_anilist_mock().await;
    common::mount_graphql_error(&server, 200, "Too Many Requests.", 429).await;

    let err = save(&service).await.unwrap_err();

    assert!(err.is_rate_limited());
}

#[tokio::test]
async fn test_validation_error_is_rejected_with_server_message() {
    let (server, service) = common::setup_anilist_mock().await;
    common::mount_graphql_error(&server, 400, "invalid token", 400).await;

    let err = save(&service).await.unwrap_err();

    assert_eq!(
        err,
        ListServiceError::Rejected {
            status: Some(400),
            message: "invalid token".to_string(),
        }
    );
    assert_eq!(err.report_message(), "invalid token");
}

#[tokio::test]
async fn test_401_is_unauthorized() {
    let (server, service) = common::setup_anilist_mock().await;
    common::mount_graphql_error(&server, 401, "Invalid token", 401).await;

    let err = save(&service).await.unwrap_err();

    assert_eq!(err, ListServiceError::Unauthorized("Invalid token".to_string()));
}

#[tokio::test]
async fn test_5xx_is_server_error() {
    let (server, service) = common::setup_anilist_mock().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&server)
        .await;

    let err = save(&service).await.unwrap_err();

    assert_eq!(
        err,
        ListServiceError::Server {
            status: 503,
            message: "Service Unavailable".to_string(),
        }
    );
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_unparsable_body_is_invalid_response() {
    let (server, service) = common::setup_anilist_mock().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = save(&service).await.unwrap_err();

    assert!(matches!(err, ListServiceError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    // Nothing listens on port 1
    let service = AniListService::new(AniListClient::with_base_url("http://127.0.0.1:1/graphql"));

    let err = save(&service).await.unwrap_err();

    assert!(matches!(err, ListServiceError::Network(_)));
    assert!(err.is_transient());
}
