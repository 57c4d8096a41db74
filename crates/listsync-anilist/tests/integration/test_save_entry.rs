//! Integration tests for SaveMediaListEntry mutations

use listsync_core::domain::entry::{EntryFields, MediaListStatus};
use listsync_core::ports::list_service::{IListService, SavedEntry};
use wiremock::{
    matchers::{method, path},
    Mock, ResponseTemplate,
};

use crate::common;

#[tokio::test]
async fn test_save_entry_returns_remote_id() {
    let (server, service) = common::setup_anilist_mock().await;
    common::mount_save_success(&server, 987654).await;

    let saved = service
        .save_entry(&common::token(), common::media(30013), &EntryFields::progress_only(6))
        .await
        .expect("save failed");

    assert_eq!(saved.id, Some(987654));
    assert_eq!(saved.status, Some(MediaListStatus::Current));
    assert_eq!(saved.progress, Some(6));
}

#[tokio::test]
async fn test_save_entry_sends_only_present_fields() {
    let (server, service) = common::setup_anilist_mock().await;
    common::mount_save_success(&server, 1).await;

    service
        .save_entry(&common::token(), common::media(30013), &EntryFields::progress_only(6))
        .await
        .expect("save failed");

    let vars = common::received_variables(&server).await;
    assert_eq!(vars.len(), 1);
    assert_eq!(vars[0], serde_json::json!({ "mediaId": 30013, "progress": 6 }));
    assert!(vars[0].get("status").is_none());
    assert!(vars[0].get("score").is_none());
}

#[tokio::test]
async fn test_save_entry_sends_full_field_set() {
    let (server, service) = common::setup_anilist_mock().await;
    common::mount_save_success(&server, 1).await;

    let fields = EntryFields {
        status: Some(MediaListStatus::Completed),
        progress: Some(12),
        score: Some(90.0),
        private: Some(false),
    };
    service
        .save_entry(&common::token(), common::media(5), &fields)
        .await
        .expect("save failed");

    let vars = common::received_variables(&server).await;
    assert_eq!(vars[0]["status"], "COMPLETED");
    assert_eq!(vars[0]["progress"], 12);
    assert_eq!(vars[0]["score"], 90.0);
    assert_eq!(vars[0]["private"], false);
}

#[tokio::test]
async fn test_save_entry_without_id_is_passed_through() {
    let (server, service) = common::setup_anilist_mock().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": { "SaveMediaListEntry": { "progress": 6 } }
        })))
        .mount(&server)
        .await;

    let saved = service
        .save_entry(&common::token(), common::media(1), &EntryFields::progress_only(6))
        .await
        .expect("save failed");

    assert!(saved.id.is_none());
}

#[tokio::test]
async fn test_save_entry_null_mutation_object_is_unconfirmed() {
    let (server, service) = common::setup_anilist_mock().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": { "SaveMediaListEntry": null }
        })))
        .mount(&server)
        .await;

    let saved = service
        .save_entry(&common::token(), common::media(1), &EntryFields::progress_only(6))
        .await
        .expect("null mutation object should not be an error");

    assert_eq!(saved, SavedEntry::default());
}

#[tokio::test]
async fn test_save_entry_null_data_is_unconfirmed() {
    let (server, service) = common::setup_anilist_mock().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": null
        })))
        .mount(&server)
        .await;

    let saved = service
        .save_entry(&common::token(), common::media(1), &EntryFields::progress_only(6))
        .await
        .expect("null data should not be an error");

    assert!(saved.id.is_none());
}
