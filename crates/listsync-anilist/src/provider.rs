//! AniListService - IListService implementation for AniList
//!
//! Wraps the [`AniListClient`] and issues the `SaveMediaListEntry` mutation
//! to fulfil the [`IListService`] port contract.
//!
//! ## Design Notes
//!
//! - The mutation document declares every supported variable, but only the
//!   fields present in [`EntryFields`] are put into the `variables` object.
//!   GraphQL treats an undeclared-in-payload variable as an absent argument,
//!   so AniList keeps its current value for it.
//! - The client is cheap to clone and carries no token; the token comes with
//!   every call.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use listsync_core::domain::entry::{EntryFields, MediaListStatus};
use listsync_core::domain::newtypes::{AccessToken, MediaId};
use listsync_core::ports::list_service::{IListService, ListServiceError, SavedEntry};

use crate::client::AniListClient;
use crate::AniListError;

/// Partial-update mutation for one media list entry
pub const SAVE_MEDIA_LIST_ENTRY: &str = r#"
mutation ($mediaId: Int, $status: MediaListStatus, $progress: Int, $score: Float, $private: Boolean) {
  SaveMediaListEntry(mediaId: $mediaId, status: $status, progress: $progress, score: $score, private: $private) {
    id
    status
    progress
    score
    private
  }
}
"#;

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Deserialize)]
struct SaveMediaListEntryData {
    #[serde(rename = "SaveMediaListEntry")]
    save_media_list_entry: Option<MediaListEntryDto>,
}

/// `MediaList` object echoed back by the mutation
#[derive(Debug, Deserialize)]
struct MediaListEntryDto {
    id: Option<i64>,
    status: Option<MediaListStatus>,
    progress: Option<u32>,
    score: Option<f64>,
    private: Option<bool>,
}

impl From<MediaListEntryDto> for SavedEntry {
    fn from(dto: MediaListEntryDto) -> Self {
        SavedEntry {
            id: dto.id,
            status: dto.status,
            progress: dto.progress,
            score: dto.score,
            private: dto.private,
        }
    }
}

/// Builds the `variables` object, leaving out every absent field
pub fn mutation_variables(media_id: MediaId, fields: &EntryFields) -> Value {
    let mut vars = Map::new();
    vars.insert("mediaId".to_string(), json!(media_id.get()));
    if let Some(status) = fields.status {
        vars.insert("status".to_string(), json!(status.as_str()));
    }
    if let Some(progress) = fields.progress {
        vars.insert("progress".to_string(), json!(progress));
    }
    if let Some(score) = fields.score {
        vars.insert("score".to_string(), json!(score));
    }
    if let Some(private) = fields.private {
        vars.insert("private".to_string(), json!(private));
    }
    Value::Object(vars)
}

// ============================================================================
// AniListService
// ============================================================================

/// List service backed by the AniList GraphQL API
#[derive(Debug, Clone, Default)]
pub struct AniListService {
    client: AniListClient,
}

impl AniListService {
    pub fn new(client: AniListClient) -> Self {
        Self { client }
    }

    /// Returns the underlying client
    pub fn client(&self) -> &AniListClient {
        &self.client
    }

    /// Issues `SaveMediaListEntry` and returns the echoed entry
    ///
    /// A successful response without the mutation object (or with null
    /// `data`) yields an empty [`SavedEntry`], which the caller treats as
    /// an unconfirmed save.
    ///
    /// # Errors
    /// Any [`AniListError`] raised by the transport or by GraphQL errors.
    pub async fn save_media_list_entry(
        &self,
        token: &AccessToken,
        media_id: MediaId,
        fields: &EntryFields,
    ) -> Result<SavedEntry, AniListError> {
        debug!(media_id = media_id.get(), %fields, "SaveMediaListEntry");

        let data: Option<SaveMediaListEntryData> = self
            .client
            .graphql_data(
                token.expose(),
                SAVE_MEDIA_LIST_ENTRY,
                mutation_variables(media_id, fields),
            )
            .await?;

        let saved = data.and_then(|d| d.save_media_list_entry);
        if saved.is_none() {
            warn!(media_id = media_id.get(), "SaveMediaListEntry returned no entry");
        }
        Ok(saved.map(SavedEntry::from).unwrap_or_default())
    }
}

#[async_trait]
impl IListService for AniListService {
    async fn save_entry(
        &self,
        token: &AccessToken,
        media_id: MediaId,
        fields: &EntryFields,
    ) -> Result<SavedEntry, ListServiceError> {
        self.save_media_list_entry(token, media_id, fields)
            .await
            .map_err(ListServiceError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media(id: i64) -> MediaId {
        MediaId::new(id).unwrap()
    }

    #[test]
    fn test_variables_only_carry_present_fields() {
        let vars = mutation_variables(media(30013), &EntryFields::progress_only(6));
        assert_eq!(vars, json!({ "mediaId": 30013, "progress": 6 }));
    }

    #[test]
    fn test_variables_with_all_fields() {
        let fields = EntryFields {
            status: Some(MediaListStatus::Completed),
            progress: Some(40),
            score: Some(85.5),
            private: Some(true),
        };
        let vars = mutation_variables(media(7), &fields);
        assert_eq!(
            vars,
            json!({
                "mediaId": 7,
                "status": "COMPLETED",
                "progress": 40,
                "score": 85.5,
                "private": true
            })
        );
    }

    #[test]
    fn test_mutation_document_declares_all_variables() {
        for var in ["$mediaId", "$status", "$progress", "$score", "$private"] {
            assert!(SAVE_MEDIA_LIST_ENTRY.contains(var), "missing {var}");
        }
    }

    #[test]
    fn test_response_deserialization() {
        let json = r#"{
            "SaveMediaListEntry": {
                "id": 123456,
                "status": "CURRENT",
                "progress": 6,
                "score": 0,
                "private": false
            }
        }"#;
        let data: SaveMediaListEntryData = serde_json::from_str(json).unwrap();
        let saved = SavedEntry::from(data.save_media_list_entry.unwrap());
        assert_eq!(saved.id, Some(123456));
        assert_eq!(saved.status, Some(MediaListStatus::Current));
        assert_eq!(saved.progress, Some(6));
    }

    #[test]
    fn test_null_mutation_object_deserializes() {
        let data: SaveMediaListEntryData =
            serde_json::from_str(r#"{ "SaveMediaListEntry": null }"#).unwrap();
        assert!(data.save_media_list_entry.is_none());

        let data: SaveMediaListEntryData = serde_json::from_str("{}").unwrap();
        assert!(data.save_media_list_entry.is_none());
    }

    #[test]
    fn test_response_without_id() {
        let json = r#"{ "SaveMediaListEntry": { "progress": 6 } }"#;
        let data: SaveMediaListEntryData = serde_json::from_str(json).unwrap();
        let saved = SavedEntry::from(data.save_media_list_entry.unwrap());
        assert!(saved.id.is_none());
    }
}
