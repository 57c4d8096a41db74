//! SyncEntry domain entity
//!
//! A [`SyncEntry`] is one reading-list item to push to the remote list
//! service. It carries the desired remote values and, when the item already
//! exists remotely, a snapshot of the values it had before this sync.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::MediaId;

/// Maximum score accepted by the remote service (100-point scale)
pub const MAX_SCORE: f64 = 100.0;

/// Status of an entry on the remote list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaListStatus {
    /// Currently reading
    Current,
    /// Planning to read
    Planning,
    /// Finished reading
    Completed,
    /// Stopped reading
    Dropped,
    /// Reading on hold
    Paused,
    /// Re-reading
    Repeating,
}

impl MediaListStatus {
    /// Returns the wire representation used by the remote GraphQL schema
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaListStatus::Current => "CURRENT",
            MediaListStatus::Planning => "PLANNING",
            MediaListStatus::Completed => "COMPLETED",
            MediaListStatus::Dropped => "DROPPED",
            MediaListStatus::Paused => "PAUSED",
            MediaListStatus::Repeating => "REPEATING",
        }
    }
}

impl fmt::Display for MediaListStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaListStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CURRENT" => Ok(MediaListStatus::Current),
            "PLANNING" => Ok(MediaListStatus::Planning),
            "COMPLETED" => Ok(MediaListStatus::Completed),
            "DROPPED" => Ok(MediaListStatus::Dropped),
            "PAUSED" => Ok(MediaListStatus::Paused),
            "REPEATING" => Ok(MediaListStatus::Repeating),
            other => Err(DomainError::InvalidStatus(other.to_string())),
        }
    }
}

/// A partial set of list fields submitted in one mutation
///
/// `None` means "leave the remote value as it is": the field is omitted
/// from the request entirely, it is never sent as zero or null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MediaListStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
}

impl EntryFields {
    /// Fields carrying only a progress value
    pub fn progress_only(progress: u32) -> Self {
        Self {
            progress: Some(progress),
            ..Self::default()
        }
    }

    /// Returns true if no field is set
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.progress.is_none()
            && self.score.is_none()
            && self.private.is_none()
    }

    /// Number of fields that will be submitted
    pub fn len(&self) -> usize {
        [
            self.status.is_some(),
            self.progress.is_some(),
            self.score.is_some(),
            self.private.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count()
    }
}

impl fmt::Display for EntryFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(4);
        if let Some(status) = self.status {
            parts.push(format!("status={status}"));
        }
        if let Some(progress) = self.progress {
            parts.push(format!("progress={progress}"));
        }
        if let Some(score) = self.score {
            parts.push(format!("score={score}"));
        }
        if let Some(private) = self.private {
            parts.push(format!("private={private}"));
        }
        if parts.is_empty() {
            f.write_str("(no fields)")
        } else {
            f.write_str(&parts.join(", "))
        }
    }
}

/// Snapshot of the remote entry before this sync
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviousValues {
    pub status: MediaListStatus,
    pub progress: u32,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub private: bool,
}

/// One unit of work in a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncEntry {
    /// Remote identifier of the target item
    pub media_id: MediaId,
    pub target_status: MediaListStatus,
    pub target_progress: u32,
    #[serde(default)]
    pub target_score: f64,
    #[serde(default)]
    pub target_private: bool,
    /// `None` when the item does not exist on the remote list yet
    #[serde(default)]
    pub previous_values: Option<PreviousValues>,
    /// Display only
    #[serde(default)]
    pub title: String,
    /// Display only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
}

impl SyncEntry {
    /// Creates a new entry for an item that does not exist remotely yet
    pub fn new(media_id: MediaId, target_status: MediaListStatus, target_progress: u32) -> Self {
        Self {
            media_id,
            target_status,
            target_progress,
            target_score: 0.0,
            target_private: false,
            previous_values: None,
            title: String::new(),
            cover_image: None,
        }
    }

    /// Sets the display title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the target score
    pub fn with_score(mut self, score: f64) -> Self {
        self.target_score = score;
        self
    }

    /// Sets the target private flag
    pub fn with_private(mut self, private: bool) -> Self {
        self.target_private = private;
        self
    }

    /// Attaches the remote snapshot taken before this sync
    pub fn with_previous(mut self, previous: PreviousValues) -> Self {
        self.previous_values = Some(previous);
        self
    }

    /// Returns true if the item does not exist on the remote list yet
    pub fn is_new(&self) -> bool {
        self.previous_values.is_none()
    }

    /// The complete set of desired remote values
    pub fn target_fields(&self) -> EntryFields {
        EntryFields {
            status: Some(self.target_status),
            progress: Some(self.target_progress),
            score: Some(self.target_score),
            private: Some(self.target_private),
        }
    }

    /// Progress increase over the remote snapshot
    ///
    /// Returns `None` for new entries. Negative when the target is behind
    /// the remote value.
    pub fn progress_delta(&self) -> Option<i64> {
        self.previous_values
            .as_ref()
            .map(|prev| i64::from(self.target_progress) - i64::from(prev.progress))
    }

    /// Label used in logs and progress output
    pub fn display_name(&self) -> String {
        if self.title.is_empty() {
            format!("media {}", self.media_id)
        } else {
            self.title.clone()
        }
    }

    /// Checks value ranges the remote service would reject
    ///
    /// # Errors
    /// Returns [`DomainError::ValidationFailed`] when the score is outside
    /// `0..=100` or not a finite number.
    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.target_score.is_finite() || !(0.0..=MAX_SCORE).contains(&self.target_score) {
            return Err(DomainError::ValidationFailed(format!(
                "score for media {} must be within 0..={MAX_SCORE}, got {}",
                self.media_id, self.target_score
            )));
        }
        Ok(())
    }
}
