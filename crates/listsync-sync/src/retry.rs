//! Retry selector
//!
//! Picks the entries of an earlier batch that failed, so they can be
//! re-submitted as a fresh, independent batch.

use std::collections::HashSet;

use listsync_core::domain::entry::SyncEntry;
use listsync_core::domain::newtypes::MediaId;
use listsync_core::domain::report::SyncReport;

/// Returns the entries of `original` whose media id is listed in
/// `prior.errors`, in their original relative order.
pub fn select_retryable(original: &[SyncEntry], prior: &SyncReport) -> Vec<SyncEntry> {
    let failed: HashSet<MediaId> = prior.errors.iter().map(|e| e.media_id).collect();

    original
        .iter()
        .filter(|entry| failed.contains(&entry.media_id))
        .cloned()
        .collect()
}
