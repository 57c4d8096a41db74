//! In-memory list service used by the engine tests

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use listsync_core::domain::entry::EntryFields;
use listsync_core::domain::newtypes::{AccessToken, MediaId};
use listsync_core::ports::list_service::{IListService, ListServiceError, SavedEntry};
use tokio_util::sync::CancellationToken;

/// One recorded `save_entry` call
#[derive(Debug, Clone)]
pub struct Call {
    pub media_id: i64,
    pub fields: EntryFields,
    pub at: tokio::time::Instant,
}

/// Scripted fake: per-media queues of responses, permanent failures, and
/// an optional hook that cancels a token while a call is in flight.
///
/// Media without a script succeed with a fresh entry id.
pub struct ScriptedListService {
    calls: Mutex<Vec<Call>>,
    scripts: Mutex<HashMap<i64, VecDeque<Result<SavedEntry, ListServiceError>>>>,
    always_fail: Mutex<HashMap<i64, ListServiceError>>,
    cancel_during: Mutex<Option<(i64, CancellationToken)>>,
    next_id: AtomicI64,
}

impl ScriptedListService {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            scripts: Mutex::new(HashMap::new()),
            always_fail: Mutex::new(HashMap::new()),
            cancel_during: Mutex::new(None),
            next_id: AtomicI64::new(1000),
        }
    }

    /// Queues the next response for `media_id`
    pub fn push(&self, media_id: i64, response: Result<SavedEntry, ListServiceError>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(media_id)
            .or_default()
            .push_back(response);
    }

    /// Makes every call for `media_id` fail with `error`
    pub fn fail_always(&self, media_id: i64, error: ListServiceError) {
        self.always_fail.lock().unwrap().insert(media_id, error);
    }

    /// Cancels `token` while the call for `media_id` is in flight
    pub fn cancel_during(&self, media_id: i64, token: CancellationToken) {
        *self.cancel_during.lock().unwrap() = Some((media_id, token));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Media ids in call order, one per call
    pub fn called_media(&self) -> Vec<i64> {
        self.calls().iter().map(|c| c.media_id).collect()
    }
}

#[async_trait]
impl IListService for ScriptedListService {
    async fn save_entry(
        &self,
        _token: &AccessToken,
        media_id: MediaId,
        fields: &EntryFields,
    ) -> Result<SavedEntry, ListServiceError> {
        let id = media_id.get();
        self.calls.lock().unwrap().push(Call {
            media_id: id,
            fields: fields.clone(),
            at: tokio::time::Instant::now(),
        });

        if let Some((target, token)) = self.cancel_during.lock().unwrap().as_ref() {
            if *target == id {
                token.cancel();
            }
        }

        if let Some(err) = self.always_fail.lock().unwrap().get(&id) {
            return Err(err.clone());
        }

        let scripted = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&id)
            .and_then(VecDeque::pop_front);

        scripted.unwrap_or_else(|| {
            Ok(SavedEntry::with_id(
                self.next_id.fetch_add(1, Ordering::SeqCst),
            ))
        })
    }
}
