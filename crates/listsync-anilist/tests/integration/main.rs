//! Integration tests for listsync-anilist
//!
//! Uses wiremock to simulate the AniList GraphQL endpoint and verifies
//! end-to-end behavior of the client and the list service adapter.

mod common;

mod test_errors;
mod test_save_entry;
