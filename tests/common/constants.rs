//! Shared constants for end-to-end tests
//!
//! When the fixture data changes, update only this file.

// ============================================================================
// Catalog
// ============================================================================

/// Song every matched play in the standard fixture resolves to
pub const TEST_SONG_ID: &str = "SOSONG1";
pub const TEST_SONG_TITLE: &str = "Test Song";
pub const TEST_SONG_YEAR: i32 = 2000;
pub const TEST_SONG_DURATION: f64 = 200.0;

pub const TEST_ARTIST_ID: &str = "ARTIST1";
pub const TEST_ARTIST_NAME: &str = "Test Artist";

/// Second catalog song, never played
pub const OTHER_SONG_ID: &str = "SOSONG2";
pub const OTHER_ARTIST_ID: &str = "ARTIST2";

// ============================================================================
// Usage log
// ============================================================================

/// Song-play page value
pub const NEXT_SONG: &str = "NextSong";

pub const TEST_USER_ID: i64 = 10;
pub const TEST_SESSION_ID: i64 = 5;

/// 2018-11-02 01:25:34.796 UTC, a Friday in ISO week 44
pub const TEST_TS: i64 = 1541121934796;
pub const TEST_START_SECONDS: i64 = 1541121934;

/// A title the catalog does not know
pub const UNKNOWN_SONG: &str = "Unknown Song";

/// User who only ever logs in and never plays anything
pub const LOGIN_ONLY_USER_ID: i64 = 77;
