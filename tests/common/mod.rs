//! Common test infrastructure
//!
//! Builds raw input trees laid out like the production feeds, and runs the
//! pipeline against them. Tests should only import from this module, not
//! from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{InputTree, TEST_SONG_ID};
//!
//! #[test]
//! fn test_songplays() {
//!     let tree = InputTree::standard();
//!     tree.run_all().unwrap();
//!     let songplays = tree.read_songplays();
//!     assert!(songplays.iter().any(|p| p.song_id.as_deref() == Some(TEST_SONG_ID)));
//! }
//! ```

mod constants;
mod fixtures;

// Public API - this is what tests import
pub use constants::*;
pub use fixtures::{play_event, song_json, InputTree};
