//! Reading raw newline-delimited JSON inputs.
//!
//! The pipeline only ever sees explicit lists of files; turning a data
//! directory into such a list is done by [`discover_files`] at the edge.

mod coerce;
mod discovery;
mod ndjson;

pub use discovery::{discover_files, LOG_DATA_DEPTH, SONG_DATA_DEPTH};
pub(crate) use discovery::is_ignored;
pub use ndjson::{read_log_events, read_song_metadata, SourceError};
