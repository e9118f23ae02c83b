//! The relational transforms that turn raw records into the star schema.
//!
//! Every function here is pure: it takes owned or borrowed rows and returns
//! new rows. Reading inputs and writing relations belongs to the pipeline.

mod dedup;
pub mod fact_resolver;
pub mod matcher;
pub mod song_catalog;
pub mod time_dimension;
pub mod usage_log;

pub use dedup::distinct;
pub use fact_resolver::{resolve_songplays, FactResolution};
pub use matcher::{ExactMatcher, MatcherKind, NameMatcher, NormalizedMatcher};
pub use song_catalog::{extract_catalog, CatalogTables};
pub use time_dimension::{build_time_dimension, time_record};
pub use usage_log::{extract_usage, is_song_play, start_time_from_millis, UsageTables};
