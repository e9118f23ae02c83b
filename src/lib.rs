//! Pezzottify Warehouse Library
//!
//! Builds the listening analytics star schema (songs, artists, users, time
//! and songplays) from raw song metadata and usage logs.

pub mod config;
pub mod model;
pub mod pipeline;
pub mod source;
pub mod storage;
pub mod transform;

// Re-export commonly used types for convenience
pub use pipeline::{run, run_pipeline, PipelineContext, PipelineInputs, PipelineStage, RunSummary};
pub use storage::{Relation, RelationStore, StorageError};
