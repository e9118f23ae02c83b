use chrono::{DateTime, Utc};

/// Row of the `songplays` fact relation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SongplayRecord {
    /// Surrogate key, unique within the run that produced it.
    pub songplay_id: i64,
    pub start_time: DateTime<Utc>,
    pub user_id: Option<String>,
    pub level: Option<String>,
    pub song_id: Option<String>,
    pub artist_id: Option<String>,
    pub session_id: Option<i64>,
    pub location: Option<String>,
    pub user_agent: Option<String>,
    pub year: i32,
    pub month: i32,
}
