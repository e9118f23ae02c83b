use chrono::{DateTime, Utc};

/// Row of the `time` dimension. Every field besides `start_time` is
/// derived from it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TimeRecord {
    pub start_time: DateTime<Utc>,
    pub hour: i32,
    pub day: i32,
    pub week: i32,
    pub month: i32,
    pub year: i32,
    /// 1 = Sunday ... 7 = Saturday.
    pub weekday: i32,
}
