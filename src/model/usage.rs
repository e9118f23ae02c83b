use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One raw application log event.
///
/// Only the fields the warehouse uses are kept; the feed also carries
/// `auth`, `itemInSession`, `length`, `method`, `registration` and `status`,
/// which are ignored.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    pub artist: Option<String>,
    pub first_name: Option<String>,
    pub gender: Option<String>,
    pub last_name: Option<String>,
    pub level: Option<String>,
    pub location: Option<String>,
    pub page: Option<String>,
    pub session_id: Option<i64>,
    pub song: Option<String>,
    pub ts: Option<i64>,
    pub user_agent: Option<String>,
    #[serde(default, deserialize_with = "deserialize_user_id")]
    pub user_id: Option<String>,
}

/// The feed writes user ids as strings (`"39"`, or `""` while logged out),
/// older dumps write them as integers. Both end up as text.
fn deserialize_user_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "userId must be a string or an integer, got {}",
            other
        ))),
    }
}

/// A song-play event with its derived start time.
#[derive(Clone, Debug, PartialEq)]
pub struct EnrichedEvent {
    pub event: LogEvent,
    pub start_time: DateTime<Utc>,
}

/// Row of the `users` dimension.
///
/// A user who switched level between events shows up once per level.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct UserRecord {
    pub user_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: Option<String>,
}

impl From<&LogEvent> for UserRecord {
    fn from(event: &LogEvent) -> Self {
        Self {
            user_id: event.user_id.clone(),
            first_name: event.first_name.clone(),
            last_name: event.last_name.clone(),
            gender: event.gender.clone(),
            level: event.level.clone(),
        }
    }
}
