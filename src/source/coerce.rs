//! Declared-schema coercion for song metadata.
//!
//! A field whose JSON value does not fit the declared type becomes null;
//! the rest of the record is kept.

use crate::model::SongMetadata;
use serde_json::{Map, Value};

pub(crate) fn parse_song_metadata(line: &str) -> Result<SongMetadata, String> {
    let value: Value = serde_json::from_str(line).map_err(|e| e.to_string())?;
    let fields = match value {
        Value::Object(fields) => fields,
        other => return Err(format!("expected a JSON object, got {}", json_kind(&other))),
    };

    Ok(SongMetadata {
        artist_id: string_field(&fields, "artist_id"),
        artist_latitude: double_field(&fields, "artist_latitude"),
        artist_location: string_field(&fields, "artist_location"),
        artist_longitude: double_field(&fields, "artist_longitude"),
        artist_name: string_field(&fields, "artist_name"),
        duration: double_field(&fields, "duration"),
        num_songs: double_field(&fields, "num_songs"),
        song_id: string_field(&fields, "song_id"),
        title: string_field(&fields, "title"),
        year: int_field(&fields, "year"),
    })
}

fn string_field(fields: &Map<String, Value>, name: &str) -> Option<String> {
    match fields.get(name)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn double_field(fields: &Map<String, Value>, name: &str) -> Option<f64> {
    fields.get(name)?.as_f64()
}

fn int_field(fields: &Map<String, Value>, name: &str) -> Option<i32> {
    fields
        .get(name)?
        .as_i64()
        .and_then(|n| i32::try_from(n).ok())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
