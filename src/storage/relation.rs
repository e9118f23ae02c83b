//! Arrow layout of the five output relations.

use super::StorageError;
use crate::model::{ArtistRecord, SongRecord, SongplayRecord, TimeRecord, UserRecord};
use arrow::array::{
    Array, ArrayRef, Float64Array, Int32Array, Int64Array, PrimitiveArray, StringArray,
    TimestampMicrosecondArray,
};
use arrow::datatypes::{ArrowPrimitiveType, DataType, Field, Schema, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// A row type that can be stored as a named, optionally partitioned relation.
pub trait Relation: Sized + Send + Sync {
    /// Directory name of the relation under the output root.
    const NAME: &'static str;

    /// Columns encoded in the directory layout instead of the data files,
    /// outermost first.
    const PARTITION_COLUMNS: &'static [&'static str];

    /// Full schema, partition columns included.
    fn schema() -> SchemaRef;

    /// Partition values of this row, in `PARTITION_COLUMNS` order.
    fn partition_values(&self) -> Vec<Option<String>>;

    fn to_batch(rows: &[&Self]) -> Result<RecordBatch, StorageError>;

    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>, StorageError>;
}

fn timestamp_type() -> DataType {
    DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into()))
}

fn timestamp_array(values: impl Iterator<Item = DateTime<Utc>>) -> ArrayRef {
    Arc::new(
        TimestampMicrosecondArray::from_iter_values(values.map(|t| t.timestamp_micros()))
            .with_timezone("UTC"),
    )
}

fn strings<'a>(values: impl Iterator<Item = Option<&'a str>>) -> ArrayRef {
    Arc::new(values.collect::<StringArray>())
}

fn column<'a, A: Array + 'static>(
    batch: &'a RecordBatch,
    relation: &'static str,
    name: &str,
) -> Result<&'a A, StorageError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| StorageError::layout(relation, format!("missing column '{}'", name)))?
        .as_any()
        .downcast_ref::<A>()
        .ok_or_else(|| StorageError::layout(relation, format!("column '{}' has the wrong type", name)))
}

fn opt_string(array: &StringArray, i: usize) -> Option<String> {
    array.is_valid(i).then(|| array.value(i).to_owned())
}

fn opt_value<T: ArrowPrimitiveType>(array: &PrimitiveArray<T>, i: usize) -> Option<T::Native> {
    array.is_valid(i).then(|| array.value(i))
}

fn required<T>(value: Option<T>, relation: &'static str, name: &str) -> Result<T, StorageError> {
    value.ok_or_else(|| StorageError::layout(relation, format!("null in required column '{}'", name)))
}

fn timestamp_at(
    array: &TimestampMicrosecondArray,
    i: usize,
    relation: &'static str,
) -> Result<DateTime<Utc>, StorageError> {
    let micros = required(opt_value(array, i), relation, "start_time")?;
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| StorageError::layout(relation, format!("start_time {} out of range", micros)))
}

impl Relation for SongRecord {
    const NAME: &'static str = "songs";
    const PARTITION_COLUMNS: &'static [&'static str] = &["year", "artist_id"];

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("song_id", DataType::Utf8, true),
            Field::new("title", DataType::Utf8, true),
            Field::new("artist_id", DataType::Utf8, true),
            Field::new("year", DataType::Int32, true),
            Field::new("duration", DataType::Float64, true),
        ]))
    }

    fn partition_values(&self) -> Vec<Option<String>> {
        vec![self.year.map(|y| y.to_string()), self.artist_id.clone()]
    }

    fn to_batch(rows: &[&Self]) -> Result<RecordBatch, StorageError> {
        let columns: Vec<ArrayRef> = vec![
            strings(rows.iter().map(|r| r.song_id.as_deref())),
            strings(rows.iter().map(|r| r.title.as_deref())),
            strings(rows.iter().map(|r| r.artist_id.as_deref())),
            Arc::new(rows.iter().map(|r| r.year).collect::<Int32Array>()),
            Arc::new(rows.iter().map(|r| r.duration).collect::<Float64Array>()),
        ];
        Ok(RecordBatch::try_new(Self::schema(), columns)?)
    }

    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>, StorageError> {
        let song_id = column::<StringArray>(batch, Self::NAME, "song_id")?;
        let title = column::<StringArray>(batch, Self::NAME, "title")?;
        let artist_id = column::<StringArray>(batch, Self::NAME, "artist_id")?;
        let year = column::<Int32Array>(batch, Self::NAME, "year")?;
        let duration = column::<Float64Array>(batch, Self::NAME, "duration")?;

        Ok((0..batch.num_rows())
            .map(|i| SongRecord {
                song_id: opt_string(song_id, i),
                title: opt_string(title, i),
                artist_id: opt_string(artist_id, i),
                year: opt_value(year, i),
                duration: opt_value(duration, i),
            })
            .collect())
    }
}

impl Relation for ArtistRecord {
    const NAME: &'static str = "artists";
    const PARTITION_COLUMNS: &'static [&'static str] = &[];

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("artist_id", DataType::Utf8, true),
            Field::new("name", DataType::Utf8, true),
            Field::new("location", DataType::Utf8, true),
            Field::new("latitude", DataType::Float64, true),
            Field::new("longitude", DataType::Float64, true),
        ]))
    }

    fn partition_values(&self) -> Vec<Option<String>> {
        Vec::new()
    }

    fn to_batch(rows: &[&Self]) -> Result<RecordBatch, StorageError> {
        let columns: Vec<ArrayRef> = vec![
            strings(rows.iter().map(|r| r.artist_id.as_deref())),
            strings(rows.iter().map(|r| r.name.as_deref())),
            strings(rows.iter().map(|r| r.location.as_deref())),
            Arc::new(rows.iter().map(|r| r.latitude).collect::<Float64Array>()),
            Arc::new(rows.iter().map(|r| r.longitude).collect::<Float64Array>()),
        ];
        Ok(RecordBatch::try_new(Self::schema(), columns)?)
    }

    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>, StorageError> {
        let artist_id = column::<StringArray>(batch, Self::NAME, "artist_id")?;
        let name = column::<StringArray>(batch, Self::NAME, "name")?;
        let location = column::<StringArray>(batch, Self::NAME, "location")?;
        let latitude = column::<Float64Array>(batch, Self::NAME, "latitude")?;
        let longitude = column::<Float64Array>(batch, Self::NAME, "longitude")?;

        Ok((0..batch.num_rows())
            .map(|i| ArtistRecord {
                artist_id: opt_string(artist_id, i),
                name: opt_string(name, i),
                location: opt_string(location, i),
                latitude: opt_value(latitude, i),
                longitude: opt_value(longitude, i),
            })
            .collect())
    }
}

impl Relation for UserRecord {
    const NAME: &'static str = "users";
    const PARTITION_COLUMNS: &'static [&'static str] = &[];

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("user_id", DataType::Utf8, true),
            Field::new("first_name", DataType::Utf8, true),
            Field::new("last_name", DataType::Utf8, true),
            Field::new("gender", DataType::Utf8, true),
            Field::new("level", DataType::Utf8, true),
        ]))
    }

    fn partition_values(&self) -> Vec<Option<String>> {
        Vec::new()
    }

    fn to_batch(rows: &[&Self]) -> Result<RecordBatch, StorageError> {
        let columns: Vec<ArrayRef> = vec![
            strings(rows.iter().map(|r| r.user_id.as_deref())),
            strings(rows.iter().map(|r| r.first_name.as_deref())),
            strings(rows.iter().map(|r| r.last_name.as_deref())),
            strings(rows.iter().map(|r| r.gender.as_deref())),
            strings(rows.iter().map(|r| r.level.as_deref())),
        ];
        Ok(RecordBatch::try_new(Self::schema(), columns)?)
    }

    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>, StorageError> {
        let user_id = column::<StringArray>(batch, Self::NAME, "user_id")?;
        let first_name = column::<StringArray>(batch, Self::NAME, "first_name")?;
        let last_name = column::<StringArray>(batch, Self::NAME, "last_name")?;
        let gender = column::<StringArray>(batch, Self::NAME, "gender")?;
        let level = column::<StringArray>(batch, Self::NAME, "level")?;

        Ok((0..batch.num_rows())
            .map(|i| UserRecord {
                user_id: opt_string(user_id, i),
                first_name: opt_string(first_name, i),
                last_name: opt_string(last_name, i),
                gender: opt_string(gender, i),
                level: opt_string(level, i),
            })
            .collect())
    }
}

impl Relation for TimeRecord {
    const NAME: &'static str = "time";
    const PARTITION_COLUMNS: &'static [&'static str] = &["year", "month"];

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("start_time", timestamp_type(), false),
            Field::new("hour", DataType::Int32, false),
            Field::new("day", DataType::Int32, false),
            Field::new("week", DataType::Int32, false),
            Field::new("month", DataType::Int32, false),
            Field::new("year", DataType::Int32, false),
            Field::new("weekday", DataType::Int32, false),
        ]))
    }

    fn partition_values(&self) -> Vec<Option<String>> {
        vec![Some(self.year.to_string()), Some(self.month.to_string())]
    }

    fn to_batch(rows: &[&Self]) -> Result<RecordBatch, StorageError> {
        let ints = |f: fn(&TimeRecord) -> i32| -> ArrayRef {
            Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| f(r))))
        };
        let columns: Vec<ArrayRef> = vec![
            timestamp_array(rows.iter().map(|r| r.start_time)),
            ints(|r| r.hour),
            ints(|r| r.day),
            ints(|r| r.week),
            ints(|r| r.month),
            ints(|r| r.year),
            ints(|r| r.weekday),
        ];
        Ok(RecordBatch::try_new(Self::schema(), columns)?)
    }

    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>, StorageError> {
        let start_time = column::<TimestampMicrosecondArray>(batch, Self::NAME, "start_time")?;
        let hour = column::<Int32Array>(batch, Self::NAME, "hour")?;
        let day = column::<Int32Array>(batch, Self::NAME, "day")?;
        let week = column::<Int32Array>(batch, Self::NAME, "week")?;
        let month = column::<Int32Array>(batch, Self::NAME, "month")?;
        let year = column::<Int32Array>(batch, Self::NAME, "year")?;
        let weekday = column::<Int32Array>(batch, Self::NAME, "weekday")?;

        (0..batch.num_rows())
            .map(|i| {
                Ok(TimeRecord {
                    start_time: timestamp_at(start_time, i, Self::NAME)?,
                    hour: required(opt_value(hour, i), Self::NAME, "hour")?,
                    day: required(opt_value(day, i), Self::NAME, "day")?,
                    week: required(opt_value(week, i), Self::NAME, "week")?,
                    month: required(opt_value(month, i), Self::NAME, "month")?,
                    year: required(opt_value(year, i), Self::NAME, "year")?,
                    weekday: required(opt_value(weekday, i), Self::NAME, "weekday")?,
                })
            })
            .collect()
    }
}

impl Relation for SongplayRecord {
    const NAME: &'static str = "songplays";
    const PARTITION_COLUMNS: &'static [&'static str] = &["year", "month"];

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("songplay_id", DataType::Int64, false),
            Field::new("start_time", timestamp_type(), false),
            Field::new("user_id", DataType::Utf8, true),
            Field::new("level", DataType::Utf8, true),
            Field::new("song_id", DataType::Utf8, true),
            Field::new("artist_id", DataType::Utf8, true),
            Field::new("session_id", DataType::Int64, true),
            Field::new("location", DataType::Utf8, true),
            Field::new("user_agent", DataType::Utf8, true),
            Field::new("year", DataType::Int32, false),
            Field::new("month", DataType::Int32, false),
        ]))
    }

    fn partition_values(&self) -> Vec<Option<String>> {
        vec![Some(self.year.to_string()), Some(self.month.to_string())]
    }

    fn to_batch(rows: &[&Self]) -> Result<RecordBatch, StorageError> {
        let columns: Vec<ArrayRef> = vec![
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.songplay_id))),
            timestamp_array(rows.iter().map(|r| r.start_time)),
            strings(rows.iter().map(|r| r.user_id.as_deref())),
            strings(rows.iter().map(|r| r.level.as_deref())),
            strings(rows.iter().map(|r| r.song_id.as_deref())),
            strings(rows.iter().map(|r| r.artist_id.as_deref())),
            Arc::new(rows.iter().map(|r| r.session_id).collect::<Int64Array>()),
            strings(rows.iter().map(|r| r.location.as_deref())),
            strings(rows.iter().map(|r| r.user_agent.as_deref())),
            Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.year))),
            Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.month))),
        ];
        Ok(RecordBatch::try_new(Self::schema(), columns)?)
    }

    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>, StorageError> {
        let songplay_id = column::<Int64Array>(batch, Self::NAME, "songplay_id")?;
        let start_time = column::<TimestampMicrosecondArray>(batch, Self::NAME, "start_time")?;
        let user_id = column::<StringArray>(batch, Self::NAME, "user_id")?;
        let level = column::<StringArray>(batch, Self::NAME, "level")?;
        let song_id = column::<StringArray>(batch, Self::NAME, "song_id")?;
        let artist_id = column::<StringArray>(batch, Self::NAME, "artist_id")?;
        let session_id = column::<Int64Array>(batch, Self::NAME, "session_id")?;
        let location = column::<StringArray>(batch, Self::NAME, "location")?;
        let user_agent = column::<StringArray>(batch, Self::NAME, "user_agent")?;
        let year = column::<Int32Array>(batch, Self::NAME, "year")?;
        let month = column::<Int32Array>(batch, Self::NAME, "month")?;

        (0..batch.num_rows())
            .map(|i| {
                Ok(SongplayRecord {
                    songplay_id: required(opt_value(songplay_id, i), Self::NAME, "songplay_id")?,
                    start_time: timestamp_at(start_time, i, Self::NAME)?,
                    user_id: opt_string(user_id, i),
                    level: opt_string(level, i),
                    song_id: opt_string(song_id, i),
                    artist_id: opt_string(artist_id, i),
                    session_id: opt_value(session_id, i),
                    location: opt_string(location, i),
                    user_agent: opt_string(user_agent, i),
                    year: required(opt_value(year, i), Self::NAME, "year")?,
                    month: required(opt_value(month, i), Self::NAME, "month")?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::time_record;
    use chrono::TimeZone;

    #[test]
    fn song_batch_keeps_nulls() {
        let song = SongRecord {
            song_id: Some("S1".to_owned()),
            title: None,
            artist_id: Some("A1".to_owned()),
            year: None,
            duration: Some(12.5),
        };
        let batch = SongRecord::to_batch(&[&song]).unwrap();
        assert_eq!(batch.num_rows(), 1);
        assert_eq!(SongRecord::from_batch(&batch).unwrap(), vec![song]);
    }

    #[test]
    fn time_batch_keeps_utc_timestamps() {
        let record = time_record(Utc.timestamp_opt(1541121934, 0).unwrap());
        let batch = TimeRecord::to_batch(&[&record]).unwrap();
        assert_eq!(batch.schema().field(0).data_type(), &timestamp_type());
        assert_eq!(TimeRecord::from_batch(&batch).unwrap(), vec![record]);
    }

    #[test]
    fn missing_column_is_a_layout_error() {
        let batch = UserRecord::to_batch(&[]).unwrap();
        let result = ArtistRecord::from_batch(&batch);
        assert!(matches!(result, Err(StorageError::Layout { .. })));
    }

    #[test]
    fn partition_values_follow_partition_columns() {
        let song = SongRecord {
            year: Some(2000),
            artist_id: None,
            ..Default::default()
        };
        assert_eq!(song.partition_values(), vec![Some("2000".to_owned()), None]);
        assert_eq!(
            song.partition_values().len(),
            SongRecord::PARTITION_COLUMNS.len()
        );
    }
}
