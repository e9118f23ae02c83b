use super::coerce::parse_song_metadata;
use crate::model::{LogEvent, SongMetadata};
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while reading raw inputs.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed record at {path:?}:{line}: {reason}")]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

/// Read every song-metadata record from `paths`, coercing each one to the
/// declared song schema. Files are read in parallel; record order follows
/// the order of `paths`.
pub fn read_song_metadata(paths: &[PathBuf]) -> Result<Vec<SongMetadata>, SourceError> {
    read_all(paths, parse_song_metadata)
}

/// Read every log event from `paths`.
pub fn read_log_events(paths: &[PathBuf]) -> Result<Vec<LogEvent>, SourceError> {
    read_all(paths, |line| {
        serde_json::from_str::<LogEvent>(line).map_err(|e| e.to_string())
    })
}

fn read_all<T, F>(paths: &[PathBuf], parse: F) -> Result<Vec<T>, SourceError>
where
    T: Send,
    F: Fn(&str) -> Result<T, String> + Sync,
{
    let per_file: Vec<Vec<T>> = paths
        .par_iter()
        .map(|path| read_records(path, &parse))
        .collect::<Result<_, _>>()?;
    Ok(per_file.into_iter().flatten().collect())
}

fn read_records<T, F>(path: &Path, parse: F) -> Result<Vec<T>, SourceError>
where
    F: Fn(&str) -> Result<T, String>,
{
    let io_error = |source| SourceError::Io {
        path: path.to_owned(),
        source,
    };
    let reader = BufReader::new(File::open(path).map_err(io_error)?);

    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| {
            if source.kind() == ErrorKind::InvalidData {
                SourceError::MalformedRecord {
                    path: path.to_owned(),
                    line: index + 1,
                    reason: source.to_string(),
                }
            } else {
                io_error(source)
            }
        })?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record = parse(line).map_err(|reason| SourceError::MalformedRecord {
            path: path.to_owned(),
            line: index + 1,
            reason,
        })?;
        records.push(record);
    }
    debug!("Read {} records from {:?}", records.len(), path);
    Ok(records)
}
