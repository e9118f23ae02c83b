//! Songplays fact relation: usage events resolved against the catalog.
//!
//! Resolution is two left-outer joins run one after the other: events to
//! songs on `song == title`, then the result to artists on
//! `artist == name`. The artist join does not look at the song matched by
//! the first join, so an event can end up with a song and an artist that
//! do not belong together when titles and names are ambiguous.

use super::{distinct, NameMatcher};
use crate::model::{ArtistRecord, EnrichedEvent, SongRecord, SongplayRecord};
use chrono::{DateTime, Datelike, Utc};
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::debug;

/// Projected fact row before it gets its surrogate key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ResolvedPlay {
    start_time: DateTime<Utc>,
    user_id: Option<String>,
    level: Option<String>,
    song_id: Option<String>,
    artist_id: Option<String>,
    session_id: Option<i64>,
    location: Option<String>,
    user_agent: Option<String>,
    year: i32,
    month: i32,
}

impl ResolvedPlay {
    fn project(
        play: &EnrichedEvent,
        song: Option<&SongRecord>,
        artist: Option<&ArtistRecord>,
    ) -> Self {
        let event = &play.event;
        Self {
            start_time: play.start_time,
            user_id: event.user_id.clone(),
            level: event.level.clone(),
            song_id: song.and_then(|s| s.song_id.clone()),
            artist_id: artist.and_then(|a| a.artist_id.clone()),
            session_id: event.session_id,
            location: event.location.clone(),
            user_agent: event.user_agent.clone(),
            year: play.start_time.year(),
            month: play.start_time.month() as i32,
        }
    }

    fn into_record(self, songplay_id: i64) -> SongplayRecord {
        SongplayRecord {
            songplay_id,
            start_time: self.start_time,
            user_id: self.user_id,
            level: self.level,
            song_id: self.song_id,
            artist_id: self.artist_id,
            session_id: self.session_id,
            location: self.location,
            user_agent: self.user_agent,
            year: self.year,
            month: self.month,
        }
    }
}

/// Result of a resolution run.
#[derive(Debug)]
pub struct FactResolution {
    pub songplays: Vec<SongplayRecord>,
    /// Joined rows before deduplication.
    pub joined_rows: usize,
    /// Output rows that found a song.
    pub song_matches: usize,
    /// Output rows that found an artist.
    pub artist_matches: usize,
}

type NameIndex<'a, T> = HashMap<String, Vec<&'a T>>;

fn index_by_name<'a, T>(
    rows: &'a [T],
    name: impl Fn(&T) -> Option<&str>,
    matcher: &dyn NameMatcher,
) -> NameIndex<'a, T> {
    let mut index: NameIndex<'a, T> = HashMap::new();
    for row in rows {
        if let Some(key) = name(row).and_then(|n| matcher.join_key(n)) {
            index.entry(key).or_default().push(row);
        }
    }
    index
}

/// Right-side rows matching `name`, or a single `None` when nothing does.
fn left_outer_matches<'a, T>(
    index: &NameIndex<'a, T>,
    name: Option<&str>,
    matcher: &dyn NameMatcher,
) -> Vec<Option<&'a T>> {
    match name
        .and_then(|n| matcher.join_key(n))
        .and_then(|key| index.get(&key))
    {
        Some(rows) => rows.iter().map(|row| Some(*row)).collect(),
        None => vec![None],
    }
}

/// Build the songplays relation.
///
/// Rows are deduplicated before ids are handed out, so two events that
/// project to the same row produce a single songplay. Ids count up from 0
/// and only mean something within this run.
pub fn resolve_songplays(
    plays: &[EnrichedEvent],
    songs: &[SongRecord],
    artists: &[ArtistRecord],
    matcher: &dyn NameMatcher,
) -> FactResolution {
    let song_index = index_by_name(songs, |s| s.title.as_deref(), matcher);
    let artist_index = index_by_name(artists, |a| a.name.as_deref(), matcher);

    let with_songs: Vec<(&EnrichedEvent, Option<&SongRecord>)> = plays
        .par_iter()
        .flat_map_iter(|play| {
            left_outer_matches(&song_index, play.event.song.as_deref(), matcher)
                .into_iter()
                .map(move |song| (play, song))
        })
        .collect();

    let joined: Vec<ResolvedPlay> = with_songs
        .par_iter()
        .flat_map_iter(|&(play, song)| {
            left_outer_matches(&artist_index, play.event.artist.as_deref(), matcher)
                .into_iter()
                .map(move |artist| ResolvedPlay::project(play, song, artist))
        })
        .collect();
    let joined_rows = joined.len();

    let songplays: Vec<SongplayRecord> = distinct(joined)
        .into_iter()
        .zip(0i64..)
        .map(|(row, id)| row.into_record(id))
        .collect();

    let song_matches = songplays.iter().filter(|p| p.song_id.is_some()).count();
    let artist_matches = songplays.iter().filter(|p| p.artist_id.is_some()).count();
    debug!(
        "Resolved {} plays into {} joined rows, {} songplays ({} with song, {} with artist)",
        plays.len(),
        joined_rows,
        songplays.len(),
        song_matches,
        artist_matches
    );

    FactResolution {
        songplays,
        joined_rows,
        song_matches,
        artist_matches,
    }
}
