//! Users dimension and the enriched song-play stream from raw log events.

use super::distinct;
use crate::model::{EnrichedEvent, LogEvent, UserRecord};
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tracing::debug;

/// Output of the usage-log extraction.
pub struct UsageTables {
    pub users: Vec<UserRecord>,
    /// Song-play events only, each with its derived start time.
    pub plays: Vec<EnrichedEvent>,
    /// How many raw events were discarded by the page filter.
    pub discarded: usize,
}

/// Convert a millisecond epoch timestamp to a UTC start time.
///
/// The milliseconds are floor-divided away before conversion, so the result
/// always lands on a whole second.
pub fn start_time_from_millis(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts.div_euclid(1000), 0)
}

pub fn is_song_play(event: &LogEvent, song_play_page: &str) -> bool {
    event.page.as_deref() == Some(song_play_page)
}

fn enrich(event: LogEvent) -> Result<EnrichedEvent> {
    let ts = event.ts.ok_or_else(|| {
        anyhow!(
            "Song-play event without ts (user {:?}, session {:?})",
            event.user_id,
            event.session_id
        )
    })?;
    let start_time = start_time_from_millis(ts)
        .ok_or_else(|| anyhow!("Song-play event ts {} is out of range", ts))?;
    Ok(EnrichedEvent { event, start_time })
}

/// Keep only song-play events, project the users dimension from them and
/// attach the derived start time to each one.
pub fn extract_usage(events: Vec<LogEvent>, song_play_page: &str) -> Result<UsageTables> {
    let total = events.len();
    let plays: Vec<LogEvent> = events
        .into_par_iter()
        .filter(|event| is_song_play(event, song_play_page))
        .collect();
    let discarded = total - plays.len();

    let users = distinct(plays.par_iter().map(UserRecord::from).collect());
    let plays = plays
        .into_par_iter()
        .map(enrich)
        .collect::<Result<Vec<_>>>()?;

    debug!(
        "Kept {} song plays out of {} log events, {} distinct users",
        plays.len(),
        total,
        users.len()
    );
    Ok(UsageTables {
        users,
        plays,
        discarded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(user_id: &str, page: &str, level: &str, ts: i64) -> LogEvent {
        LogEvent {
            user_id: Some(user_id.to_owned()),
            first_name: Some("Lily".to_owned()),
            last_name: Some("Koch".to_owned()),
            gender: Some("F".to_owned()),
            level: Some(level.to_owned()),
            page: Some(page.to_owned()),
            ts: Some(ts),
            song: Some("Song".to_owned()),
            artist: Some("Artist".to_owned()),
            session_id: Some(1),
            ..Default::default()
        }
    }

    #[test]
    fn start_time_drops_sub_second_precision() {
        let start = start_time_from_millis(1541121934796).unwrap();
        assert_eq!(start, Utc.timestamp_opt(1541121934, 0).unwrap());
        assert_eq!(start.timestamp_subsec_millis(), 0);
    }

    #[test]
    fn start_time_floors_negative_timestamps() {
        let start = start_time_from_millis(-1).unwrap();
        assert_eq!(start.timestamp(), -1);
    }

    #[test]
    fn only_song_plays_are_kept() {
        let events = vec![
            event("10", "NextSong", "paid", 1000),
            event("11", "Login", "free", 2000),
            event("12", "Home", "free", 3000),
        ];

        let tables = extract_usage(events, "NextSong").unwrap();
        assert_eq!(tables.plays.len(), 1);
        assert_eq!(tables.discarded, 2);
        assert_eq!(tables.users.len(), 1);
        assert_eq!(tables.users[0].user_id.as_deref(), Some("10"));
    }

    #[test]
    fn level_change_yields_one_user_row_per_level() {
        let events = vec![
            event("10", "NextSong", "free", 1000),
            event("10", "NextSong", "free", 2000),
            event("10", "NextSong", "paid", 3000),
        ];

        let tables = extract_usage(events, "NextSong").unwrap();
        assert_eq!(tables.users.len(), 2);
        assert_eq!(tables.plays.len(), 3);
    }

    #[test]
    fn page_match_is_exact() {
        let events = vec![event("10", "nextsong", "free", 1000)];
        let tables = extract_usage(events, "NextSong").unwrap();
        assert!(tables.plays.is_empty());
        assert!(tables.users.is_empty());
    }

    #[test]
    fn song_play_without_ts_fails() {
        let mut play = event("10", "NextSong", "free", 0);
        play.ts = None;
        let mut login = event("10", "Login", "free", 0);
        login.ts = None;

        assert!(extract_usage(vec![login], "NextSong").is_ok());
        assert!(extract_usage(vec![play], "NextSong").is_err());
    }
}
