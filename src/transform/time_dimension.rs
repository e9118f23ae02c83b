//! Time dimension derived from song-play start times.

use super::distinct;
use crate::model::{EnrichedEvent, TimeRecord};
use chrono::{DateTime, Datelike, Timelike, Utc};
use rayon::prelude::*;

/// Derive the calendar fields of `start_time`. The week is the ISO 8601
/// week number; the weekday counts from Sunday = 1.
pub fn time_record(start_time: DateTime<Utc>) -> TimeRecord {
    TimeRecord {
        start_time,
        hour: start_time.hour() as i32,
        day: start_time.day() as i32,
        week: start_time.iso_week().week() as i32,
        month: start_time.month() as i32,
        year: start_time.year(),
        weekday: start_time.weekday().number_from_sunday() as i32,
    }
}

pub fn build_time_dimension(plays: &[EnrichedEvent]) -> Vec<TimeRecord> {
    distinct(
        plays
            .par_iter()
            .map(|play| time_record(play.start_time))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LogEvent;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn derives_calendar_fields() {
        // 2018-11-02 01:25:34 UTC, a Friday
        let record = time_record(at(1541121934));
        assert_eq!(record.hour, 1);
        assert_eq!(record.day, 2);
        assert_eq!(record.week, 44);
        assert_eq!(record.month, 11);
        assert_eq!(record.year, 2018);
        assert_eq!(record.weekday, 6);
    }

    #[test]
    fn iso_week_at_year_boundary() {
        // 2018-12-31 is a Monday in ISO week 1 of 2019
        let record = time_record(Utc.with_ymd_and_hms(2018, 12, 31, 12, 0, 0).unwrap());
        assert_eq!(record.week, 1);
        assert_eq!(record.year, 2018);
        assert_eq!(record.weekday, 2);

        // 2017-01-01 is a Sunday in ISO week 52 of 2016
        let record = time_record(Utc.with_ymd_and_hms(2017, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(record.week, 52);
        assert_eq!(record.weekday, 1);
    }

    #[test]
    fn derivation_is_repeatable() {
        for secs in [0, 1541121934, 1543622400, 1546300799] {
            assert_eq!(time_record(at(secs)), time_record(at(secs)));
        }
    }

    #[test]
    fn one_row_per_start_time() {
        let play = |secs| EnrichedEvent {
            event: LogEvent::default(),
            start_time: at(secs),
        };
        let plays = vec![play(100), play(100), play(200)];

        let rows = build_time_dimension(&plays);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].start_time, at(100));
        assert_eq!(rows[1].start_time, at(200));
    }
}
