//! Input tree fixtures
//!
//! Song metadata is laid out as `song_data/<A>/<B>/<C>/<file>.json` with one
//! record per file, usage logs as `log_data/<year>/<month>/<file>.json` with
//! one event per line.

use super::constants::*;
use anyhow::Result;
use pezzottify_warehouse::config::{AppConfig, CliConfig};
use pezzottify_warehouse::model::{SongplayRecord, TimeRecord, UserRecord};
use pezzottify_warehouse::pipeline::{run, PipelineContext, PipelineInputs, PipelineStage, RunSummary};
use pezzottify_warehouse::source::{discover_files, LOG_DATA_DEPTH, SONG_DATA_DEPTH};
use pezzottify_warehouse::storage::{Relation, RelationStore};
use pezzottify_warehouse::transform::MatcherKind;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// One song metadata record in the raw feed format.
pub fn song_json(
    song_id: &str,
    title: &str,
    artist_id: &str,
    artist_name: &str,
    year: i32,
    duration: f64,
) -> Value {
    json!({
        "num_songs": 1,
        "artist_id": artist_id,
        "artist_latitude": null,
        "artist_longitude": null,
        "artist_location": "",
        "artist_name": artist_name,
        "song_id": song_id,
        "title": title,
        "duration": duration,
        "year": year,
    })
}

/// A song-play event in the raw log format.
pub fn play_event(user_id: i64, level: &str, song: &str, artist: &str, ts: i64) -> Value {
    json!({
        "artist": artist,
        "auth": "Logged In",
        "firstName": "Test",
        "gender": "F",
        "itemInSession": 0,
        "lastName": "User",
        "length": 200.0,
        "level": level,
        "location": "LA",
        "method": "PUT",
        "page": NEXT_SONG,
        "registration": 1540919166796.0,
        "sessionId": TEST_SESSION_ID,
        "song": song,
        "status": 200,
        "ts": ts,
        "userAgent": "UA",
        "userId": user_id,
    })
}

/// A temporary input tree plus an output directory.
pub struct InputTree {
    // Kept alive for the lifetime of the tree
    _dir: TempDir,
    pub song_data: PathBuf,
    pub log_data: PathBuf,
    pub output: PathBuf,
}

impl InputTree {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let song_data = dir.path().join("song_data");
        let log_data = dir.path().join("log_data");
        let output = dir.path().join("output");
        fs::create_dir_all(&song_data).expect("Failed to create song_data");
        fs::create_dir_all(&log_data).expect("Failed to create log_data");
        Self {
            _dir: dir,
            song_data,
            log_data,
            output,
        }
    }

    /// Catalog of two songs (one of them stored twice) and two days of logs:
    ///
    /// - user 10 plays "Test Song" as paid, twice with the same timestamp
    /// - user 10 plays a song missing from the catalog
    /// - user 10 plays "Test Song" again after moving to the free level
    /// - user 77 only logs in
    /// - user 11, sent with a string id, plays "Test Song" the next day
    pub fn standard() -> Self {
        let tree = Self::new();
        let test_song = song_json(
            TEST_SONG_ID,
            TEST_SONG_TITLE,
            TEST_ARTIST_ID,
            TEST_ARTIST_NAME,
            TEST_SONG_YEAR,
            TEST_SONG_DURATION,
        );
        tree.add_song(["A", "A", "A"], "TRAAAAA128F1.json", &test_song);
        tree.add_song(["A", "B", "C"], "TRABCAA128F1.json", &test_song);
        tree.add_song(
            ["B", "A", "A"],
            "TRBAAAA128F2.json",
            &song_json(OTHER_SONG_ID, "Other Song", OTHER_ARTIST_ID, "Other Artist", 1999, 180.5),
        );

        let matched = play_event(TEST_USER_ID, "paid", TEST_SONG_TITLE, TEST_ARTIST_NAME, TEST_TS);
        let mut login = play_event(LOGIN_ONLY_USER_ID, "free", "", "", TEST_TS + 30_000);
        login["page"] = json!("Login");
        login["song"] = Value::Null;
        login["artist"] = Value::Null;
        tree.add_log_file(
            "2018",
            "11",
            "2018-11-02-events.json",
            &[
                matched.clone(),
                login,
                play_event(TEST_USER_ID, "paid", UNKNOWN_SONG, "Nobody", TEST_TS + 60_000),
                play_event(TEST_USER_ID, "free", TEST_SONG_TITLE, TEST_ARTIST_NAME, TEST_TS + 120_000),
                matched,
            ],
        );

        let mut string_id = play_event(11, "free", TEST_SONG_TITLE, TEST_ARTIST_NAME, 1541203200000);
        string_id["userId"] = json!("11");
        tree.add_log_file("2018", "11", "2018-11-03-events.json", &[string_id]);
        tree
    }

    pub fn add_song(&self, levels: [&str; 3], file_name: &str, record: &Value) {
        let dir = levels
            .iter()
            .fold(self.song_data.clone(), |path, level| path.join(level));
        fs::create_dir_all(&dir).expect("Failed to create song dir");
        fs::write(dir.join(file_name), record.to_string()).expect("Failed to write song");
    }

    pub fn add_log_file(&self, year: &str, month: &str, file_name: &str, events: &[Value]) {
        let lines: Vec<String> = events.iter().map(Value::to_string).collect();
        self.add_raw_log_file(year, month, file_name, &lines.join("\n"));
    }

    pub fn add_raw_log_file(&self, year: &str, month: &str, file_name: &str, content: &str) {
        let dir = self.log_data.join(year).join(month);
        fs::create_dir_all(&dir).expect("Failed to create log dir");
        fs::write(dir.join(file_name), content).expect("Failed to write log file");
    }

    pub fn inputs(&self) -> PipelineInputs {
        PipelineInputs {
            song_files: discover_files(&self.song_data, SONG_DATA_DEPTH).expect("song files"),
            log_files: discover_files(&self.log_data, LOG_DATA_DEPTH).expect("log files"),
        }
    }

    /// CLI-style config pointing at this tree.
    pub fn cli_config(&self, stage: PipelineStage) -> CliConfig {
        CliConfig {
            output_dir: Some(self.output.clone()),
            song_data_dir: Some(self.song_data.clone()),
            log_data_dir: Some(self.log_data.clone()),
            stage,
            ..Default::default()
        }
    }

    pub fn context(&self, matcher: MatcherKind) -> PipelineContext {
        let config = AppConfig::resolve(&self.cli_config(PipelineStage::All), None)
            .expect("Failed to resolve config");
        PipelineContext {
            matcher: matcher.build(),
            ..PipelineContext::from_config(&config).expect("Failed to open store")
        }
    }

    pub fn run_stage(&self, stage: PipelineStage) -> Result<RunSummary> {
        run(&self.context(MatcherKind::Exact), &self.inputs(), stage)
    }

    pub fn run_all(&self) -> Result<RunSummary> {
        self.run_stage(PipelineStage::All)
    }

    pub fn store(&self) -> RelationStore {
        RelationStore::open(&self.output).expect("Failed to open store")
    }

    pub fn read<R: Relation>(&self) -> Vec<R> {
        self.store().read::<R>().expect("Failed to read relation")
    }

    /// Songplays ordered by id.
    pub fn read_songplays(&self) -> Vec<SongplayRecord> {
        let mut rows = self.read::<SongplayRecord>();
        rows.sort_by_key(|row| row.songplay_id);
        rows
    }

    /// Users ordered by id then level.
    pub fn read_users(&self) -> Vec<UserRecord> {
        let mut rows = self.read::<UserRecord>();
        rows.sort_by(|a, b| (&a.user_id, &a.level).cmp(&(&b.user_id, &b.level)));
        rows
    }

    pub fn read_time(&self) -> Vec<TimeRecord> {
        let mut rows = self.read::<TimeRecord>();
        rows.sort_by_key(|row| row.start_time);
        rows
    }
}
