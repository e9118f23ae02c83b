//! Stage wiring: read inputs, run the transforms, write the relations.
//!
//! The catalog stage and the log extraction have no dependency on each
//! other and run side by side. Fact resolution starts only after both have
//! finished, and reads songs and artists back from the store rather than
//! taking them from memory.

use crate::config::AppConfig;
use crate::model::{ArtistRecord, EnrichedEvent, SongRecord};
use crate::source::{read_log_events, read_song_metadata};
use crate::storage::RelationStore;
use crate::transform::{
    build_time_dimension, extract_catalog, extract_usage, is_song_play, resolve_songplays,
    NameMatcher,
};
use anyhow::{Context, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum PipelineStage {
    /// Catalog and logs.
    #[default]
    All,
    /// Songs and artists only.
    Catalog,
    /// Users, time and songplays, against a catalog written by an earlier run.
    Logs,
}

impl PipelineStage {
    pub fn needs_song_input(self) -> bool {
        matches!(self, PipelineStage::All | PipelineStage::Catalog)
    }

    pub fn needs_log_input(self) -> bool {
        matches!(self, PipelineStage::All | PipelineStage::Logs)
    }
}

/// Concrete input files for a run.
#[derive(Debug, Clone, Default)]
pub struct PipelineInputs {
    pub song_files: Vec<PathBuf>,
    pub log_files: Vec<PathBuf>,
}

/// Everything the stages need, passed in explicitly.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub store: RelationStore,
    pub matcher: Arc<dyn NameMatcher>,
    pub song_play_page: String,
}

impl PipelineContext {
    pub fn new(
        store: RelationStore,
        matcher: Arc<dyn NameMatcher>,
        song_play_page: impl Into<String>,
    ) -> Self {
        Self {
            store,
            matcher,
            song_play_page: song_play_page.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let store = RelationStore::open(&config.output_dir)
            .with_context(|| format!("Failed to open output directory {:?}", config.output_dir))?;
        Ok(Self::new(
            store,
            config.matcher.build(),
            config.song_play_page.clone(),
        ))
    }
}

/// Row counts of one run. Relations a stage did not write stay at zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub songs: usize,
    pub artists: usize,
    pub users: usize,
    pub time: usize,
    pub songplays: usize,
    pub songplays_with_song: usize,
    pub songplays_with_artist: usize,
    /// Log events dropped because they are not song plays.
    pub discarded_events: usize,
}

impl RunSummary {
    pub fn log(&self) {
        info!(
            "Run complete: {} songs, {} artists, {} users, {} time rows, {} songplays",
            self.songs, self.artists, self.users, self.time, self.songplays
        );
        if self.songplays > 0 {
            info!(
                "{} of {} songplays matched a song, {} matched an artist",
                self.songplays_with_song, self.songplays, self.songplays_with_artist
            );
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogCounts {
    pub songs: usize,
    pub artists: usize,
}

/// Song-play events that still need fact resolution, plus what was written
/// on the way.
#[derive(Debug)]
pub struct LogExtraction {
    pub plays: Vec<EnrichedEvent>,
    pub users: usize,
    pub time: usize,
    pub discarded_events: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FactCounts {
    pub songplays: usize,
    pub with_song: usize,
    pub with_artist: usize,
}

/// Read song metadata and write the songs and artists relations.
pub fn process_song_data(ctx: &PipelineContext, song_files: &[PathBuf]) -> Result<CatalogCounts> {
    info!("Reading song data from {} files", song_files.len());
    let records = read_song_metadata(song_files).context("Failed to read song data")?;
    let catalog = extract_catalog(&records);

    let songs = ctx
        .store
        .write(&catalog.songs)
        .context("Failed to write songs")?;
    let artists = ctx
        .store
        .write(&catalog.artists)
        .context("Failed to write artists")?;
    Ok(CatalogCounts { songs, artists })
}

/// Read log events, write the users and time relations and hand back the
/// song-play stream.
pub fn extract_log_data(ctx: &PipelineContext, log_files: &[PathBuf]) -> Result<LogExtraction> {
    info!("Reading log data from {} files", log_files.len());
    let events = read_log_events(log_files).context("Failed to read log data")?;
    let usage = extract_usage(events, &ctx.song_play_page)?;

    let users = ctx
        .store
        .write(&usage.users)
        .context("Failed to write users")?;
    let time_rows = build_time_dimension(&usage.plays);
    let time = ctx.store.write(&time_rows).context("Failed to write time")?;

    Ok(LogExtraction {
        plays: usage.plays,
        users,
        time,
        discarded_events: usage.discarded,
    })
}

/// Resolve song plays against the stored catalog and write songplays.
///
/// Fails when the catalog relations have not been written yet.
pub fn resolve_fact(ctx: &PipelineContext, plays: &[EnrichedEvent]) -> Result<FactCounts> {
    let songs = ctx
        .store
        .read::<SongRecord>()
        .context("Songplays need the songs relation")?;
    let artists = ctx
        .store
        .read::<ArtistRecord>()
        .context("Songplays need the artists relation")?;
    info!(
        "Resolving {} plays against {} songs and {} artists ({} matcher)",
        plays.len(),
        songs.len(),
        artists.len(),
        ctx.matcher.name()
    );

    let resolution = resolve_songplays(plays, &songs, &artists, ctx.matcher.as_ref());
    let songplays = ctx
        .store
        .write(&resolution.songplays)
        .context("Failed to write songplays")?;
    Ok(FactCounts {
        songplays,
        with_song: resolution.song_matches,
        with_artist: resolution.artist_matches,
    })
}

/// Log extraction followed by fact resolution.
pub fn process_log_data(
    ctx: &PipelineContext,
    log_files: &[PathBuf],
) -> Result<(LogExtraction, FactCounts)> {
    let extraction = extract_log_data(ctx, log_files)?;
    let facts = resolve_fact(ctx, &extraction.plays)?;
    Ok((extraction, facts))
}

/// Both stages: catalog and log extraction concurrently, then the fact
/// table once both are written.
pub fn run_pipeline(ctx: &PipelineContext, inputs: &PipelineInputs) -> Result<RunSummary> {
    let (catalog, logs) = rayon::join(
        || process_song_data(ctx, &inputs.song_files),
        || extract_log_data(ctx, &inputs.log_files),
    );
    let catalog = catalog?;
    let logs = logs?;

    let facts = resolve_fact(ctx, &logs.plays)?;
    Ok(summarize(Some(catalog), Some((&logs, facts))))
}

pub fn run(ctx: &PipelineContext, inputs: &PipelineInputs, stage: PipelineStage) -> Result<RunSummary> {
    match stage {
        PipelineStage::All => run_pipeline(ctx, inputs),
        PipelineStage::Catalog => {
            let catalog = process_song_data(ctx, &inputs.song_files)?;
            Ok(summarize(Some(catalog), None))
        }
        PipelineStage::Logs => {
            let (logs, facts) = process_log_data(ctx, &inputs.log_files)?;
            Ok(summarize(None, Some((&logs, facts))))
        }
    }
}

fn summarize(catalog: Option<CatalogCounts>, logs: Option<(&LogExtraction, FactCounts)>) -> RunSummary {
    let mut summary = RunSummary::default();
    if let Some(catalog) = catalog {
        summary.songs = catalog.songs;
        summary.artists = catalog.artists;
    }
    if let Some((logs, facts)) = logs {
        summary.users = logs.users;
        summary.time = logs.time;
        summary.discarded_events = logs.discarded_events;
        summary.songplays = facts.songplays;
        summary.songplays_with_song = facts.with_song;
        summary.songplays_with_artist = facts.with_artist;
    }
    summary
}

/// What a run would read, without writing anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputReport {
    pub song_files: usize,
    pub song_records: usize,
    pub log_files: usize,
    pub log_events: usize,
    pub play_events: usize,
}

/// Parse every input file and count what is in it.
pub fn check_inputs(inputs: &PipelineInputs, song_play_page: &str) -> Result<InputReport> {
    let (songs, events) = rayon::join(
        || read_song_metadata(&inputs.song_files),
        || read_log_events(&inputs.log_files),
    );
    let songs = songs.context("Failed to read song data")?;
    let events = events.context("Failed to read log data")?;
    let play_events = events
        .iter()
        .filter(|event| is_song_play(event, song_play_page))
        .count();

    let report = InputReport {
        song_files: inputs.song_files.len(),
        song_records: songs.len(),
        log_files: inputs.log_files.len(),
        log_events: events.len(),
        play_events,
    };
    info!(
        "Inputs OK: {} song records in {} files, {} log events ({} song plays) in {} files",
        report.song_records, report.song_files, report.log_events, report.play_events, report.log_files
    );
    Ok(report)
}
