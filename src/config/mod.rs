mod file_config;

pub use file_config::{FileConfig, InputsConfig};

use crate::pipeline::{PipelineInputs, PipelineStage};
use crate::source::{discover_files, LOG_DATA_DEPTH, SONG_DATA_DEPTH};
use crate::transform::MatcherKind;
use anyhow::{anyhow, bail, Context, Result};
use clap::ValueEnum;
use std::path::PathBuf;

/// Page value of the log events that represent a song being played.
pub const DEFAULT_SONG_PLAY_PAGE: &str = "NextSong";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub output_dir: Option<PathBuf>,
    pub song_data_dir: Option<PathBuf>,
    pub song_files: Vec<PathBuf>,
    pub log_data_dir: Option<PathBuf>,
    pub log_files: Vec<PathBuf>,
    pub song_play_page: String,
    pub matcher: MatcherKind,
    pub threads: Option<usize>,
    pub stage: PipelineStage,
    pub check_only: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            song_data_dir: None,
            song_files: Vec::new(),
            log_data_dir: None,
            log_files: Vec::new(),
            song_play_page: DEFAULT_SONG_PLAY_PAGE.to_string(),
            matcher: MatcherKind::default(),
            threads: None,
            stage: PipelineStage::default(),
            check_only: false,
        }
    }
}

/// Where one kind of input comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    None,
    Files(Vec<PathBuf>),
    /// Every file exactly `depth` levels below `root`.
    Discover { root: PathBuf, depth: usize },
}

impl InputSource {
    fn pick(dir: Option<PathBuf>, files: Vec<PathBuf>, depth: usize, what: &str) -> Result<Self> {
        match (dir, files.is_empty()) {
            (Some(_), false) => bail!(
                "Both a {} directory and a {} file list were given, use only one",
                what,
                what
            ),
            (Some(root), true) => Ok(InputSource::Discover { root, depth }),
            (None, false) => Ok(InputSource::Files(files)),
            (None, true) => Ok(InputSource::None),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, InputSource::None)
    }

    /// The concrete list of files to read.
    pub fn resolve(&self) -> Result<Vec<PathBuf>> {
        match self {
            InputSource::None => Ok(Vec::new()),
            InputSource::Files(files) => {
                if let Some(missing) = files.iter().find(|f| !f.is_file()) {
                    bail!("Input file does not exist: {:?}", missing);
                }
                Ok(files.clone())
            }
            InputSource::Discover { root, depth } => discover_files(root, *depth)
                .with_context(|| format!("Failed to discover input files under {:?}", root)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub output_dir: PathBuf,
    pub song_input: InputSource,
    pub log_input: InputSource,
    pub song_play_page: String,
    pub matcher: MatcherKind,
    /// Worker threads for the rayon pool. `None` uses rayon's default.
    pub threads: Option<usize>,
    pub stage: PipelineStage,
    pub check_only: bool,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let output_dir = file
            .output_dir
            .map(PathBuf::from)
            .or_else(|| cli.output_dir.clone())
            .ok_or_else(|| {
                anyhow!("output_dir must be specified via --output-dir or in config file")
            })?;
        if output_dir.exists() && !output_dir.is_dir() {
            bail!("output_dir is not a directory: {:?}", output_dir);
        }

        // An input given in the TOML file replaces the CLI one as a whole
        let inputs = file.inputs.unwrap_or_default();
        let song_input = if inputs.song_data_dir.is_some() || inputs.song_files.is_some() {
            InputSource::pick(
                inputs.song_data_dir.map(PathBuf::from),
                to_paths(inputs.song_files),
                SONG_DATA_DEPTH,
                "song data",
            )?
        } else {
            InputSource::pick(
                cli.song_data_dir.clone(),
                cli.song_files.clone(),
                SONG_DATA_DEPTH,
                "song data",
            )?
        };
        let log_input = if inputs.log_data_dir.is_some() || inputs.log_files.is_some() {
            InputSource::pick(
                inputs.log_data_dir.map(PathBuf::from),
                to_paths(inputs.log_files),
                LOG_DATA_DEPTH,
                "log data",
            )?
        } else {
            InputSource::pick(
                cli.log_data_dir.clone(),
                cli.log_files.clone(),
                LOG_DATA_DEPTH,
                "log data",
            )?
        };

        if cli.stage.needs_song_input() && song_input.is_none() {
            bail!(
                "Stage '{}' needs song data: pass --song-data-dir or --song-file",
                stage_name(cli.stage)
            );
        }
        if cli.stage.needs_log_input() && log_input.is_none() {
            bail!(
                "Stage '{}' needs log data: pass --log-data-dir or --log-file",
                stage_name(cli.stage)
            );
        }

        let song_play_page = file
            .song_play_page
            .unwrap_or_else(|| cli.song_play_page.clone());
        if song_play_page.is_empty() {
            bail!("song_play_page must not be empty");
        }

        let matcher = match file.matcher {
            Some(name) => parse_matcher(&name)?,
            None => cli.matcher,
        };

        let threads = file.threads.or(cli.threads);
        if threads == Some(0) {
            bail!("threads must be greater than 0");
        }

        Ok(Self {
            output_dir,
            song_input,
            log_input,
            song_play_page,
            matcher,
            threads,
            stage: cli.stage,
            check_only: cli.check_only,
        })
    }

    /// Turn the configured input sources into the file lists the selected
    /// stage reads. Sources the stage does not use stay empty.
    pub fn resolve_inputs(&self) -> Result<PipelineInputs> {
        let song_files = if self.stage.needs_song_input() {
            self.song_input.resolve()?
        } else {
            Vec::new()
        };
        let log_files = if self.stage.needs_log_input() {
            self.log_input.resolve()?
        } else {
            Vec::new()
        };
        Ok(PipelineInputs {
            song_files,
            log_files,
        })
    }
}

fn to_paths(files: Option<Vec<String>>) -> Vec<PathBuf> {
    files
        .unwrap_or_default()
        .into_iter()
        .map(PathBuf::from)
        .collect()
}

/// Parses a matcher name. Uses clap's ValueEnum trait for parsing.
fn parse_matcher(s: &str) -> Result<MatcherKind> {
    MatcherKind::from_str(s, true).map_err(|_| anyhow!("Unknown matcher: {}", s))
}

fn stage_name(stage: PipelineStage) -> String {
    stage
        .to_possible_value()
        .map(|v| v.get_name().to_string())
        .unwrap_or_else(|| format!("{:?}", stage))
}
