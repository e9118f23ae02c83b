use anyhow::{Context, Result};
use clap::Parser;
use pezzottify_warehouse::config::{AppConfig, CliConfig, FileConfig, DEFAULT_SONG_PLAY_PAGE};
use pezzottify_warehouse::pipeline::{check_inputs, run, PipelineContext, PipelineStage};
use pezzottify_warehouse::transform::MatcherKind;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

/// Build the listening analytics star schema from song metadata and usage logs.
#[derive(Parser, Debug)]
#[clap(version)]
struct CliArgs {
    /// Directory the five relations are written to.
    #[clap(long, value_parser = parse_path)]
    pub output_dir: Option<PathBuf>,

    /// Root of the song metadata tree (files four levels down).
    #[clap(long, value_parser = parse_path)]
    pub song_data_dir: Option<PathBuf>,

    /// A single song metadata file. Can be repeated; excludes --song-data-dir.
    #[clap(long = "song-file", value_parser = parse_path)]
    pub song_files: Vec<PathBuf>,

    /// Root of the usage log tree (files three levels down).
    #[clap(long, value_parser = parse_path)]
    pub log_data_dir: Option<PathBuf>,

    /// A single usage log file. Can be repeated; excludes --log-data-dir.
    #[clap(long = "log-file", value_parser = parse_path)]
    pub log_files: Vec<PathBuf>,

    /// Path to a TOML config file. Its values override the flags.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Page value that marks a log event as a song play.
    #[clap(long, default_value = DEFAULT_SONG_PLAY_PAGE)]
    pub song_play_page: String,

    /// How log events are matched to catalog titles and artist names.
    #[clap(long, value_enum, default_value = "exact")]
    pub matcher: MatcherKind,

    /// Worker threads. Defaults to one per CPU.
    #[clap(long)]
    pub threads: Option<usize>,

    /// Which part of the pipeline to run.
    #[clap(long, value_enum, default_value = "all")]
    pub stage: PipelineStage,

    /// Parse all inputs and report what was found, without writing anything.
    #[clap(long)]
    pub check_only: bool,
}

impl From<CliArgs> for CliConfig {
    fn from(args: CliArgs) -> Self {
        CliConfig {
            output_dir: args.output_dir,
            song_data_dir: args.song_data_dir,
            song_files: args.song_files,
            log_data_dir: args.log_data_dir,
            log_files: args.log_files,
            song_play_page: args.song_play_page,
            matcher: args.matcher,
            threads: args.threads,
            stage: args.stage,
            check_only: args.check_only,
        }
    }
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    info!(
        "pezzottify-warehouse {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH")
    );

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&CliConfig::from(cli_args), file_config)?;
    let inputs = config.resolve_inputs()?;

    let mut pool_builder = rayon::ThreadPoolBuilder::new();
    if let Some(threads) = config.threads {
        pool_builder = pool_builder.num_threads(threads);
    }
    let pool = pool_builder
        .build()
        .context("Failed to start worker threads")?;
    info!("Using {} worker threads", pool.current_num_threads());

    if config.check_only {
        pool.install(|| check_inputs(&inputs, &config.song_play_page))?;
        return Ok(());
    }

    let ctx = PipelineContext::from_config(&config)?;
    info!(
        "Writing relations to {:?} (stage: {:?})",
        ctx.store.root(),
        config.stage
    );
    let summary = pool.install(|| run(&ctx, &inputs, config.stage))?;
    summary.log();
    Ok(())
}
