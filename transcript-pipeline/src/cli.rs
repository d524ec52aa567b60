//! Command-line interface
//!
//! `run` drives the five-stage pipeline, `analyze` the single-pass analysis and
//! `status` reports files that already have a terminal artifact. Flags override
//! values from the `--config` file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};

use crate::client::build_client;
use crate::config::{load_env, PipelineConfig, Provider};
use crate::executor::StageExecutor;
use crate::pipeline::{collect_status, Mode, Orchestrator};

/// Transcript Pipeline CLI Arguments
#[derive(Parser, Debug, Clone)]
#[command(
    name = "transcript-pipeline",
    about = "Qualitative analysis of collected transcripts with a language model"
)]
pub struct Args {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Segment, code, cluster, build personas and validate each transcript
    Run(RunArgs),
    /// Single-pass codes/keywords/quotes analysis of each transcript
    Analyze(RunArgs),
    /// List transcripts that already have a terminal artifact
    Status(StatusArgs),
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct RunArgs {
    /// Source the raw files were collected from (youtube, reddit, twitter, g2, ...)
    #[arg(short, long)]
    pub source: String,

    /// Comma-separated raw file names (default: every file under raw_dir/source)
    #[arg(short, long, value_delimiter = ',')]
    pub files: Vec<String>,

    /// Tokens per model call for segmentation and analysis
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Open-coding calls in flight per transcript (default: 1)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Root directory of raw transcripts
    #[arg(long)]
    pub raw_dir: Option<PathBuf>,

    /// Root directory of stage artifacts
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub provider: Option<Provider>,

    /// Model name passed to the provider
    #[arg(short, long)]
    pub model: Option<String>,

    /// Attempts per model call, including the first
    #[arg(long)]
    pub max_attempts: Option<u32>,
}

impl RunArgs {
    /// Overlay the flags that were given onto `config`
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(raw_dir) = &self.raw_dir {
            config.raw_dir = raw_dir.clone();
        }
        if let Some(output_dir) = &self.output_dir {
            config.output_dir = output_dir.clone();
        }
        if let Some(provider) = self.provider {
            if provider != config.model.provider && self.model.is_none() {
                config.model.name = provider.default_model().to_string();
            }
            config.model.provider = provider;
        }
        if let Some(model) = &self.model {
            config.model.name = model.clone();
        }
        if let Some(max_attempts) = self.max_attempts {
            config.retry.max_attempts = max_attempts;
        }
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct StatusArgs {
    /// Only list transcripts from this source
    #[arg(short, long)]
    pub source: Option<String>,

    /// Report on single-pass analysis artifacts instead of the five-stage pipeline
    #[arg(long)]
    pub simplified: bool,

    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

/// Execute a parsed command line
///
/// Errors returned here are setup failures; per-file failures are logged and
/// reported in the run summary.
pub async fn run(args: Args) -> Result<()> {
    if let Some(env_file) = load_env() {
        tracing::debug!(path = %env_file.display(), "loaded environment file");
    }

    let config = PipelineConfig::load(args.config.as_deref())
        .context("failed to load configuration")?;

    match args.command {
        Command::Run(run_args) => run_pipeline(config, run_args, Mode::FiveStage).await,
        Command::Analyze(run_args) => run_pipeline(config, run_args, Mode::Simplified).await,
        Command::Status(status_args) => print_status(config, status_args).await,
    }
}

async fn run_pipeline(mut config: PipelineConfig, args: RunArgs, mode: Mode) -> Result<()> {
    args.apply(&mut config);
    config.validate()?;

    let source = config.source(&args.source)?;
    let files = if args.files.is_empty() {
        source
            .list_raw_files(&config.raw_dir)
            .await
            .with_context(|| format!("failed to list raw files for `{}`", source.name()))?
    } else {
        args.files.clone()
    };

    let api_key = config.api_key()?;
    let client = build_client(&config, api_key).context("failed to build model client")?;
    let executor = StageExecutor::from_config(client, &config.model);
    let orchestrator = Orchestrator::new(executor, &config);

    let summary = orchestrator
        .process_files(&source, &files, mode)
        .await
        .with_context(|| format!("failed to prepare output directory {}", config.output_dir.display()))?;

    println!(
        "Run {}: {} processed, {} skipped, {} failed",
        summary.run_id,
        summary.processed.len(),
        summary.skipped.len(),
        summary.failed.len()
    );
    if summary.has_failures() {
        println!("Failed files (rerun to retry them from the first stage):");
        for failed in &summary.failed {
            println!("  ✗ {}: {}", failed.raw_file, failed.error);
        }
    }

    Ok(())
}

async fn print_status(mut config: PipelineConfig, args: StatusArgs) -> Result<()> {
    if let Some(output_dir) = args.output_dir {
        config.output_dir = output_dir;
    }
    let mode = if args.simplified {
        Mode::Simplified
    } else {
        Mode::FiveStage
    };

    let entries = collect_status(&config.output_dir, mode, args.source.as_deref())
        .await
        .with_context(|| format!("failed to read {}", config.output_dir.display()))?;

    println!(
        "{} processed transcripts in {}/{}",
        entries.len(),
        config.output_dir.display(),
        mode.terminal_stage()
    );
    for entry in entries {
        println!("  {}\t{}\t{}", entry.artifact, entry.url, entry.detail);
    }

    Ok(())
}
