//! bibweave - conference paper metadata enrichment pipeline
//!
//! Harvests paper listings from DBLP and enriches them through OpenAlex,
//! Semantic Scholar and CrossRef, one stage file at a time.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use bibweave_core::{GateConfig, ProgressContext, RequestGate};
use bibweave_pipeline::{run_stages, year_range, PipelineConfig, PipelineContext, StageKind};

mod config;
mod summary;

use config::Config;

#[derive(Parser)]
#[command(name = "bibweave")]
#[command(about = "Conference paper metadata enrichment pipeline")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./bibweave.toml or ~/.config/bibweave/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Number of parallel workers per stage
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Directory for stage output files
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Directory for the on-disk response cache
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct StageArgs {
    /// Conference key(s), as named in DBLP's conf directory (repeatable)
    #[arg(short, long = "conference", required = true)]
    conference: Vec<String>,

    /// Year range: FROM [TO]
    #[arg(short, long, num_args = 1..=2, required = true)]
    years: Vec<u16>,
}

impl StageArgs {
    fn years(&self) -> Vec<u16> {
        let first = self.years[0];
        let last = self.years.get(1).copied().unwrap_or(first);
        year_range(first, last)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Harvest DBLP listings and attach OpenAlex affiliations
    Base(StageArgs),
    /// Add Semantic Scholar abstracts, TLDRs and citation stubs
    Extended(StageArgs),
    /// Resolve citation stubs into full cited-paper records
    Citations(StageArgs),
    /// Run all three stages in order
    Run(StageArgs),
    /// Show current configuration
    Config,
}

impl Command {
    fn stages(&self) -> &'static [StageKind] {
        match self {
            Command::Base(_) => &[StageKind::Base],
            Command::Extended(_) => &[StageKind::Extended],
            Command::Citations(_) => &[StageKind::Citations],
            Command::Run(_) => &StageKind::ALL,
            Command::Config => &[],
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress = Arc::new(ProgressContext::new());

    // Logging:
    //   TTY:     quiet (warn) unless --debug  — progress bars show activity
    //   non-TTY: info unless --debug          — logs are the only progress indicator
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = if is_tty { !cli.debug } else { false };
    bibweave_core::init_logging(quiet, cli.debug, multi);

    let config = if let Some(path) = &cli.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    let args = match &cli.command {
        Command::Base(args)
        | Command::Extended(args)
        | Command::Citations(args)
        | Command::Run(args) => args,
        Command::Config => {
            summary::print_config(&config, &cli);
            return Ok(());
        }
    };

    let gate_config = GateConfig {
        max_retries: config.http.max_retries,
        backoff_factor: config.http.backoff_factor,
    };
    let cache_dir = cli
        .cache_dir
        .clone()
        .unwrap_or_else(|| config.pipeline.cache_dir.clone());
    let pipeline_config = PipelineConfig {
        workers: cli.workers.unwrap_or(config.pipeline.workers).max(1),
        output_dir: cli
            .output_dir
            .clone()
            .unwrap_or_else(|| config.pipeline.output_dir.clone()),
        author_fallback: config.pipeline.author_fallback,
    };

    let gate = Arc::new(
        RequestGate::new(gate_config, &cache_dir)
            .with_context(|| format!("creating cache directory {}", cache_dir.display()))?,
    );
    let ctx = PipelineContext::new(
        gate,
        config.sources.s2_api_key.clone(),
        pipeline_config,
        progress,
    );

    let years = args.years();
    let report = run_stages(cli.command.stages(), &ctx, &args.conference, &years);
    summary::print_report(&ctx, &report);

    if !report.is_success() {
        anyhow::bail!("{} conference(s) failed", report.failures.len());
    }
    Ok(())
}
