mod pipeline;
mod report;
mod schedule;
mod summary;

use std::path::Path;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use vibetrend_analysis::{AnalysisEngine, AnalysisError};
use vibetrend_core::{AppConfig, DataDir, Run, RunPhase, SourcesFile};
use vibetrend_scraper::{build_adapters, build_trending_source, FetchCoordinator};

use crate::pipeline::Pipeline;

#[derive(Debug, Parser)]
#[command(name = "vibetrend-cli")]
#[command(about = "Collect and score vibe-coding SaaS trend signals")]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Collect today's leads from every enabled source
    #[arg(long)]
    scrape: bool,

    /// Deduplicate the day's leads and score the new ones with AI
    #[arg(long)]
    analyze: bool,

    /// Write the day's vibe picks (score 70+) to the reports directory
    #[arg(long)]
    export: bool,

    /// Render the day's email digest to the reports directory
    #[arg(long)]
    email: bool,

    /// Scrape again even if today's data was already collected
    #[arg(long)]
    force: bool,

    /// Run the full pipeline on VIBETREND_SCHEDULE instead of once
    #[arg(long, conflicts_with_all = ["scrape", "analyze", "export", "email", "date"])]
    schedule: bool,

    /// Day to operate on (YYYY-MM-DD), defaults to today in UTC
    #[arg(long)]
    date: Option<NaiveDate>,
}

impl Cli {
    /// Requested phases; empty means the full pipeline.
    fn phases(&self) -> Vec<RunPhase> {
        [
            (self.scrape, RunPhase::Scrape),
            (self.analyze, RunPhase::Analyze),
            (self.export, RunPhase::Export),
            (self.email, RunPhase::Email),
        ]
        .into_iter()
        .filter_map(|(requested, phase)| requested.then_some(phase))
        .collect()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = vibetrend_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::debug!(?config, "configuration loaded");

    let sources = load_sources_or_default(&config.sources_path)?;
    let pipeline = build_pipeline(&config, sources).await?;

    if cli.schedule {
        tracing::info!(cron = %config.schedule, "starting scheduled mode");
        return schedule::run_scheduled(Arc::new(pipeline), &config.schedule).await;
    }

    let date = cli.date.unwrap_or_else(|| Utc::now().date_naive());
    let run = Run::new(date, &cli.phases(), cli.force);
    tracing::info!(
        %date,
        phases = ?run.phases_executed,
        force = run.force_rescrape,
        "starting run"
    );

    match pipeline.run(&run).await {
        Ok(summary) => {
            print!("{summary}");
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "run failed");
            Err(e.into())
        }
    }
}

/// A missing sources file falls back to the built-in defaults; a malformed one
/// is fatal.
fn load_sources_or_default(path: &Path) -> anyhow::Result<SourcesFile> {
    if path.exists() {
        Ok(vibetrend_core::load_sources(path)?)
    } else {
        tracing::warn!(
            path = %path.display(),
            "sources file not found; using built-in defaults"
        );
        Ok(SourcesFile::default())
    }
}

async fn build_pipeline(config: &AppConfig, sources: SourcesFile) -> anyhow::Result<Pipeline> {
    let pool = vibetrend_db::open_ledger(&config.database_url).await?;

    let adapters = build_adapters(config)?;
    let coordinator = FetchCoordinator::from_config(adapters, config);
    let trending = build_trending_source(config)?;

    let engine = match AnalysisEngine::from_config(config) {
        Ok(engine) => Some(engine),
        Err(AnalysisError::NoProviders) => {
            tracing::warn!("no AI provider key configured; the analyze phase will fail");
            None
        }
        Err(e) => return Err(e.into()),
    };

    Ok(Pipeline::new(
        coordinator,
        Some(trending),
        engine,
        pool,
        DataDir::new(&config.data_dir),
        sources,
        config.analysis_max_leads,
    ))
}
