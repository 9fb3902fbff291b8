//! Pipeline Orchestrator: runs the requested phases of one [`Run`] in order.
//!
//! Each phase reads the durable output of the previous one from the data
//! directory, so any phase can be re-run on its own. Per-source and per-lead
//! failures are recorded in the [`RunSummary`]; only structural problems end
//! the run with a [`PipelineError`].

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use thiserror::Error;
use vibetrend_analysis::{AnalysisEngine, AnalysisError};
use vibetrend_core::{
    artifacts, AnalysisReport, ArtifactError, DataDir, FailedLead, Lead, Run, RunPhase,
    SourcesFile,
};
use vibetrend_db::DbError;
use vibetrend_scraper::{DayScrape, FetchCoordinator, ScraperError, TrendingSource};

use crate::report::{render_digest, vibe_picks};
use crate::summary::{AnalyzeSummary, RunSummary, ScrapeSummary};

const DEFERRED_REASON: &str = "deferred: per-run analysis cap reached";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("cannot run {phase}: {detail}")]
    MissingPrerequisite { phase: RunPhase, detail: String },

    #[error("every enabled source failed ({failed} attempted)")]
    AllSourcesFailed { failed: usize },

    #[error("no AI provider could be reached for {leads} leads")]
    ProvidersUnreachable { leads: usize },

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Scraper(#[from] ScraperError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    Db(#[from] DbError),
}

pub struct Pipeline {
    coordinator: FetchCoordinator,
    trending: Option<Arc<dyn TrendingSource>>,
    engine: Option<AnalysisEngine>,
    pool: SqlitePool,
    data_dir: DataDir,
    sources: SourcesFile,
    max_leads: usize,
}

impl Pipeline {
    /// `engine` may be `None` when no provider key is configured; the
    /// analyze phase then fails with [`AnalysisError::NoProviders`].
    /// Without a `trending` source the scrape phase skips the trending AI
    /// tools list.
    #[must_use]
    pub fn new(
        coordinator: FetchCoordinator,
        trending: Option<Arc<dyn TrendingSource>>,
        engine: Option<AnalysisEngine>,
        pool: SqlitePool,
        data_dir: DataDir,
        sources: SourcesFile,
        max_leads: usize,
    ) -> Self {
        Self {
            coordinator,
            trending,
            engine,
            pool,
            data_dir,
            sources,
            max_leads: max_leads.max(1),
        }
    }

    /// Execute every phase of `run` in canonical order, stopping at the first
    /// fatal error.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] on a missing prerequisite, a total scrape
    /// failure, unreachable providers, or an I/O or ledger failure.
    pub async fn run(&self, run: &Run) -> Result<RunSummary, PipelineError> {
        let date = run.run_date;
        let mut summary = RunSummary {
            run_date: Some(date),
            ..RunSummary::default()
        };

        for &phase in &run.phases_executed {
            tracing::info!(%phase, %date, "phase started");
            match phase {
                RunPhase::Scrape => {
                    summary.scrape = Some(self.scrape(date, run.force_rescrape).await?);
                }
                RunPhase::Analyze => summary.analyze = Some(self.analyze(date).await?),
                RunPhase::Export => summary.export = Some(self.export(date)?),
                RunPhase::Email => summary.email = Some(self.email(date)?),
            }
            tracing::info!(%phase, %date, "phase finished");
        }

        Ok(summary)
    }

    async fn scrape(&self, date: NaiveDate, force: bool) -> Result<ScrapeSummary, PipelineError> {
        match self
            .coordinator
            .collect_day(&self.sources, &self.data_dir, date, force)
            .await?
        {
            DayScrape::Skipped(marker) => Ok(ScrapeSummary {
                skipped: true,
                source_counts: marker.source_counts,
                failed_sources: marker.failed_sources,
                trending_tools: self.data_dir.read_trending(date)?.map(|tools| tools.len()),
                trending_error: None,
            }),
            DayScrape::Fetched { outcome, .. } => {
                for failure in &outcome.failed_sources {
                    tracing::warn!(source = %failure.source, reason = %failure.reason, "source unavailable");
                }
                if outcome.all_failed() {
                    return Err(PipelineError::AllSourcesFailed {
                        failed: outcome.failed_sources.len(),
                    });
                }
                tracing::info!(
                    leads = outcome.lead_count(),
                    succeeded = outcome.batches.len(),
                    failed = outcome.failed_sources.len(),
                    "scrape finished"
                );
                let (trending_tools, trending_error) = self.collect_trending(date).await?;
                Ok(ScrapeSummary {
                    skipped: false,
                    source_counts: outcome
                        .batches
                        .iter()
                        .map(|batch| (batch.source, batch.leads.len()))
                        .collect(),
                    failed_sources: outcome
                        .failed_sources
                        .into_iter()
                        .map(|failure| (failure.source, failure.reason))
                        .collect(),
                    trending_tools,
                    trending_error,
                })
            }
        }
    }

    /// Fetch and store the trending AI tools list. A failed fetch is logged
    /// and reported but never fails the scrape.
    async fn collect_trending(
        &self,
        date: NaiveDate,
    ) -> Result<(Option<usize>, Option<String>), PipelineError> {
        let settings = &self.sources.trending_ai;
        if !settings.enabled {
            return Ok((None, None));
        }
        let Some(source) = &self.trending else {
            tracing::debug!("no trending source configured; skipping trending AI tools");
            return Ok((None, None));
        };

        match source.fetch_trending(settings).await {
            Ok(tools) => {
                let path = self.data_dir.write_trending(date, &tools)?;
                tracing::info!(tools = tools.len(), path = %path.display(), "wrote trending AI tools");
                Ok((Some(tools.len()), None))
            }
            Err(e) => {
                tracing::warn!(error = %e, "trending AI tools unavailable");
                Ok((None, Some(e.to_string())))
            }
        }
    }

    async fn analyze(&self, date: NaiveDate) -> Result<AnalyzeSummary, PipelineError> {
        let batches = self.data_dir.read_raw_all(date)?;
        if batches.is_empty() {
            return Err(PipelineError::MissingPrerequisite {
                phase: RunPhase::Analyze,
                detail: format!(
                    "no scraped data in {}; run the scrape phase first",
                    self.data_dir.scraped_dir(date).display()
                ),
            });
        }

        let engine = self.engine.as_ref().ok_or(AnalysisError::NoProviders)?;

        let raw_leads: usize = batches.iter().map(|(_, leads)| leads.len()).sum();
        let unique = unique_by_fingerprint(batches.into_iter().flat_map(|(_, leads)| leads));

        let now = Utc::now();
        let recovered = vibetrend_db::recover_interrupted(&self.pool, now).await?;
        let mut fresh = vibetrend_db::filter_new(&self.pool, &unique, now).await?;
        let new_leads = fresh.len();

        let deferred = if fresh.len() > self.max_leads {
            fresh.split_off(self.max_leads)
        } else {
            Vec::new()
        };
        for lead in &deferred {
            let failure = FailedLead {
                fingerprint: lead.fingerprint.clone(),
                errors: vec![DEFERRED_REASON.to_owned()],
            };
            vibetrend_db::mark_failed(&self.pool, &failure).await?;
        }
        if !deferred.is_empty() {
            tracing::info!(
                deferred = deferred.len(),
                cap = self.max_leads,
                "analysis cap reached; lowest-engagement leads deferred"
            );
        }

        let attempted = fresh.len();
        let outcome = engine.analyze(fresh).await;

        for analyzed in &outcome.analyzed {
            vibetrend_db::record_analysis(&self.pool, analyzed).await?;
        }
        for failed in &outcome.failed {
            vibetrend_db::mark_failed(&self.pool, failed).await?;
        }

        let failed_fingerprints: Vec<String> =
            outcome.failed.iter().map(|f| f.fingerprint.clone()).collect();
        let analyzed_count = outcome.analyzed.len();

        let report = AnalysisReport::new(date, Utc::now(), outcome.analyzed, outcome.failed);
        let mut report = match self.data_dir.read_analysis(date)? {
            Some(earlier) => earlier.merge(report),
            None => report,
        };

        let unreachable = attempted > 0 && !outcome.provider_reachable;
        let insight_errors = if unreachable {
            Vec::new()
        } else {
            self.add_insights(engine, date, &mut report, analyzed_count > 0)
                .await?
        };

        let path = self.data_dir.write_analysis(date, &report)?;
        tracing::info!(path = %path.display(), analyzed = report.analyzed.len(), "wrote analysis report");

        if unreachable {
            return Err(PipelineError::ProvidersUnreachable { leads: attempted });
        }

        Ok(AnalyzeSummary {
            raw_leads,
            unique_leads: unique.len(),
            new_leads,
            deferred: deferred.len(),
            recovered,
            analyzed: analyzed_count,
            failed_fingerprints,
            overview: report.overview.is_some(),
            tool_reviews: report.tool_reviews.len(),
            insight_errors,
            ledger: vibetrend_db::ledger_stats(&self.pool).await?,
        })
    }

    /// Write the day overview and the trending tool reviews into `report`.
    ///
    /// The overview is rewritten whenever this run analyzed something new,
    /// and tools are reviewed once per day. Failures are returned as messages.
    async fn add_insights(
        &self,
        engine: &AnalysisEngine,
        date: NaiveDate,
        report: &mut AnalysisReport,
        refreshed: bool,
    ) -> Result<Vec<String>, PipelineError> {
        let mut errors = Vec::new();

        if !report.analyzed.is_empty() && (refreshed || report.overview.is_none()) {
            match engine.overview(&report.analyzed).await {
                Ok(overview) => report.overview = Some(overview),
                Err(e) => {
                    tracing::warn!(error = %e, "day overview unavailable");
                    errors.push(e.to_string());
                }
            }
        }

        if report.tool_reviews.is_empty() {
            let tools = self.data_dir.read_trending(date)?.unwrap_or_default();
            if !tools.is_empty() {
                match engine.review_tools(&tools).await {
                    Ok(reviews) => report.tool_reviews = reviews,
                    Err(e) => {
                        tracing::warn!(error = %e, "trending tool reviews unavailable");
                        errors.push(e.to_string());
                    }
                }
            }
        }

        Ok(errors)
    }

    fn require_analysis(
        &self,
        phase: RunPhase,
        date: NaiveDate,
    ) -> Result<AnalysisReport, PipelineError> {
        self.data_dir
            .read_analysis(date)?
            .ok_or_else(|| PipelineError::MissingPrerequisite {
                phase,
                detail: format!(
                    "no analysis report at {}; run the analyze phase first",
                    self.data_dir.analysis_path(date).display()
                ),
            })
    }

    fn export(&self, date: NaiveDate) -> Result<(usize, PathBuf), PipelineError> {
        let report = self.require_analysis(RunPhase::Export, date)?;
        let picks = vibe_picks(&report);
        let path = self.data_dir.picks_path(date);
        artifacts::write_json(&path, &picks)?;
        tracing::info!(picks = picks.len(), path = %path.display(), "exported vibe picks");
        Ok((picks.len(), path))
    }

    fn email(&self, date: NaiveDate) -> Result<PathBuf, PipelineError> {
        let report = self.require_analysis(RunPhase::Email, date)?;
        let path = self.data_dir.digest_path(date);
        artifacts::write_bytes(&path, render_digest(&report).as_bytes())?;
        tracing::info!(path = %path.display(), "wrote email digest");
        Ok(path)
    }
}

/// Collapse leads sharing a fingerprint, keeping the most engaged copy, and
/// order the result by engagement so a capped run analyzes the strongest
/// signals first.
fn unique_by_fingerprint(leads: impl IntoIterator<Item = Lead>) -> Vec<Lead> {
    let mut leads: Vec<Lead> = leads.into_iter().collect();
    leads.sort_by(|a, b| b.score.cmp(&a.score));
    let mut seen = HashSet::new();
    leads.retain(|lead| seen.insert(lead.fingerprint.clone()));
    leads
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
