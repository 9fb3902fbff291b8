//! What a run did, printed to stdout when it finishes.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use vibetrend_core::SourceKind;
use vibetrend_db::LedgerStats;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeSummary {
    /// The day was already scraped and no source was contacted.
    pub skipped: bool,
    pub source_counts: BTreeMap<SourceKind, usize>,
    pub failed_sources: BTreeMap<SourceKind, String>,
    /// Trending AI tools stored for the day, if the list was fetched.
    pub trending_tools: Option<usize>,
    pub trending_error: Option<String>,
}

impl ScrapeSummary {
    #[must_use]
    pub fn lead_count(&self) -> usize {
        self.source_counts.values().sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalyzeSummary {
    pub raw_leads: usize,
    pub unique_leads: usize,
    pub new_leads: usize,
    /// New leads beyond the per-run cap, left eligible for the next run.
    pub deferred: usize,
    pub recovered: u64,
    pub analyzed: usize,
    pub failed_fingerprints: Vec<String>,
    /// The report carries a day overview.
    pub overview: bool,
    pub tool_reviews: usize,
    pub insight_errors: Vec<String>,
    pub ledger: LedgerStats,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub run_date: Option<NaiveDate>,
    pub scrape: Option<ScrapeSummary>,
    pub analyze: Option<AnalyzeSummary>,
    pub export: Option<(usize, PathBuf)>,
    pub email: Option<PathBuf>,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(date) = self.run_date {
            writeln!(f, "run {}", date.format("%Y-%m-%d"))?;
        }

        if let Some(scrape) = &self.scrape {
            if scrape.skipped {
                writeln!(
                    f,
                    "scrape: skipped, already collected today ({} leads; pass --force to refetch)",
                    scrape.lead_count()
                )?;
            } else {
                writeln!(
                    f,
                    "scrape: {} leads from {} sources, {} failed",
                    scrape.lead_count(),
                    scrape.source_counts.len(),
                    scrape.failed_sources.len()
                )?;
            }
            for (source, count) in &scrape.source_counts {
                writeln!(f, "  {source}: {count}")?;
            }
            for (source, reason) in &scrape.failed_sources {
                writeln!(f, "  {source}: FAILED ({reason})")?;
            }
            if let Some(tools) = scrape.trending_tools {
                writeln!(f, "  trending AI tools: {tools}")?;
            }
            if let Some(reason) = &scrape.trending_error {
                writeln!(f, "  trending AI tools: FAILED ({reason})")?;
            }
        }

        if let Some(analyze) = &self.analyze {
            writeln!(
                f,
                "analyze: {} raw, {} unique, {} new, {} analyzed, {} failed",
                analyze.raw_leads,
                analyze.unique_leads,
                analyze.new_leads,
                analyze.analyzed,
                analyze.failed_fingerprints.len()
            )?;
            if analyze.deferred > 0 {
                writeln!(f, "  {} deferred to the next run", analyze.deferred)?;
            }
            if analyze.recovered > 0 {
                writeln!(f, "  {} recovered from an interrupted run", analyze.recovered)?;
            }
            for fingerprint in &analyze.failed_fingerprints {
                writeln!(f, "  failed: {fingerprint}")?;
            }
            if analyze.overview {
                writeln!(f, "  overview: written")?;
            }
            if analyze.tool_reviews > 0 {
                writeln!(f, "  trending tools reviewed: {}", analyze.tool_reviews)?;
            }
            for error in &analyze.insight_errors {
                writeln!(f, "  insight failed: {error}")?;
            }
            let ledger = &analyze.ledger;
            writeln!(
                f,
                "  ledger: {} total ({} analyzed, {} failed, {} pending)",
                ledger.total(),
                ledger.analyzed,
                ledger.analysis_failed,
                ledger.pending
            )?;
        }

        if let Some((picks, path)) = &self.export {
            writeln!(f, "export: {picks} vibe picks -> {}", path.display())?;
        }
        if let Some(path) = &self.email {
            writeln!(f, "email: digest -> {}", path.display())?;
        }
        Ok(())
    }
}
