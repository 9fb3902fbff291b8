//! On-disk layout of per-day run artifacts.
//!
//! ```text
//! {root}/{YYYYMMDD}/scraped_data/{source}_{YYYYMMDD}.json
//! {root}/{YYYYMMDD}/scraped_data/scrape_complete.json
//! {root}/{YYYYMMDD}/scraped_data/trending_ai_{YYYYMMDD}.json
//! {root}/{YYYYMMDD}/reports/analysis_{YYYYMMDD}.json
//! {root}/{YYYYMMDD}/reports/vibe_picks_{YYYYMMDD}.json
//! {root}/{YYYYMMDD}/reports/digest_{YYYYMMDD}.txt
//! ```
//!
//! All writes go through a temp file and a rename so a crashed run never
//! leaves a half-written artifact behind.

use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::ArtifactError;
use crate::lead::{AnalyzedLead, FailedLead, Lead, SourceKind};
use crate::trend::{ToolReview, TrendOverview, TrendingTool};

/// Per-day completion marker written after a scrape phase finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeMarker {
    pub completed_at: DateTime<Utc>,
    pub source_counts: BTreeMap<SourceKind, usize>,
    #[serde(default)]
    pub failed_sources: BTreeMap<SourceKind, String>,
}

/// Analysis output for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub run_date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub analyzed: Vec<AnalyzedLead>,
    /// Fingerprints of leads that exhausted every provider.
    pub failed: Vec<String>,
    #[serde(default)]
    pub failure_details: Vec<FailedLead>,
    #[serde(default)]
    pub overview: Option<TrendOverview>,
    #[serde(default)]
    pub tool_reviews: Vec<ToolReview>,
}

impl AnalysisReport {
    #[must_use]
    pub fn new(
        run_date: NaiveDate,
        generated_at: DateTime<Utc>,
        analyzed: Vec<AnalyzedLead>,
        failure_details: Vec<FailedLead>,
    ) -> Self {
        let failed = failure_details
            .iter()
            .map(|f| f.fingerprint.clone())
            .collect();
        Self {
            run_date,
            generated_at,
            analyzed,
            failed,
            failure_details,
            overview: None,
            tool_reviews: Vec::new(),
        }
    }

    /// Fold a later same-day report into this one.
    ///
    /// Newer verdicts replace older ones for the same fingerprint, and a lead
    /// analyzed by either report is no longer listed as failed. The overview
    /// and tool reviews are taken from `newer` when it has them.
    #[must_use]
    pub fn merge(self, newer: AnalysisReport) -> AnalysisReport {
        let newer_fps: HashSet<&str> = newer.analyzed.iter().map(|a| a.fingerprint()).collect();
        let mut analyzed: Vec<AnalyzedLead> = self
            .analyzed
            .into_iter()
            .filter(|a| !newer_fps.contains(a.fingerprint()))
            .collect();
        analyzed.extend(newer.analyzed);

        let analyzed_fps: HashSet<String> =
            analyzed.iter().map(|a| a.fingerprint().to_string()).collect();
        let mut seen = HashSet::new();
        let failure_details: Vec<FailedLead> = newer
            .failure_details
            .into_iter()
            .chain(self.failure_details)
            .filter(|f| !analyzed_fps.contains(&f.fingerprint))
            .filter(|f| seen.insert(f.fingerprint.clone()))
            .collect();

        let overview = newer.overview.or(self.overview);
        let tool_reviews = if newer.tool_reviews.is_empty() {
            self.tool_reviews
        } else {
            newer.tool_reviews
        };

        AnalysisReport {
            overview,
            tool_reviews,
            ..AnalysisReport::new(newer.run_date, newer.generated_at, analyzed, failure_details)
        }
    }
}

/// Root of the artifact tree.
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn date_stamp(date: NaiveDate) -> String {
        date.format("%Y%m%d").to_string()
    }

    #[must_use]
    pub fn day_dir(&self, date: NaiveDate) -> PathBuf {
        self.root.join(Self::date_stamp(date))
    }

    #[must_use]
    pub fn scraped_dir(&self, date: NaiveDate) -> PathBuf {
        self.day_dir(date).join("scraped_data")
    }

    #[must_use]
    pub fn reports_dir(&self, date: NaiveDate) -> PathBuf {
        self.day_dir(date).join("reports")
    }

    #[must_use]
    pub fn raw_path(&self, source: SourceKind, date: NaiveDate) -> PathBuf {
        self.scraped_dir(date)
            .join(format!("{source}_{}.json", Self::date_stamp(date)))
    }

    #[must_use]
    pub fn marker_path(&self, date: NaiveDate) -> PathBuf {
        self.scraped_dir(date).join("scrape_complete.json")
    }

    #[must_use]
    pub fn trending_path(&self, date: NaiveDate) -> PathBuf {
        self.scraped_dir(date)
            .join(format!("trending_ai_{}.json", Self::date_stamp(date)))
    }

    #[must_use]
    pub fn analysis_path(&self, date: NaiveDate) -> PathBuf {
        self.reports_dir(date)
            .join(format!("analysis_{}.json", Self::date_stamp(date)))
    }

    #[must_use]
    pub fn picks_path(&self, date: NaiveDate) -> PathBuf {
        self.reports_dir(date)
            .join(format!("vibe_picks_{}.json", Self::date_stamp(date)))
    }

    #[must_use]
    pub fn digest_path(&self, date: NaiveDate) -> PathBuf {
        self.reports_dir(date)
            .join(format!("digest_{}.txt", Self::date_stamp(date)))
    }

    /// Persist one source's raw leads for `date`, replacing any earlier file.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError`] if the file cannot be serialized or written.
    pub fn write_raw(
        &self,
        source: SourceKind,
        date: NaiveDate,
        leads: &[Lead],
    ) -> Result<PathBuf, ArtifactError> {
        let path = self.raw_path(source, date);
        write_json(&path, &leads)?;
        Ok(path)
    }

    /// Read every raw source file present for `date`, in canonical source order.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError`] if a present file cannot be read or parsed.
    pub fn read_raw_all(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<(SourceKind, Vec<Lead>)>, ArtifactError> {
        let mut batches = Vec::new();
        for source in SourceKind::ALL {
            if let Some(leads) = read_json::<Vec<Lead>>(&self.raw_path(source, date))? {
                batches.push((source, leads));
            }
        }
        Ok(batches)
    }

    /// # Errors
    ///
    /// Returns [`ArtifactError`] if the file cannot be serialized or written.
    pub fn write_trending(
        &self,
        date: NaiveDate,
        tools: &[TrendingTool],
    ) -> Result<PathBuf, ArtifactError> {
        let path = self.trending_path(date);
        write_json(&path, &tools)?;
        Ok(path)
    }

    /// # Errors
    ///
    /// Returns [`ArtifactError`] if a present file cannot be read or parsed.
    pub fn read_trending(
        &self,
        date: NaiveDate,
    ) -> Result<Option<Vec<TrendingTool>>, ArtifactError> {
        read_json(&self.trending_path(date))
    }

    /// # Errors
    ///
    /// Returns [`ArtifactError`] if the marker cannot be written.
    pub fn write_marker(
        &self,
        date: NaiveDate,
        marker: &ScrapeMarker,
    ) -> Result<PathBuf, ArtifactError> {
        let path = self.marker_path(date);
        write_json(&path, marker)?;
        Ok(path)
    }

    /// # Errors
    ///
    /// Returns [`ArtifactError`] if a marker exists but cannot be read or parsed.
    pub fn read_marker(&self, date: NaiveDate) -> Result<Option<ScrapeMarker>, ArtifactError> {
        read_json(&self.marker_path(date))
    }

    /// Drop the completion marker so the next scrape runs again.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError`] if an existing marker cannot be removed.
    pub fn clear_marker(&self, date: NaiveDate) -> Result<(), ArtifactError> {
        let path = self.marker_path(date);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    /// # Errors
    ///
    /// Returns [`ArtifactError`] if the report cannot be written.
    pub fn write_analysis(
        &self,
        date: NaiveDate,
        report: &AnalysisReport,
    ) -> Result<PathBuf, ArtifactError> {
        let path = self.analysis_path(date);
        write_json(&path, report)?;
        Ok(path)
    }

    /// # Errors
    ///
    /// Returns [`ArtifactError`] if a report exists but cannot be read or parsed.
    pub fn read_analysis(&self, date: NaiveDate) -> Result<Option<AnalysisReport>, ArtifactError> {
        read_json(&self.analysis_path(date))
    }
}

/// Serialize `value` as pretty JSON to `path`, creating parent directories.
///
/// # Errors
///
/// Returns [`ArtifactError`] on serialization or I/O failure.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ArtifactError> {
    let body = serde_json::to_vec_pretty(value).map_err(|e| ArtifactError::Json {
        path: path.display().to_string(),
        source: e,
    })?;
    write_bytes(path, &body)
}

/// Write `body` to `path` atomically, creating parent directories.
///
/// # Errors
///
/// Returns [`ArtifactError::Io`] on failure.
pub fn write_bytes(path: &Path, body: &[u8]) -> Result<(), ArtifactError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| io_error(parent, e))?;
    tmp.write_all(body).map_err(|e| io_error(tmp.path(), e))?;
    tmp.as_file().sync_all().map_err(|e| io_error(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| io_error(path, e.error))?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, ArtifactError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_error(path, e)),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| ArtifactError::Json {
            path: path.display().to_string(),
            source: e,
        })
}

fn io_error(path: &Path, source: std::io::Error) -> ArtifactError {
    ArtifactError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
#[path = "artifacts_test.rs"]
mod tests;
