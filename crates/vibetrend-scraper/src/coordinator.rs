//! Runs every enabled source concurrently and gathers what came back.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use tokio::task::JoinSet;
use vibetrend_core::{AppConfig, DataDir, Lead, ScrapeMarker, SourceKind, SourcesFile};

use crate::adapter::SourceAdapter;
use crate::error::ScraperError;

/// Leads produced by one source that finished in time.
#[derive(Debug, Clone)]
pub struct SourceBatch {
    pub source: SourceKind,
    pub leads: Vec<Lead>,
}

/// A source that produced nothing usable this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnavailable {
    pub source: SourceKind,
    pub reason: String,
}

/// Aggregated result of one fetch. Both lists are in canonical source order.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub batches: Vec<SourceBatch>,
    pub failed_sources: Vec<SourceUnavailable>,
}

impl FetchOutcome {
    /// Every lead from every successful source.
    pub fn succeeded(&self) -> impl Iterator<Item = &Lead> {
        self.batches.iter().flat_map(|batch| batch.leads.iter())
    }

    #[must_use]
    pub fn lead_count(&self) -> usize {
        self.batches.iter().map(|batch| batch.leads.len()).sum()
    }

    /// True when sources were attempted and none of them succeeded.
    #[must_use]
    pub fn all_failed(&self) -> bool {
        self.batches.is_empty() && !self.failed_sources.is_empty()
    }

    fn marker(&self) -> ScrapeMarker {
        ScrapeMarker {
            completed_at: Utc::now(),
            source_counts: self
                .batches
                .iter()
                .map(|batch| (batch.source, batch.leads.len()))
                .collect(),
            failed_sources: self
                .failed_sources
                .iter()
                .map(|failure| (failure.source, failure.reason.clone()))
                .collect(),
        }
    }
}

/// What [`FetchCoordinator::collect_day`] did for a date.
#[derive(Debug, Clone)]
pub enum DayScrape {
    /// A completion marker already existed; no source was contacted.
    Skipped(ScrapeMarker),
    /// Sources were fetched and their raw results written to disk.
    Fetched {
        outcome: FetchOutcome,
        marker: Option<ScrapeMarker>,
    },
}

pub struct FetchCoordinator {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    source_timeout: Duration,
    global_timeout: Duration,
}

impl FetchCoordinator {
    #[must_use]
    pub fn new(
        adapters: Vec<Arc<dyn SourceAdapter>>,
        source_timeout: Duration,
        global_timeout: Duration,
    ) -> Self {
        Self {
            adapters,
            source_timeout,
            global_timeout,
        }
    }

    #[must_use]
    pub fn from_config(adapters: Vec<Arc<dyn SourceAdapter>>, config: &AppConfig) -> Self {
        Self::new(
            adapters,
            Duration::from_secs(config.source_timeout_secs),
            Duration::from_secs(config.global_fetch_timeout_secs),
        )
    }

    fn adapter_for(&self, kind: SourceKind) -> Option<Arc<dyn SourceAdapter>> {
        self.adapters.iter().find(|a| a.kind() == kind).cloned()
    }

    /// Fetch every enabled source concurrently.
    ///
    /// Each source runs on its own task under the per-source timeout. When the
    /// global deadline passes, tasks still running are aborted and recorded as
    /// failed; results that already arrived are kept.
    pub async fn fetch_all(&self, sources: &SourcesFile) -> FetchOutcome {
        let mut outcome = FetchOutcome::default();
        let mut pending = BTreeSet::new();
        let mut tasks = JoinSet::new();

        for (kind, settings) in sources.enabled() {
            let Some(adapter) = self.adapter_for(kind) else {
                tracing::warn!(source = %kind, "source enabled but no adapter is registered");
                outcome.failed_sources.push(SourceUnavailable {
                    source: kind,
                    reason: "no adapter registered".to_owned(),
                });
                continue;
            };
            let settings = settings.clone();
            let per_source = self.source_timeout;
            pending.insert(kind);
            tasks.spawn(async move {
                let result = tokio::time::timeout(per_source, adapter.fetch(&settings)).await;
                (kind, result)
            });
        }

        let deadline = tokio::time::Instant::now() + self.global_timeout;
        let mut global_expired = false;

        loop {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok((kind, result)))) => {
                    pending.remove(&kind);
                    match result {
                        Ok(Ok(leads)) => {
                            tracing::info!(source = %kind, leads = leads.len(), "source fetched");
                            outcome.batches.push(SourceBatch {
                                source: kind,
                                leads,
                            });
                        }
                        Ok(Err(err)) => {
                            tracing::warn!(source = %kind, error = %err, "source unavailable");
                            outcome.failed_sources.push(SourceUnavailable {
                                source: kind,
                                reason: err.to_string(),
                            });
                        }
                        Err(_) => {
                            tracing::warn!(source = %kind, timeout = ?self.source_timeout, "source timed out");
                            outcome.failed_sources.push(SourceUnavailable {
                                source: kind,
                                reason: format!("timed out after {:?}", self.source_timeout),
                            });
                        }
                    }
                }
                // The source stays pending and is reported below.
                Ok(Some(Err(join_err))) => {
                    tracing::error!(error = %join_err, "source task did not complete");
                }
                Ok(None) => break,
                Err(_) => {
                    global_expired = true;
                    tasks.abort_all();
                    break;
                }
            }
        }

        for kind in pending {
            let reason = if global_expired {
                "global fetch timeout".to_owned()
            } else {
                "source task panicked or was cancelled".to_owned()
            };
            tracing::warn!(source = %kind, reason = %reason, "source unavailable");
            outcome.failed_sources.push(SourceUnavailable {
                source: kind,
                reason,
            });
        }

        outcome.batches.sort_by_key(|batch| batch.source);
        outcome.failed_sources.sort_by_key(|failure| failure.source);
        tracing::info!(
            leads = outcome.lead_count(),
            succeeded = outcome.batches.len(),
            failed = outcome.failed_sources.len(),
            "fetch complete"
        );
        outcome
    }

    /// Fetch `date`'s sources once and persist the raw results.
    ///
    /// An existing completion marker short-circuits the fetch unless `force` is
    /// set, in which case the marker is cleared first. Raw files are written
    /// for every source that succeeded (even with zero leads). The marker is
    /// only written when at least one source succeeded, so a total outage is
    /// retried on the next run.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Artifact`] if the marker or raw files cannot be
    /// read or written. Source failures are reported in the outcome instead.
    pub async fn collect_day(
        &self,
        sources: &SourcesFile,
        data_dir: &DataDir,
        date: NaiveDate,
        force: bool,
    ) -> Result<DayScrape, ScraperError> {
        if force {
            data_dir.clear_marker(date)?;
        } else if let Some(marker) = data_dir.read_marker(date)? {
            tracing::info!(%date, completed_at = %marker.completed_at, "already scraped today, skipping fetch");
            return Ok(DayScrape::Skipped(marker));
        }

        let outcome = self.fetch_all(sources).await;
        for batch in &outcome.batches {
            let path = data_dir.write_raw(batch.source, date, &batch.leads)?;
            tracing::debug!(source = %batch.source, path = %path.display(), "wrote raw leads");
        }

        let marker = if outcome.batches.is_empty() {
            None
        } else {
            let marker = outcome.marker();
            data_dir.write_marker(date, &marker)?;
            Some(marker)
        };

        Ok(DayScrape::Fetched { outcome, marker })
    }
}
