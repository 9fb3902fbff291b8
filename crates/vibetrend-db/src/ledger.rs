//! Deduplication ledger over the `lead_ledger` table.
//!
//! The ledger owns fingerprint history. It only accumulates: rows are inserted
//! and their status moves between `pending`, `analyzed` and `analysis_failed`,
//! but nothing here deletes a row.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use vibetrend_core::{AnalyzedLead, FailedLead, Lead, LeadStatus};

use crate::DbError;

const INTERRUPTED_ERROR: &str = "run interrupted before analysis completed";

/// A row from the `lead_ledger` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LedgerRow {
    pub fingerprint: String,
    pub source: String,
    pub external_id: String,
    pub title: String,
    pub url: String,
    pub status: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    /// Number of times the lead has been handed to the analysis engine.
    pub attempts: i64,
    pub vibe_score: Option<i64>,
    pub provider_used: Option<String>,
    pub analyzed_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl LedgerRow {
    /// # Errors
    ///
    /// Returns [`DbError::InvalidStatus`] if the stored value is not a known status.
    pub fn lead_status(&self) -> Result<LeadStatus, DbError> {
        self.status
            .parse::<LeadStatus>()
            .map_err(|_| DbError::InvalidStatus {
                fingerprint: self.fingerprint.clone(),
                value: self.status.clone(),
            })
    }
}

/// Ledger size per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerStats {
    pub pending: i64,
    pub analyzed: i64,
    pub analysis_failed: i64,
}

impl LedgerStats {
    #[must_use]
    pub fn total(&self) -> i64 {
        self.pending + self.analyzed + self.analysis_failed
    }
}

/// Register `leads` in the ledger and return the ones that need analysis.
///
/// A lead is returned when its fingerprint was unknown or previously ended in
/// `analysis_failed`; returned leads are left `pending`. Every lead gets
/// `last_seen = now`, `first_seen` is only written on insert. Each fingerprint
/// is read and written inside its own transaction, so a fingerprint repeated
/// within `leads` is returned once.
///
/// # Errors
///
/// Returns [`DbError`] if any query fails or a stored status is unrecognized.
pub async fn filter_new(
    pool: &SqlitePool,
    leads: &[Lead],
    now: DateTime<Utc>,
) -> Result<Vec<Lead>, DbError> {
    let mut fresh = Vec::new();

    for lead in leads {
        let mut tx = pool.begin().await?;

        let existing: Option<String> =
            sqlx::query_scalar("SELECT status FROM lead_ledger WHERE fingerprint = ?")
                .bind(&lead.fingerprint)
                .fetch_optional(&mut *tx)
                .await?;

        let eligible = match existing.as_deref() {
            None => {
                sqlx::query(
                    "INSERT INTO lead_ledger \
                     (fingerprint, source, external_id, title, url, status, first_seen, last_seen, attempts) \
                     VALUES (?, ?, ?, ?, ?, 'pending', ?, ?, 1)",
                )
                .bind(&lead.fingerprint)
                .bind(lead.source.as_str())
                .bind(&lead.external_id)
                .bind(&lead.title)
                .bind(&lead.url)
                .bind(now)
                .bind(now)
                .execute(&mut *tx)
                .await?;
                true
            }
            Some(raw) => {
                let status = raw.parse::<LeadStatus>().map_err(|_| DbError::InvalidStatus {
                    fingerprint: lead.fingerprint.clone(),
                    value: raw.to_string(),
                })?;

                if status == LeadStatus::AnalysisFailed {
                    sqlx::query(
                        "UPDATE lead_ledger \
                         SET status = 'pending', last_seen = ?, attempts = attempts + 1 \
                         WHERE fingerprint = ?",
                    )
                    .bind(now)
                    .bind(&lead.fingerprint)
                    .execute(&mut *tx)
                    .await?;
                    true
                } else {
                    sqlx::query("UPDATE lead_ledger SET last_seen = ? WHERE fingerprint = ?")
                        .bind(now)
                        .bind(&lead.fingerprint)
                        .execute(&mut *tx)
                        .await?;
                    false
                }
            }
        };

        tx.commit().await?;

        if eligible {
            fresh.push(lead.clone());
        }
    }

    tracing::debug!(
        seen = leads.len(),
        eligible = fresh.len(),
        "filtered leads against ledger"
    );
    Ok(fresh)
}

/// Move a fingerprint to a terminal status.
///
/// # Errors
///
/// Returns [`DbError::InvalidTransition`] for `Pending`, [`DbError::NotFound`]
/// if the fingerprint has never been registered, or [`DbError::Sqlx`].
pub async fn mark_analyzed(
    pool: &SqlitePool,
    fingerprint: &str,
    status: LeadStatus,
) -> Result<(), DbError> {
    if status == LeadStatus::Pending {
        return Err(DbError::InvalidTransition {
            fingerprint: fingerprint.to_string(),
            status: status.as_str(),
        });
    }

    let result = sqlx::query("UPDATE lead_ledger SET status = ? WHERE fingerprint = ?")
        .bind(status.as_str())
        .bind(fingerprint)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Mark a lead `analyzed` and store the verdict summary on its ledger row.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the fingerprint has never been registered,
/// or [`DbError::Sqlx`].
pub async fn record_analysis(pool: &SqlitePool, analyzed: &AnalyzedLead) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE lead_ledger \
         SET status = 'analyzed', vibe_score = ?, provider_used = ?, analyzed_at = ?, last_error = NULL \
         WHERE fingerprint = ?",
    )
    .bind(i64::from(analyzed.vibe_score))
    .bind(analyzed.provider_used.as_str())
    .bind(analyzed.analyzed_at)
    .bind(analyzed.fingerprint())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Mark a lead `analysis_failed`, keeping the provider errors for inspection.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the fingerprint has never been registered,
/// or [`DbError::Sqlx`].
pub async fn mark_failed(pool: &SqlitePool, failed: &FailedLead) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE lead_ledger SET status = 'analysis_failed', last_error = ? WHERE fingerprint = ?",
    )
    .bind(failed.errors.join("; "))
    .bind(&failed.fingerprint)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Release leads stranded in `pending` by a run that never finished.
///
/// Rows last seen before `now` move to `analysis_failed`, which makes them
/// eligible again under [`filter_new`]. Returns the number of rows moved.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn recover_interrupted(pool: &SqlitePool, now: DateTime<Utc>) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE lead_ledger SET status = 'analysis_failed', last_error = ? \
         WHERE status = 'pending' AND last_seen < ?",
    )
    .bind(INTERRUPTED_ERROR)
    .bind(now)
    .execute(pool)
    .await?;

    let recovered = result.rows_affected();
    if recovered > 0 {
        tracing::warn!(recovered, "recovered leads left pending by an interrupted run");
    }
    Ok(recovered)
}

/// # Errors
///
/// Returns [`DbError`] if the query fails or a stored status is unrecognized.
pub async fn ledger_stats(pool: &SqlitePool) -> Result<LedgerStats, DbError> {
    let rows: Vec<(String, i64)> =
        sqlx::query_as("SELECT status, COUNT(*) FROM lead_ledger GROUP BY status")
            .fetch_all(pool)
            .await?;

    let mut stats = LedgerStats::default();
    for (status, count) in rows {
        match status.parse::<LeadStatus>() {
            Ok(LeadStatus::Pending) => stats.pending = count,
            Ok(LeadStatus::Analyzed) => stats.analyzed = count,
            Ok(LeadStatus::AnalysisFailed) => stats.analysis_failed = count,
            Err(_) => {
                return Err(DbError::InvalidStatus {
                    fingerprint: String::from("*"),
                    value: status,
                })
            }
        }
    }
    Ok(stats)
}

/// Fetch a single ledger row by fingerprint.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_entry(pool: &SqlitePool, fingerprint: &str) -> Result<Option<LedgerRow>, DbError> {
    let row = sqlx::query_as::<_, LedgerRow>(
        "SELECT fingerprint, source, external_id, title, url, status, first_seen, last_seen, \
                attempts, vibe_score, provider_used, analyzed_at, last_error \
         FROM lead_ledger \
         WHERE fingerprint = ?",
    )
    .bind(fingerprint)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
