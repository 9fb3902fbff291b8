use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One stage of the pipeline. Declaration order is execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunPhase {
    Scrape,
    Analyze,
    Export,
    Email,
}

impl RunPhase {
    pub const ALL: [RunPhase; 4] = [
        RunPhase::Scrape,
        RunPhase::Analyze,
        RunPhase::Export,
        RunPhase::Email,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RunPhase::Scrape => "scrape",
            RunPhase::Analyze => "analyze",
            RunPhase::Export => "export",
            RunPhase::Email => "email",
        }
    }
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single pipeline execution. Only the date survives the process, as the
/// label on artifact paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub run_date: NaiveDate,
    pub phases_executed: Vec<RunPhase>,
    pub force_rescrape: bool,
}

impl Run {
    /// Build a run for `requested` phases. An empty request means every phase;
    /// duplicates are dropped and the result is in canonical order.
    #[must_use]
    pub fn new(run_date: NaiveDate, requested: &[RunPhase], force_rescrape: bool) -> Self {
        let phases_executed = if requested.is_empty() {
            RunPhase::ALL.to_vec()
        } else {
            RunPhase::ALL
                .into_iter()
                .filter(|phase| requested.contains(phase))
                .collect()
        };
        Self {
            run_date,
            phases_executed,
            force_rescrape,
        }
    }

    #[must_use]
    pub fn includes(&self, phase: RunPhase) -> bool {
        self.phases_executed.contains(&phase)
    }
}
