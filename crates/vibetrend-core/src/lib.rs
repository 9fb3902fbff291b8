//! Shared domain types and configuration for the vibetrend pipeline.
//!
//! Every other crate in the workspace speaks in terms of [`Lead`] and
//! [`AnalyzedLead`]; source-specific record shapes never leave the adapters.

pub mod app_config;
pub mod artifacts;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod lead;
pub mod run;
pub mod sources;
pub mod trend;

pub use app_config::AppConfig;
pub use artifacts::{AnalysisReport, DataDir, ScrapeMarker};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ArtifactError, ConfigError};
pub use fingerprint::{fingerprint, normalize_title, normalize_url};
pub use lead::{AnalyzedLead, FailedLead, Lead, LeadStatus, ProviderRole, SourceKind};
pub use run::{Run, RunPhase};
pub use sources::{load_sources, parse_sources, SourceSettings, SourcesFile, TrendingSettings};
pub use trend::{EmergingPattern, ToolReview, TrendOverview, TrendingTool};
