//! AI analysis of collected leads.
//!
//! An [`AnalysisEngine`] walks an ordered list of [`AnalysisProvider`]
//! strategies (Gemini primary, Groq fallback) and turns leads into
//! [`vibetrend_core::AnalyzedLead`]s or [`vibetrend_core::FailedLead`]s.
//! The same strategies also write the day overview and the trending tool
//! reviews.

pub mod engine;
pub mod error;
pub mod gemini;
pub mod groq;
pub mod insights;
pub mod parse;
pub mod prompt;
pub mod provider;

pub use engine::{AnalysisEngine, EngineOutcome, Strategy};
pub use error::{AnalysisError, ProviderError};
pub use gemini::GeminiProvider;
pub use groq::GroqProvider;
pub use insights::{build_overview_prompt, build_tools_prompt, parse_overview, parse_tool_reviews};
pub use parse::{parse_batch, Verdict, MAX_VIBE_SCORE};
pub use prompt::build_prompt;
pub use provider::AnalysisProvider;
