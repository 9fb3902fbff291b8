//! Analysis Engine: chunked batches through an ordered provider strategy list.
//!
//! Leads that a provider cannot analyze (whole-call failure or a rejected
//! item) move on to the next strategy. Each strategy sees a lead at most once,
//! so with the default `[primary, fallback]` list there is exactly one
//! fallback hop and nothing is ever sent back to the primary.

use std::sync::Arc;

use chrono::Utc;
use vibetrend_core::{
    AnalyzedLead, AppConfig, FailedLead, Lead, ProviderRole, ToolReview, TrendOverview,
    TrendingTool,
};

use crate::error::{AnalysisError, ProviderError};
use crate::gemini::GeminiProvider;
use crate::groq::GroqProvider;
use crate::insights::{
    build_overview_prompt, build_tools_prompt, parse_overview, parse_tool_reviews,
};
use crate::parse::Verdict;
use crate::provider::AnalysisProvider;

/// One entry of the ordered provider list.
#[derive(Clone)]
pub struct Strategy {
    pub role: ProviderRole,
    pub provider: Arc<dyn AnalysisProvider>,
}

impl Strategy {
    #[must_use]
    pub fn new(role: ProviderRole, provider: Arc<dyn AnalysisProvider>) -> Self {
        Self { role, provider }
    }
}

#[derive(Debug, Default)]
pub struct EngineOutcome {
    pub analyzed: Vec<AnalyzedLead>,
    pub failed: Vec<FailedLead>,
    /// `true` once any provider produced an answer, even one that failed
    /// validation. Stays `false` when every call was throttled, refused or
    /// never connected.
    pub provider_reachable: bool,
}

pub struct AnalysisEngine {
    strategies: Vec<Strategy>,
    chunk_size: usize,
}

impl AnalysisEngine {
    /// # Errors
    ///
    /// Returns [`AnalysisError::NoProviders`] if `strategies` is empty.
    pub fn new(strategies: Vec<Strategy>, chunk_size: usize) -> Result<Self, AnalysisError> {
        if strategies.is_empty() {
            return Err(AnalysisError::NoProviders);
        }
        Ok(Self {
            strategies,
            chunk_size: chunk_size.max(1),
        })
    }

    /// Gemini as primary and Groq as fallback, each included only when its
    /// API key is configured.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::NoProviders`] when neither key is set, or
    /// [`AnalysisError::Http`] if a provider client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, AnalysisError> {
        let mut strategies = Vec::with_capacity(2);
        if let Some(key) = config.primary_api_key.as_deref() {
            let provider = GeminiProvider::new(
                key,
                &config.primary_model,
                config.provider_timeout_secs,
            )?;
            strategies.push(Strategy::new(ProviderRole::Primary, Arc::new(provider)));
        }
        if let Some(key) = config.fallback_api_key.as_deref() {
            let provider =
                GroqProvider::new(key, &config.fallback_model, config.provider_timeout_secs)?;
            strategies.push(Strategy::new(ProviderRole::Fallback, Arc::new(provider)));
        }
        if strategies.len() < 2 {
            tracing::warn!(
                configured = strategies.len(),
                "only one AI provider configured; leads it cannot analyze will fail without a fallback"
            );
        }
        Self::new(strategies, config.analysis_chunk_size)
    }

    /// Analyze `leads` chunk by chunk. Never fails as a whole: every input
    /// lead ends up in exactly one of `analyzed` or `failed`.
    pub async fn analyze(&self, leads: Vec<Lead>) -> EngineOutcome {
        let mut outcome = EngineOutcome::default();
        let total = leads.len();
        let mut leads = leads.into_iter().peekable();
        let mut chunk_index = 0_usize;

        while leads.peek().is_some() {
            let chunk: Vec<Lead> = leads.by_ref().take(self.chunk_size).collect();
            chunk_index += 1;
            tracing::debug!(chunk = chunk_index, size = chunk.len(), "analyzing chunk");
            self.analyze_chunk(chunk, &mut outcome).await;
        }

        tracing::info!(
            total,
            analyzed = outcome.analyzed.len(),
            failed = outcome.failed.len(),
            provider_reachable = outcome.provider_reachable,
            "analysis finished"
        );
        outcome
    }

    async fn analyze_chunk(&self, chunk: Vec<Lead>, outcome: &mut EngineOutcome) {
        let mut pending = chunk;
        let mut errors: Vec<Vec<String>> = vec![Vec::new(); pending.len()];

        for strategy in &self.strategies {
            if pending.is_empty() {
                break;
            }
            let name = strategy.provider.name().to_owned();

            match strategy.provider.analyze(&pending).await {
                Ok(results) => {
                    outcome.provider_reachable = true;
                    let mut results = results.into_iter();
                    let mut still_pending = Vec::new();
                    let mut still_errors = Vec::new();

                    for (lead, mut lead_errors) in pending.into_iter().zip(errors) {
                        let result = results
                            .next()
                            .unwrap_or_else(|| Err("missing from response".to_owned()));
                        match result {
                            Ok(verdict) => {
                                outcome.analyzed.push(attach(lead, verdict, strategy.role, &name));
                            }
                            Err(reason) => {
                                tracing::debug!(
                                    provider = %name,
                                    fingerprint = %lead.fingerprint,
                                    reason = %reason,
                                    "item rejected"
                                );
                                lead_errors.push(format!("{name}: {reason}"));
                                still_pending.push(lead);
                                still_errors.push(lead_errors);
                            }
                        }
                    }
                    pending = still_pending;
                    errors = still_errors;
                }
                Err(err) => {
                    if err.provider_answered() {
                        outcome.provider_reachable = true;
                    }
                    tracing::warn!(
                        provider = %name,
                        role = %strategy.role,
                        kind = err.kind(),
                        leads = pending.len(),
                        error = %err,
                        "provider call failed; moving chunk to next strategy"
                    );
                    let message = err.to_string();
                    for lead_errors in &mut errors {
                        lead_errors.push(message.clone());
                    }
                }
            }
        }

        for (lead, lead_errors) in pending.into_iter().zip(errors) {
            tracing::warn!(
                fingerprint = %lead.fingerprint,
                title = %lead.title,
                attempts = lead_errors.len(),
                "analysis exhausted every provider"
            );
            outcome.failed.push(FailedLead {
                fingerprint: lead.fingerprint,
                errors: lead_errors,
            });
        }
    }

    /// Day overview over the analyzed leads, written by the first strategy
    /// whose answer parses.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::Exhausted`] when no strategy produced a usable
    /// overview.
    pub async fn overview(&self, leads: &[AnalyzedLead]) -> Result<TrendOverview, AnalysisError> {
        let prompt = build_overview_prompt(leads);
        let (provider_name, answer) = self.first_valid("overview", &prompt, parse_overview).await?;
        Ok(TrendOverview {
            summary: answer.summary.trim().to_owned(),
            trending_categories: answer.trending_categories,
            emerging_patterns: answer.emerging_patterns,
            provider_name,
            generated_at: Utc::now(),
        })
    }

    /// # Errors
    ///
    /// [`AnalysisError::Exhausted`] when no strategy produced usable reviews.
    pub async fn review_tools(
        &self,
        tools: &[TrendingTool],
    ) -> Result<Vec<ToolReview>, AnalysisError> {
        let prompt = build_tools_prompt(tools);
        let (_, reviews) = self
            .first_valid("tool review", &prompt, |provider, answer| {
                parse_tool_reviews(provider, answer, tools)
            })
            .await?;
        Ok(reviews)
    }

    async fn first_valid<T>(
        &self,
        task: &'static str,
        prompt: &str,
        parse: impl Fn(&str, &str) -> Result<T, ProviderError>,
    ) -> Result<(String, T), AnalysisError> {
        let mut errors = Vec::new();
        let mut provider_reachable = false;

        for strategy in &self.strategies {
            let name = strategy.provider.name().to_owned();
            let result = match strategy.provider.complete(prompt).await {
                Ok(answer) => {
                    provider_reachable = true;
                    parse(&name, &answer)
                }
                Err(err) => Err(err),
            };
            match result {
                Ok(value) => {
                    tracing::info!(provider = %name, task, "day-level analysis written");
                    return Ok((name, value));
                }
                Err(err) => {
                    if err.provider_answered() {
                        provider_reachable = true;
                    }
                    tracing::warn!(
                        provider = %name,
                        role = %strategy.role,
                        kind = err.kind(),
                        task,
                        error = %err,
                        "provider call failed; trying next strategy"
                    );
                    errors.push(err.to_string());
                }
            }
        }

        Err(AnalysisError::Exhausted {
            task,
            errors,
            provider_reachable,
        })
    }
}

fn attach(lead: Lead, verdict: Verdict, role: ProviderRole, provider: &str) -> AnalyzedLead {
    AnalyzedLead {
        lead,
        vibe_score: verdict.vibe_score,
        summary: verdict.summary,
        pros: verdict.pros,
        cons: verdict.cons,
        business_ideas: verdict.business_ideas,
        provider_used: role,
        provider_name: provider.to_owned(),
        analyzed_at: Utc::now(),
    }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
