//! Hand-off artifacts built from a day's analysis report: the vibe picks
//! export and the plain-text email digest.
//!
//! The digest opens with the day overview when one was written, lists the
//! top leads, and ends with the trending AI tool reviews.

use std::fmt::Write as _;

use vibetrend_core::{AnalysisReport, AnalyzedLead, ToolReview, TrendOverview};

/// Minimum vibe score for a lead to be exported as a pick.
pub const PICK_THRESHOLD: u8 = 70;

/// Number of leads listed in the email digest.
pub const DIGEST_TOP: usize = 10;

/// Analyzed leads at or above [`PICK_THRESHOLD`], best first.
#[must_use]
pub fn vibe_picks(report: &AnalysisReport) -> Vec<AnalyzedLead> {
    let mut picks: Vec<AnalyzedLead> = report
        .analyzed
        .iter()
        .filter(|a| a.vibe_score >= PICK_THRESHOLD)
        .cloned()
        .collect();
    sort_best_first(&mut picks);
    picks
}

/// Ties on vibe score fall back to source engagement, then title.
fn sort_best_first(leads: &mut [AnalyzedLead]) {
    leads.sort_by(|a, b| {
        b.vibe_score
            .cmp(&a.vibe_score)
            .then_with(|| b.lead.score.cmp(&a.lead.score))
            .then_with(|| a.lead.title.cmp(&b.lead.title))
    });
}

#[must_use]
pub fn render_digest(report: &AnalysisReport) -> String {
    let mut ranked = report.analyzed.clone();
    sort_best_first(&mut ranked);

    let mut out = String::new();
    let _ = writeln!(out, "Vibe Coding Trends for {}", report.run_date.format("%Y-%m-%d"));
    let _ = writeln!(
        out,
        "{} leads analyzed, {} picks scoring {PICK_THRESHOLD}+, {} failed analysis",
        report.analyzed.len(),
        ranked
            .iter()
            .filter(|a| a.vibe_score >= PICK_THRESHOLD)
            .count(),
        report.failed.len()
    );

    if let Some(overview) = &report.overview {
        render_overview(&mut out, overview);
    }

    if ranked.is_empty() {
        out.push_str("\nNo leads were analyzed for this day.\n");
    } else {
        render_top(&mut out, &ranked);
    }

    if !report.tool_reviews.is_empty() {
        render_tools(&mut out, &report.tool_reviews);
    }
    out
}

fn render_overview(out: &mut String, overview: &TrendOverview) {
    let _ = writeln!(out, "\nThis week: {}", overview.summary);
    if !overview.trending_categories.is_empty() {
        let _ = writeln!(
            out,
            "Trending categories: {}",
            overview.trending_categories.join(", ")
        );
    }
    if !overview.emerging_patterns.is_empty() {
        out.push_str("\nEmerging patterns:\n");
        for pattern in &overview.emerging_patterns {
            let _ = writeln!(out, "- {}", pattern.pattern);
            if !pattern.description.is_empty() {
                let _ = writeln!(out, "  {}", pattern.description);
            }
            if !pattern.opportunity.is_empty() {
                let _ = writeln!(out, "  Opportunity: {}", pattern.opportunity);
            }
        }
    }
}

fn render_top(out: &mut String, ranked: &[AnalyzedLead]) {
    let _ = writeln!(out, "\nTop {}:", DIGEST_TOP.min(ranked.len()));
    for (rank, analyzed) in ranked.iter().take(DIGEST_TOP).enumerate() {
        let lead = &analyzed.lead;
        let _ = writeln!(
            out,
            "\n{}. [{}] {} ({})",
            rank + 1,
            analyzed.vibe_score,
            lead.title,
            lead.source
        );
        let _ = writeln!(out, "   {}", lead.url);
        let _ = writeln!(out, "   {}", analyzed.summary);
        for idea in &analyzed.business_ideas {
            let _ = writeln!(out, "   - {idea}");
        }
    }
}

fn render_tools(out: &mut String, reviews: &[ToolReview]) {
    out.push_str("\nTrending AI tools:\n");
    for review in reviews {
        let _ = writeln!(out, "\n* {} ({})", review.name, review.url);
        if !review.what_it_does.is_empty() {
            let _ = writeln!(out, "  {}", review.what_it_does);
        }
        if !review.review.is_empty() {
            let _ = writeln!(out, "  Review: {}", review.review);
        }
        for idea in &review.revenue_potential {
            let _ = writeln!(out, "  $ {idea}");
        }
    }
}
