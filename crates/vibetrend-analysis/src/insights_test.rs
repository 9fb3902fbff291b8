use chrono::Utc;
use vibetrend_core::{Lead, ProviderRole, SourceKind};

use super::*;

fn analyzed(title: &str, vibe_score: u8) -> AnalyzedLead {
    AnalyzedLead {
        lead: Lead::new(
            SourceKind::Reddit,
            title,
            title,
            format!("https://{title}.io"),
            "",
            Utc::now(),
        ),
        vibe_score,
        summary: format!("{title} summary"),
        pros: Vec::new(),
        cons: Vec::new(),
        business_ideas: ["a".to_owned(), "b".to_owned(), "c".to_owned()],
        provider_used: ProviderRole::Primary,
        provider_name: "gemini".to_owned(),
        analyzed_at: Utc::now(),
    }
}

fn tool(name: &str) -> TrendingTool {
    TrendingTool {
        name: name.to_owned(),
        url: format!("https://{}.ai", name.to_lowercase()),
        description: "AI helper".to_owned(),
        votes: 100,
        topics: vec!["artificial-intelligence".to_owned()],
    }
}

#[test]
fn overview_prompt_keeps_the_best_leads_first() {
    let mut leads: Vec<AnalyzedLead> = (0..40)
        .map(|i| analyzed(&format!("lead{i:02}"), u8::try_from(i).unwrap()))
        .collect();
    leads.reverse();

    let prompt = build_overview_prompt(&leads);
    assert!(prompt.contains("\"title\": \"lead39\""));
    assert!(prompt.contains("\"title\": \"lead10\""));
    assert!(!prompt.contains("\"title\": \"lead09\""));
    let best = prompt.find("lead39").unwrap();
    let worst = prompt.find("lead10").unwrap();
    assert!(best < worst);
}

#[test]
fn overview_parses_despite_surrounding_prose() {
    let answer = r#"Here is the brief [draft]:
```json
{"summary": "AI invoicing is hot.", "trending_categories": ["fintech", "automation"],
 "emerging_patterns": [{"pattern": "Agent wrappers", "examples": ["invoice-bot"]}]}
```"#;
    let overview = parse_overview("gemini", answer).expect("overview parses");
    assert_eq!(overview.summary, "AI invoicing is hot.");
    assert_eq!(overview.trending_categories, vec!["fintech", "automation"]);
    assert_eq!(overview.emerging_patterns[0].pattern, "Agent wrappers");
    assert!(overview.emerging_patterns[0].opportunity.is_empty());
}

#[test]
fn overview_without_summary_is_a_validation_error() {
    let err = parse_overview("groq", r#"{"trending_categories": ["x"]}"#).expect_err("no summary");
    assert!(matches!(err, ProviderError::Validation { .. }));
    assert!(err.to_string().contains("summary"), "{err}");

    let err = parse_overview("groq", r#"{"summary": "  "}"#).expect_err("blank summary");
    assert!(err.to_string().contains("empty"), "{err}");
}

#[test]
fn tools_prompt_lists_each_tool() {
    let prompt = build_tools_prompt(&[tool("Cursor"), tool("Bolt")]);
    assert!(prompt.contains("\"name\": \"Cursor\""));
    assert!(prompt.contains("\"url\": \"https://bolt.ai\""));
    assert!(prompt.contains("trending_tools_analysis"));
}

#[test]
fn tool_reviews_fill_missing_urls_and_drop_unnamed_entries() {
    let answer = r#"{"trending_tools_analysis": [
        {"name": "cursor", "what_it_does": "Edits code", "validation": "Real product",
         "review": "Fast. Pricey.", "revenue_potential": ["Freelance", " ", "Courses", "Plugins"]},
        {"what_it_does": "nameless"},
        {"name": "Bolt", "url": "https://bolt.new", "review": "Quick MVPs."}
    ]}"#;
    let tools = [tool("Cursor"), tool("Bolt")];

    let reviews = parse_tool_reviews("gemini", answer, &tools).expect("reviews parse");
    assert_eq!(reviews.len(), 2);
    assert_eq!(reviews[0].url, "https://cursor.ai");
    assert_eq!(reviews[0].revenue_potential, vec!["Freelance", "Courses", "Plugins"]);
    assert_eq!(reviews[1].url, "https://bolt.new");
}

#[test]
fn tool_reviews_need_the_expected_list() {
    let err = parse_tool_reviews("groq", r#"{"tools": []}"#, &[]).expect_err("wrong key");
    assert!(err.to_string().contains("trending_tools_analysis"), "{err}");

    let err = parse_tool_reviews("groq", r#"{"trending_tools_analysis": [{}]}"#, &[])
        .expect_err("nothing usable");
    assert!(matches!(err, ProviderError::Validation { .. }));
}
