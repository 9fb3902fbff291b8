//! Integration tests for `FetchCoordinator`: isolation between sources,
//! timeouts, and the per-day completion marker.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use futures::future::BoxFuture;

use vibetrend_core::{DataDir, Lead, SourceKind, SourceSettings, SourcesFile};
use vibetrend_scraper::{DayScrape, FetchCoordinator, ScraperError, SourceAdapter};

#[derive(Debug, Clone, Copy)]
enum Behavior {
    Leads(usize),
    Fail,
    Sleep(Duration),
    Panic,
}

struct FakeAdapter {
    kind: SourceKind,
    behavior: Behavior,
    calls: AtomicUsize,
}

impl FakeAdapter {
    fn new(kind: SourceKind, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            kind,
            behavior,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn fake_leads(kind: SourceKind, n: usize) -> Vec<Lead> {
    (0..n)
        .map(|i| {
            Lead::new(
                kind,
                i.to_string(),
                format!("{kind} lead {i}"),
                format!("https://{kind}.example/{i}"),
                "text",
                Utc::now(),
            )
        })
        .collect()
}

impl SourceAdapter for FakeAdapter {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn fetch<'a>(
        &'a self,
        _settings: &'a SourceSettings,
    ) -> BoxFuture<'a, Result<Vec<Lead>, ScraperError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            match self.behavior {
                Behavior::Leads(n) => Ok(fake_leads(self.kind, n)),
                Behavior::Fail => Err(ScraperError::Selector {
                    url: format!("https://{}.example", self.kind),
                    reason: "layout changed".to_string(),
                }),
                Behavior::Sleep(duration) => {
                    tokio::time::sleep(duration).await;
                    Ok(fake_leads(self.kind, 1))
                }
                Behavior::Panic => panic!("adapter exploded"),
            }
        })
    }
}

fn sources(enabled: &[SourceKind]) -> SourcesFile {
    let sources: BTreeMap<SourceKind, SourceSettings> = SourceKind::ALL
        .into_iter()
        .map(|kind| {
            let mut settings = SourceSettings::default_for(kind);
            settings.enabled = enabled.contains(&kind);
            (kind, settings)
        })
        .collect();
    SourcesFile {
        sources,
        ..SourcesFile::default()
    }
}

fn coordinator(
    adapters: Vec<Arc<dyn SourceAdapter>>,
    source_ms: u64,
    global_ms: u64,
) -> FetchCoordinator {
    FetchCoordinator::new(
        adapters,
        Duration::from_millis(source_ms),
        Duration::from_millis(global_ms),
    )
}

fn run_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).expect("valid date")
}

#[tokio::test]
async fn failing_and_slow_sources_do_not_block_the_others() {
    let reddit = FakeAdapter::new(SourceKind::Reddit, Behavior::Leads(2));
    let hn = FakeAdapter::new(SourceKind::HackerNews, Behavior::Fail);
    let ph = FakeAdapter::new(SourceKind::ProductHunt, Behavior::Sleep(Duration::from_secs(5)));
    let acquire = FakeAdapter::new(SourceKind::Acquire, Behavior::Leads(1));

    let coordinator = coordinator(
        vec![reddit.clone(), hn.clone(), ph.clone(), acquire.clone()],
        200,
        5_000,
    );
    let outcome = coordinator
        .fetch_all(&sources(&[
            SourceKind::Reddit,
            SourceKind::HackerNews,
            SourceKind::ProductHunt,
            SourceKind::Acquire,
        ]))
        .await;

    let succeeded: Vec<SourceKind> = outcome.batches.iter().map(|b| b.source).collect();
    assert_eq!(succeeded, vec![SourceKind::Reddit, SourceKind::Acquire]);
    assert_eq!(outcome.lead_count(), 3);
    assert_eq!(outcome.succeeded().count(), 3);

    let failed: Vec<SourceKind> = outcome.failed_sources.iter().map(|f| f.source).collect();
    assert_eq!(failed, vec![SourceKind::HackerNews, SourceKind::ProductHunt]);
    assert!(outcome.failed_sources[0].reason.contains("layout changed"));
    assert!(outcome.failed_sources[1].reason.contains("timed out"));
    assert!(!outcome.all_failed());
}

#[tokio::test]
async fn global_timeout_keeps_completed_results() {
    let reddit = FakeAdapter::new(SourceKind::Reddit, Behavior::Leads(1));
    let bluesky = FakeAdapter::new(SourceKind::Bluesky, Behavior::Sleep(Duration::from_secs(10)));

    let coordinator = coordinator(vec![reddit, bluesky], 30_000, 300);
    let outcome = coordinator
        .fetch_all(&sources(&[SourceKind::Reddit, SourceKind::Bluesky]))
        .await;

    assert_eq!(outcome.batches.len(), 1);
    assert_eq!(outcome.batches[0].source, SourceKind::Reddit);
    assert_eq!(outcome.failed_sources.len(), 1);
    assert_eq!(outcome.failed_sources[0].source, SourceKind::Bluesky);
    assert_eq!(outcome.failed_sources[0].reason, "global fetch timeout");
}

#[tokio::test]
async fn panicking_adapter_is_recorded_as_failed() {
    let reddit = FakeAdapter::new(SourceKind::Reddit, Behavior::Panic);
    let hn = FakeAdapter::new(SourceKind::HackerNews, Behavior::Leads(1));

    let coordinator = coordinator(vec![reddit, hn], 1_000, 2_000);
    let outcome = coordinator
        .fetch_all(&sources(&[SourceKind::Reddit, SourceKind::HackerNews]))
        .await;

    assert_eq!(outcome.batches.len(), 1);
    assert_eq!(outcome.failed_sources[0].source, SourceKind::Reddit);
    assert!(outcome.failed_sources[0].reason.contains("panicked"));
}

#[tokio::test]
async fn disabled_sources_are_not_fetched_and_missing_adapters_fail() {
    let reddit = FakeAdapter::new(SourceKind::Reddit, Behavior::Leads(1));
    let hn = FakeAdapter::new(SourceKind::HackerNews, Behavior::Leads(1));

    let coordinator = coordinator(vec![reddit.clone(), hn.clone()], 1_000, 2_000);
    let outcome = coordinator
        .fetch_all(&sources(&[SourceKind::Reddit, SourceKind::IndieHackers]))
        .await;

    assert_eq!(reddit.calls(), 1);
    assert_eq!(hn.calls(), 0);
    assert_eq!(outcome.failed_sources.len(), 1);
    assert_eq!(outcome.failed_sources[0].source, SourceKind::IndieHackers);
    assert_eq!(outcome.failed_sources[0].reason, "no adapter registered");
}

#[tokio::test]
async fn collect_day_writes_raw_files_and_short_circuits_second_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data_dir = DataDir::new(dir.path());
    let reddit = FakeAdapter::new(SourceKind::Reddit, Behavior::Leads(2));
    let hn = FakeAdapter::new(SourceKind::HackerNews, Behavior::Leads(0));
    let ph = FakeAdapter::new(SourceKind::ProductHunt, Behavior::Fail);
    let coordinator = coordinator(vec![reddit.clone(), hn, ph], 1_000, 2_000);
    let enabled = sources(&[
        SourceKind::Reddit,
        SourceKind::HackerNews,
        SourceKind::ProductHunt,
    ]);

    let first = coordinator
        .collect_day(&enabled, &data_dir, run_date(), false)
        .await
        .expect("first collect");
    let DayScrape::Fetched { outcome, marker } = first else {
        panic!("first run should fetch");
    };
    assert_eq!(outcome.lead_count(), 2);
    let marker = marker.expect("marker written when a source succeeded");
    assert_eq!(marker.source_counts.get(&SourceKind::Reddit), Some(&2));
    assert_eq!(marker.source_counts.get(&SourceKind::HackerNews), Some(&0));
    assert!(marker.failed_sources.contains_key(&SourceKind::ProductHunt));

    let raw = data_dir.read_raw_all(run_date()).expect("read raw");
    let written: Vec<SourceKind> = raw.iter().map(|(kind, _)| *kind).collect();
    assert_eq!(written, vec![SourceKind::Reddit, SourceKind::HackerNews]);
    assert!(!data_dir.raw_path(SourceKind::ProductHunt, run_date()).exists());

    let second = coordinator
        .collect_day(&enabled, &data_dir, run_date(), false)
        .await
        .expect("second collect");
    assert!(matches!(second, DayScrape::Skipped(_)));
    assert_eq!(reddit.calls(), 1, "second run must not contact sources");

    let forced = coordinator
        .collect_day(&enabled, &data_dir, run_date(), true)
        .await
        .expect("forced collect");
    assert!(matches!(forced, DayScrape::Fetched { .. }));
    assert_eq!(reddit.calls(), 2);
}

#[tokio::test]
async fn collect_day_leaves_no_marker_when_every_source_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data_dir = DataDir::new(dir.path());
    let hn = FakeAdapter::new(SourceKind::HackerNews, Behavior::Fail);
    let coordinator = coordinator(vec![hn], 1_000, 2_000);

    let result = coordinator
        .collect_day(&sources(&[SourceKind::HackerNews]), &data_dir, run_date(), false)
        .await
        .expect("collect");

    let DayScrape::Fetched { outcome, marker } = result else {
        panic!("expected a fetch");
    };
    assert!(outcome.all_failed());
    assert!(marker.is_none());
    assert!(data_dir.read_marker(run_date()).expect("read marker").is_none());
}
