use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;
use transcript_engine::{
    page_filename, BatchScheduler, ContentMatcher, FailureKind, FetchError, FetchMetadata,
    FetchOutput, Fetcher, PageDescriptor, RunOutcome, SearchEvent, SearchSink,
};
use url::Url;

#[derive(Default)]
struct MapFetcher {
    pages: HashMap<String, String>,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    log: Mutex<Vec<String>>,
}

impl MapFetcher {
    fn new(pages: &[(&str, &str)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(name, body)| (name.to_string(), body.to_string()))
                .collect(),
            ..Self::default()
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait::async_trait]
impl Fetcher for MapFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchOutput, FetchError> {
        let name = url.path().trim_start_matches('/').to_string();
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.log.lock().unwrap().push(format!("start {name}"));

        tokio::time::sleep(self.delay).await;

        self.log.lock().unwrap().push(format!("end {name}"));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.pages.get(&name) {
            Some(body) => Ok(FetchOutput {
                bytes: body.clone().into_bytes(),
                metadata: FetchMetadata {
                    url: url.to_string(),
                    final_url: url.to_string(),
                    content_type: Some("text/html".to_string()),
                    byte_len: body.len() as u64,
                },
            }),
            None => Err(FetchError {
                kind: FailureKind::HttpStatus(404),
                message: "Not Found".to_string(),
            }),
        }
    }
}

#[derive(Default)]
struct CollectingSink {
    events: Mutex<Vec<SearchEvent>>,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl CollectingSink {
    fn take(&self) -> Vec<SearchEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl SearchSink for CollectingSink {
    fn emit(&self, event: SearchEvent) {
        if let (SearchEvent::PageSettled(report), Some((after, token))) =
            (&event, &self.cancel_after)
        {
            if report.pages_searched == *after {
                token.cancel();
            }
        }
        self.events.lock().unwrap().push(event);
    }
}

fn descriptors(total: usize) -> Vec<PageDescriptor> {
    (1..=total)
        .map(|index| {
            let filename = page_filename(index);
            PageDescriptor {
                index,
                resolved_url: Url::parse(&format!("https://example.com/{filename}")).unwrap(),
                filename,
            }
        })
        .collect()
}

#[tokio::test]
async fn two_page_search_reports_running_totals() {
    let fetcher = MapFetcher::new(&[
        (
            "page-001.html",
            r#"<div class="message" id="msg-1"><p>Hello World</p></div><div class="message" id="msg-2"><p>Goodbye</p></div>"#,
        ),
        ("page-002.html", r#"<div class="message" id="msg-3"><p>nothing</p></div>"#),
    ]);
    let sink = CollectingSink::default();

    let outcome = BatchScheduler::new(3)
        .run(
            7,
            &descriptors(2),
            "hello",
            &fetcher,
            &ContentMatcher::default(),
            &sink,
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(
        outcome,
        RunOutcome::Completed {
            results_found: 1,
            pages_total: 2
        }
    );

    let events = sink.take();
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|event| event.generation() == 7));

    let reports: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            SearchEvent::PageSettled(report) => Some(report),
            _ => None,
        })
        .collect();
    assert_eq!(
        reports.iter().map(|r| r.pages_searched).collect::<Vec<_>>(),
        vec![1, 2]
    );
    let hit = reports
        .iter()
        .find(|r| r.page == "page-001.html")
        .expect("page 1 reported");
    assert_eq!(hit.matches().len(), 1);
    assert_eq!(hit.matches()[0].link, "page-001.html#msg-1");

    assert_eq!(
        events.last(),
        Some(&SearchEvent::Finished {
            generation: 7,
            results_found: 1,
            pages_total: 2
        })
    );
}

#[tokio::test]
async fn failed_pages_count_as_searched() {
    let fetcher = MapFetcher::new(&[("page-002.html", r#"<div class="message">hit</div>"#)]);
    let sink = CollectingSink::default();

    let outcome = BatchScheduler::new(3)
        .run(
            1,
            &descriptors(3),
            "hit",
            &fetcher,
            &ContentMatcher::default(),
            &sink,
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(
        outcome,
        RunOutcome::Completed {
            results_found: 1,
            pages_total: 3
        }
    );
    let failures: Vec<_> = sink
        .take()
        .into_iter()
        .filter_map(|event| match event {
            SearchEvent::PageSettled(report) => report.outcome.err(),
            _ => None,
        })
        .collect();
    assert_eq!(
        failures,
        vec![FailureKind::HttpStatus(404), FailureKind::HttpStatus(404)]
    );
}

#[tokio::test]
async fn batches_run_one_after_another() {
    let fetcher = MapFetcher::new(&[]).with_delay(Duration::from_millis(10));
    let sink = CollectingSink::default();

    BatchScheduler::new(3)
        .run(
            1,
            &descriptors(7),
            "x",
            &fetcher,
            &ContentMatcher::default(),
            &sink,
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(fetcher.max_in_flight.load(Ordering::SeqCst), 3);

    let log = fetcher.log.lock().unwrap().clone();
    let position = |entry: &str| log.iter().position(|e| e == entry).unwrap();
    for finished in 1..=3 {
        assert!(
            position(&format!("end {}", page_filename(finished)))
                < position("start page-004.html")
        );
    }
    for finished in 4..=6 {
        assert!(
            position(&format!("end {}", page_filename(finished)))
                < position("start page-007.html")
        );
    }
}

#[tokio::test]
async fn zero_pages_finish_immediately() {
    let fetcher = MapFetcher::new(&[]);
    let sink = CollectingSink::default();

    let outcome = BatchScheduler::new(3)
        .run(
            4,
            &[],
            "x",
            &fetcher,
            &ContentMatcher::default(),
            &sink,
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(
        outcome,
        RunOutcome::Completed {
            results_found: 0,
            pages_total: 0
        }
    );
    assert_eq!(
        sink.take(),
        vec![SearchEvent::Finished {
            generation: 4,
            results_found: 0,
            pages_total: 0
        }]
    );
}

#[tokio::test]
async fn cancellation_stops_before_next_batch() {
    let fetcher = MapFetcher::new(&[]);
    let token = CancellationToken::new();
    let sink = CollectingSink {
        cancel_after: Some((3, token.clone())),
        ..CollectingSink::default()
    };

    let outcome = BatchScheduler::new(3)
        .run(
            2,
            &descriptors(9),
            "x",
            &fetcher,
            &ContentMatcher::default(),
            &sink,
            &token,
        )
        .await;

    assert_eq!(outcome, RunOutcome::Cancelled { pages_searched: 3 });
    let events = sink.take();
    assert_eq!(events.len(), 3);
    assert!(!events
        .iter()
        .any(|event| matches!(event, SearchEvent::Finished { .. })));
}

#[test]
fn batch_size_is_at_least_one() {
    assert_eq!(BatchScheduler::new(0).batch_size(), 1);
    assert_eq!(BatchScheduler::new(3).batch_size(), 3);
}
