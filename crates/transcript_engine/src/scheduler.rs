use std::sync::{Mutex, PoisonError};

use engine_logging::{engine_debug, engine_warn};
use futures_util::future::join_all;
use tokio_util::sync::CancellationToken;

use crate::decode::decode_page;
use crate::matcher::{ContentMatcher, MatchResult};
use crate::resolver::PageDescriptor;
use crate::{FailureKind, Fetcher, Generation, PageReport, SearchEvent};

pub const DEFAULT_BATCH_SIZE: usize = 3;

pub trait SearchSink: Send + Sync {
    fn emit(&self, event: SearchEvent);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed {
        results_found: usize,
        pages_total: usize,
    },
    Cancelled {
        pages_searched: usize,
    },
}

#[derive(Debug, Default)]
struct Tally {
    pages_searched: usize,
    results_found: usize,
}

/// Fetches pages in fixed-size batches: every page of a batch is in flight at
/// once, and the next batch starts only after the current one has settled.
#[derive(Debug, Clone, Copy)]
pub struct BatchScheduler {
    batch_size: usize,
}

impl BatchScheduler {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Searches `pages` for `query`, emitting one `PageSettled` per page in
    /// settlement order and a single `Finished` once every batch has settled.
    /// A cancelled run emits nothing further.
    #[allow(clippy::too_many_arguments)]
    pub async fn run(
        &self,
        generation: Generation,
        pages: &[PageDescriptor],
        query: &str,
        fetcher: &dyn Fetcher,
        matcher: &ContentMatcher,
        sink: &dyn SearchSink,
        cancel: &CancellationToken,
    ) -> RunOutcome {
        let pages_total = pages.len();
        let tally = Mutex::new(Tally::default());

        for batch in pages.chunks(self.batch_size) {
            if cancel.is_cancelled() {
                return cancelled(&tally);
            }

            let settled = join_all(batch.iter().map(|page| {
                search_page(generation, page, query, fetcher, matcher, sink, &tally, pages_total)
            }));

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return cancelled(&tally),
                _ = settled => {}
            }
        }

        let results_found = tally
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .results_found;
        sink.emit(SearchEvent::Finished {
            generation,
            results_found,
            pages_total,
        });
        RunOutcome::Completed {
            results_found,
            pages_total,
        }
    }
}

fn cancelled(tally: &Mutex<Tally>) -> RunOutcome {
    let pages_searched = tally
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .pages_searched;
    RunOutcome::Cancelled { pages_searched }
}

#[allow(clippy::too_many_arguments)]
async fn search_page(
    generation: Generation,
    page: &PageDescriptor,
    query: &str,
    fetcher: &dyn Fetcher,
    matcher: &ContentMatcher,
    sink: &dyn SearchSink,
    tally: &Mutex<Tally>,
    pages_total: usize,
) {
    let outcome = fetch_and_match(page, query, fetcher, matcher).await;

    let (results_found, pages_searched) = {
        let mut tally = tally.lock().unwrap_or_else(PoisonError::into_inner);
        tally.pages_searched += 1;
        tally.results_found += outcome.as_ref().map_or(0, Vec::len);
        (tally.results_found, tally.pages_searched)
    };

    sink.emit(SearchEvent::PageSettled(PageReport {
        generation,
        page: page.filename.clone(),
        outcome,
        results_found,
        pages_searched,
        pages_total,
    }));
}

async fn fetch_and_match(
    page: &PageDescriptor,
    query: &str,
    fetcher: &dyn Fetcher,
    matcher: &ContentMatcher,
) -> Result<Vec<MatchResult>, FailureKind> {
    let output = fetcher.fetch(&page.resolved_url).await.map_err(|err| {
        engine_warn!("Fetching {} failed: {}", page.resolved_url, err);
        err.kind
    })?;

    let html = decode_page(&output.bytes, output.metadata.content_type.as_deref()).map_err(|err| {
        engine_warn!("Decoding {} failed: {}", page.filename, err);
        FailureKind::Decode
    })?;

    let matches = matcher.find_matches(&page.filename, &html, query);
    engine_debug!("{}: {} match(es)", page.filename, matches.count);
    Ok(matches.results)
}
