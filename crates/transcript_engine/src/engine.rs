use std::sync::{mpsc, Arc};
use std::thread;

use engine_logging::{engine_debug, engine_error, engine_info};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::fetch::{FetchSettings, Fetcher, SiteFetcher};
use crate::gist::{GistMetadataSource, GithubGistApi};
use crate::matcher::{ContentMatcher, DEFAULT_BLOCK_CLASS};
use crate::resolver::{GistSettings, PageResolver, ResolveError};
use crate::scheduler::{BatchScheduler, RunOutcome, SearchSink, DEFAULT_BATCH_SIZE};
use crate::{AbortCause, FetchError, Generation, SearchEvent};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Address of the document hosting the search UI.
    pub location: Url,
    pub total_pages: usize,
    pub batch_size: usize,
    pub block_class: String,
    pub fetch: FetchSettings,
    pub gist: GistSettings,
}

impl EngineConfig {
    pub fn new(location: Url, total_pages: usize) -> Self {
        Self {
            location,
            total_pages,
            batch_size: DEFAULT_BATCH_SIZE,
            block_class: DEFAULT_BLOCK_CLASS.to_string(),
            fetch: FetchSettings::default(),
            gist: GistSettings::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to build http client: {0}")]
    Client(#[from] FetchError),
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

enum EngineCommand {
    Search { generation: Generation, query: String },
    Cancel { generation: Generation },
}

/// Runs searches on a background runtime and reports through a [`SearchSink`].
///
/// Starting a search cancels the previous one. Dropping the handle stops the
/// engine thread and its runtime.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig, sink: Arc<dyn SearchSink>) -> Result<Self, EngineError> {
        let fetcher: Arc<dyn Fetcher> = Arc::new(SiteFetcher::new(config.fetch.clone())?);
        let gist_source: Arc<dyn GistMetadataSource> =
            Arc::new(GithubGistApi::new(&config.fetch, config.gist.api_base.clone())?);
        Self::with_sources(config, fetcher, gist_source, sink)
    }

    pub fn with_sources(
        config: EngineConfig,
        fetcher: Arc<dyn Fetcher>,
        gist_source: Arc<dyn GistMetadataSource>,
        sink: Arc<dyn SearchSink>,
    ) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("transcript-engine")
            .build()?;

        let searcher = Arc::new(Searcher {
            resolver: PageResolver::new(config.location.clone(), &config.gist, gist_source),
            scheduler: BatchScheduler::new(config.batch_size),
            matcher: ContentMatcher::new(config.block_class.clone()),
            total_pages: config.total_pages,
            fetcher,
            sink,
        });
        engine_info!(
            "Engine ready: location={} mode={:?} pages={} batch={}",
            config.location,
            searcher.resolver.mode(),
            config.total_pages,
            searcher.scheduler.batch_size()
        );

        let (cmd_tx, cmd_rx) = mpsc::channel();
        thread::spawn(move || {
            let mut active: Option<(Generation, CancellationToken)> = None;
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::Search { generation, query } => {
                        if let Some((previous, token)) = active.take() {
                            engine_debug!("Search {} superseded by {}", previous, generation);
                            token.cancel();
                        }
                        let token = CancellationToken::new();
                        active = Some((generation, token.clone()));
                        let searcher = Arc::clone(&searcher);
                        runtime.spawn(async move {
                            searcher.run(generation, query, token).await;
                        });
                    }
                    EngineCommand::Cancel { generation } => {
                        if active.as_ref().is_some_and(|(current, _)| *current == generation) {
                            if let Some((_, token)) = active.take() {
                                engine_debug!("Search {} cancelled", generation);
                                token.cancel();
                            }
                        }
                    }
                }
            }
            engine_debug!("Engine command channel closed; shutting down");
        });

        Ok(Self { cmd_tx })
    }

    pub fn start_search(&self, generation: Generation, query: impl Into<String>) {
        let sent = self.cmd_tx.send(EngineCommand::Search {
            generation,
            query: query.into(),
        });
        if sent.is_err() {
            engine_error!("Engine thread is gone; search {} not started", generation);
        }
    }

    pub fn cancel(&self, generation: Generation) {
        let _ = self.cmd_tx.send(EngineCommand::Cancel { generation });
    }
}

struct Searcher {
    resolver: PageResolver,
    scheduler: BatchScheduler,
    matcher: ContentMatcher,
    total_pages: usize,
    fetcher: Arc<dyn Fetcher>,
    sink: Arc<dyn SearchSink>,
}

impl Searcher {
    async fn run(&self, generation: Generation, query: String, cancel: CancellationToken) {
        if self.resolver.needs_gist_info() {
            self.sink.emit(SearchEvent::GistInfoLoading { generation });
        }
        if let Err(err) = self.resolver.prepare().await {
            self.sink.emit(SearchEvent::Failed {
                generation,
                cause: AbortCause::GistUnavailable,
                reason: err.to_string(),
            });
            return;
        }

        let pages = match self.resolver.pages(self.total_pages) {
            Ok(pages) => pages,
            Err(err) => {
                engine_error!("Search {} aborted: {}", generation, err);
                let cause = match &err {
                    ResolveError::GistNotLoaded => AbortCause::GistUnavailable,
                    ResolveError::InvalidUrl { .. } => AbortCause::PageUrl,
                };
                self.sink.emit(SearchEvent::Failed {
                    generation,
                    cause,
                    reason: err.to_string(),
                });
                return;
            }
        };

        engine_info!(
            "Search {} started: query_len={} pages={}",
            generation,
            query.len(),
            pages.len()
        );
        self.sink.emit(SearchEvent::Started {
            generation,
            pages_total: pages.len(),
        });

        let outcome = self
            .scheduler
            .run(
                generation,
                &pages,
                &query,
                self.fetcher.as_ref(),
                &self.matcher,
                self.sink.as_ref(),
                &cancel,
            )
            .await;

        match outcome {
            RunOutcome::Completed {
                results_found,
                pages_total,
            } => engine_info!(
                "Search {} finished: {} result(s) in {} pages",
                generation,
                results_found,
                pages_total
            ),
            RunOutcome::Cancelled { pages_searched } => engine_debug!(
                "Search {} stopped after {} pages",
                generation,
                pages_searched
            ),
        }
    }
}
