use std::sync::{mpsc, Arc};

use engine_logging::{engine_debug, engine_info};
use transcript_core::{Effect, Msg, ResultEntry, SearchFailure};
use transcript_engine::{
    AbortCause, EngineConfig, EngineError, EngineHandle, MatchResult, SearchEvent, SearchSink,
};

use super::app::HostEvent;

/// Carries out effects produced by `update` against the search engine.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(
        config: EngineConfig,
        host_tx: mpsc::Sender<HostEvent>,
    ) -> Result<Self, EngineError> {
        let sink: Arc<dyn SearchSink> = Arc::new(MsgSink { host_tx });
        Ok(Self {
            engine: EngineHandle::new(config, sink)?,
        })
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartSearch { generation, query } => {
                    engine_debug!(
                        "StartSearch generation={} query_len={}",
                        generation,
                        query.len()
                    );
                    self.engine.start_search(generation, query);
                }
                Effect::CancelSearch { generation } => {
                    engine_debug!("CancelSearch generation={}", generation);
                    self.engine.cancel(generation);
                }
                Effect::ReplaceUrl { url } => {
                    engine_info!("Location: {}", url);
                }
                Effect::FocusModalInput => {
                    // stdin is the only input; nothing to focus
                }
            }
        }
    }
}

struct MsgSink {
    host_tx: mpsc::Sender<HostEvent>,
}

impl SearchSink for MsgSink {
    fn emit(&self, event: SearchEvent) {
        let _ = self.host_tx.send(HostEvent::Msg(map_event(event)));
    }
}

fn map_event(event: SearchEvent) -> Msg {
    match event {
        SearchEvent::GistInfoLoading { generation } => Msg::GistInfoLoading { generation },
        SearchEvent::Started { generation, .. } => Msg::SearchStarted { generation },
        SearchEvent::PageSettled(report) => {
            let results = match report.outcome {
                Ok(matches) => matches.into_iter().map(map_result).collect(),
                Err(kind) => {
                    engine_debug!("Page {} skipped: {}", report.page, kind);
                    Vec::new()
                }
            };
            Msg::PageSearched {
                generation: report.generation,
                page: report.page,
                results,
            }
        }
        SearchEvent::Finished { generation, .. } => Msg::SearchFinished { generation },
        SearchEvent::Failed {
            generation,
            cause,
            reason,
        } => Msg::SearchFailed {
            generation,
            failure: match cause {
                AbortCause::GistUnavailable => SearchFailure::GistInfo(reason),
                AbortCause::PageUrl => SearchFailure::Other(reason),
            },
        },
    }
}

fn map_result(result: MatchResult) -> ResultEntry {
    ResultEntry {
        source_page: result.source_page,
        anchor_id: result.anchor_id,
        link: result.link,
        highlighted_html: result.highlighted_html,
        excerpt: result.excerpt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use transcript_engine::{FailureKind, PageReport};

    fn matched(link: &str) -> MatchResult {
        MatchResult {
            source_page: "page-001.html".to_string(),
            anchor_id: "msg-1".to_string(),
            link: link.to_string(),
            highlighted_html: "<mark>hi</mark>".to_string(),
            excerpt: "hi".to_string(),
        }
    }

    #[test]
    fn settled_page_becomes_page_searched() {
        let msg = map_event(SearchEvent::PageSettled(PageReport {
            generation: 4,
            page: "page-001.html".to_string(),
            outcome: Ok(vec![matched("page-001.html#msg-1")]),
            results_found: 1,
            pages_searched: 1,
            pages_total: 2,
        }));

        assert_eq!(
            msg,
            Msg::PageSearched {
                generation: 4,
                page: "page-001.html".to_string(),
                results: vec![ResultEntry {
                    source_page: "page-001.html".to_string(),
                    anchor_id: "msg-1".to_string(),
                    link: "page-001.html#msg-1".to_string(),
                    highlighted_html: "<mark>hi</mark>".to_string(),
                    excerpt: "hi".to_string(),
                }],
            }
        );
    }

    #[test]
    fn failed_page_still_counts() {
        let msg = map_event(SearchEvent::PageSettled(PageReport {
            generation: 1,
            page: "page-002.html".to_string(),
            outcome: Err(FailureKind::HttpStatus(404)),
            results_found: 0,
            pages_searched: 1,
            pages_total: 2,
        }));

        assert_eq!(
            msg,
            Msg::PageSearched {
                generation: 1,
                page: "page-002.html".to_string(),
                results: Vec::new(),
            }
        );
    }

    #[test]
    fn lifecycle_events_keep_their_generation() {
        assert_eq!(
            map_event(SearchEvent::Started {
                generation: 9,
                pages_total: 3
            }),
            Msg::SearchStarted { generation: 9 }
        );
        assert_eq!(
            map_event(SearchEvent::Failed {
                generation: 2,
                cause: AbortCause::GistUnavailable,
                reason: "no gist id".to_string()
            }),
            Msg::SearchFailed {
                generation: 2,
                failure: SearchFailure::GistInfo("no gist id".to_string())
            }
        );
    }

    #[test]
    fn page_url_abort_is_not_a_gist_failure() {
        assert_eq!(
            map_event(SearchEvent::Failed {
                generation: 5,
                cause: AbortCause::PageUrl,
                reason: "cannot build url for page-001.html".to_string()
            }),
            Msg::SearchFailed {
                generation: 5,
                failure: SearchFailure::Other("cannot build url for page-001.html".to_string())
            }
        );
    }
}
