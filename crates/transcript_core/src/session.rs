/// Tag distinguishing the active search from superseded ones.
pub type Generation = u64;

pub const EMPTY_QUERY_NOTICE: &str = "Enter a search term";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchStatus {
    #[default]
    Idle,
    AwaitingGistInfo,
    Searching,
    Done,
    Failed,
}

/// Why a search run ended before fetching any page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchFailure {
    /// The gist owner lookup failed, so no indirected page can resolve.
    GistInfo(String),
    /// Any other abort, such as a page URL that cannot be built.
    Other(String),
}

/// One matched message block, ready to be shown in the results view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultEntry {
    pub source_page: String,
    pub anchor_id: String,
    pub link: String,
    pub highlighted_html: String,
    pub excerpt: String,
}

/// State of one search invocation across all pages.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchSession {
    generation: Generation,
    query: String,
    pages_total: usize,
    pages_searched: usize,
    results_found: usize,
    status: SearchStatus,
    notice: Option<String>,
    failure: Option<SearchFailure>,
    results: Vec<ResultEntry>,
}

impl SearchSession {
    pub(crate) fn idle(generation: Generation) -> Self {
        Self {
            generation,
            ..Self::default()
        }
    }

    pub(crate) fn searching(generation: Generation, query: String, pages_total: usize) -> Self {
        Self {
            generation,
            query,
            pages_total,
            status: SearchStatus::Searching,
            ..Self::default()
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn pages_total(&self) -> usize {
        self.pages_total
    }

    pub fn pages_searched(&self) -> usize {
        self.pages_searched
    }

    pub fn results_found(&self) -> usize {
        self.results_found
    }

    pub fn status(&self) -> SearchStatus {
        self.status
    }

    pub fn failure(&self) -> Option<&SearchFailure> {
        self.failure.as_ref()
    }

    pub fn results(&self) -> &[ResultEntry] {
        &self.results
    }

    pub fn is_running(&self) -> bool {
        matches!(
            self.status,
            SearchStatus::AwaitingGistInfo | SearchStatus::Searching
        )
    }

    pub(crate) fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    pub(crate) fn await_gist_info(&mut self) -> bool {
        if self.status != SearchStatus::Searching || self.pages_searched > 0 {
            return false;
        }
        self.status = SearchStatus::AwaitingGistInfo;
        true
    }

    pub(crate) fn pages_scheduled(&mut self) -> bool {
        if self.status != SearchStatus::AwaitingGistInfo {
            return false;
        }
        self.status = SearchStatus::Searching;
        true
    }

    /// Records one settled page. Returns false if the page could not count
    /// (session not running or every page already accounted for).
    pub(crate) fn apply_page(&mut self, results: Vec<ResultEntry>) -> bool {
        if !self.is_running() || self.pages_searched >= self.pages_total {
            return false;
        }
        self.status = SearchStatus::Searching;
        self.pages_searched += 1;
        self.results_found += results.len();
        self.results.extend(results);
        true
    }

    pub(crate) fn finish(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.status = SearchStatus::Done;
        true
    }

    pub(crate) fn fail(&mut self, failure: SearchFailure) -> bool {
        if !self.is_running() {
            return false;
        }
        self.status = SearchStatus::Failed;
        self.failure = Some(failure);
        self.results.clear();
        true
    }

    /// Text for the live status line under the modal input.
    pub fn status_line(&self) -> String {
        match self.status {
            SearchStatus::Idle => self.notice.clone().unwrap_or_default(),
            SearchStatus::AwaitingGistInfo => "Loading gist info...".to_string(),
            SearchStatus::Searching if self.pages_searched == 0 => "Searching...".to_string(),
            SearchStatus::Searching => format!(
                "Found {} result(s) in {}/{} pages...",
                self.results_found, self.pages_searched, self.pages_total
            ),
            SearchStatus::Done => format!(
                "Found {} result(s) in {} pages",
                self.results_found, self.pages_total
            ),
            SearchStatus::Failed => match &self.failure {
                Some(SearchFailure::Other(reason)) => format!("Search failed: {reason}"),
                _ => "Failed to load gist info. Search unavailable.".to_string(),
            },
        }
    }
}
