use crate::view_model::{AppViewModel, ModalPhase};
use crate::{Effect, Generation, Location, SearchSession, SearchStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    location: Location,
    total_pages: usize,
    search_input: String,
    modal_input: String,
    modal_open: bool,
    generation: Generation,
    session: SearchSession,
    dirty: bool,
}

impl AppState {
    pub fn new(location: Location, total_pages: usize) -> Self {
        Self {
            location,
            total_pages,
            search_input: String::new(),
            modal_input: String::new(),
            modal_open: false,
            generation: 0,
            session: SearchSession::idle(0),
            dirty: false,
        }
    }

    pub fn view(&self) -> AppViewModel {
        let phase = if !self.modal_open {
            ModalPhase::Closed
        } else {
            match self.session.status() {
                SearchStatus::Idle => ModalPhase::Idle,
                SearchStatus::AwaitingGistInfo | SearchStatus::Searching => ModalPhase::Searching,
                SearchStatus::Done | SearchStatus::Failed => ModalPhase::Done,
            }
        };

        AppViewModel {
            phase,
            location: self.location.as_str().to_string(),
            search_input: self.search_input.clone(),
            modal_input: self.modal_input.clone(),
            generation: self.session.generation(),
            query: self.session.query().to_string(),
            status: self.session.status(),
            status_line: self.session.status_line(),
            pages_total: self.session.pages_total(),
            pages_searched: self.session.pages_searched(),
            results_found: self.session.results_found(),
            results: self.session.results().to_vec(),
            dirty: self.dirty,
        }
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn session(&self) -> &SearchSession {
        &self.session
    }

    pub fn is_modal_open(&self) -> bool {
        self.modal_open
    }

    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    pub fn modal_input(&self) -> &str {
        &self.modal_input
    }

    /// Returns whether anything changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn is_current(&self, generation: Generation) -> bool {
        self.session.generation() == generation
    }

    pub(crate) fn session_mut(&mut self) -> &mut SearchSession {
        &mut self.session
    }

    pub(crate) fn set_search_input(&mut self, text: String) {
        if self.search_input != text {
            self.search_input = text;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_modal_input(&mut self, text: String) {
        if self.modal_input != text {
            self.modal_input = text;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_modal_open(&mut self, open: bool) {
        if self.modal_open != open {
            self.modal_open = open;
            self.mark_dirty();
        }
    }

    pub(crate) fn replace_location(&mut self, location: Location) -> Option<Effect> {
        if self.location == location {
            return None;
        }
        self.location = location;
        self.mark_dirty();
        Some(Effect::ReplaceUrl {
            url: self.location.as_str().to_string(),
        })
    }

    /// Retires the current session under a fresh generation so late engine
    /// events for it are ignored. Yields a cancel effect if it was still running.
    pub(crate) fn supersede_session(&mut self) -> Option<Effect> {
        let cancel = self.session.is_running().then(|| Effect::CancelSearch {
            generation: self.session.generation(),
        });
        self.generation += 1;
        self.session = SearchSession::idle(self.generation);
        self.mark_dirty();
        cancel
    }

    pub(crate) fn start_session(&mut self, query: String) -> (Option<Effect>, Generation) {
        let cancel = self.supersede_session();
        self.session = SearchSession::searching(self.generation, query, self.total_pages);
        (cancel, self.generation)
    }
}
