use crate::{Generation, ResultEntry, SearchStatus};

/// Modal lifecycle as seen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModalPhase {
    #[default]
    Closed,
    Idle,
    Searching,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub phase: ModalPhase,
    pub location: String,
    pub search_input: String,
    pub modal_input: String,
    pub generation: Generation,
    pub query: String,
    pub status: SearchStatus,
    pub status_line: String,
    pub pages_total: usize,
    pub pages_searched: usize,
    pub results_found: usize,
    pub results: Vec<ResultEntry>,
    pub dirty: bool,
}

impl AppViewModel {
    pub fn is_modal_open(&self) -> bool {
        self.phase != ModalPhase::Closed
    }
}
