use crate::{Generation, ResultEntry, SearchFailure};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The hosting page finished loading; restores a `#search=` deep link.
    PageLoaded,
    /// User edited the inline search box outside the modal.
    SearchInputChanged(String),
    /// Search button or Enter in the inline search box. Always opens the modal.
    SearchSubmitted,
    /// User edited the modal's own search input.
    ModalInputChanged(String),
    /// Search button or Enter inside the modal. Runs without reopening.
    ModalSearchSubmitted,
    /// Modal close button.
    CloseClicked,
    /// Click anywhere on the modal element; `on_backdrop` when outside its content.
    ModalClicked { on_backdrop: bool },
    /// Engine is resolving the gist owner before any page can be fetched.
    GistInfoLoading { generation: Generation },
    /// Engine resolved every page URL and started fetching.
    SearchStarted { generation: Generation },
    /// Engine settled one page, successfully or not.
    PageSearched {
        generation: Generation,
        page: String,
        results: Vec<ResultEntry>,
    },
    /// Engine settled every batch of the run.
    SearchFinished { generation: Generation },
    /// Run aborted before fetching any page.
    SearchFailed {
        generation: Generation,
        failure: SearchFailure,
    },
    /// Fallback for placeholder wiring.
    NoOp,
}
