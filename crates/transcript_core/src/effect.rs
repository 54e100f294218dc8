use crate::Generation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Replace the address bar URL without adding a history entry.
    ReplaceUrl { url: String },
    FocusModalInput,
    StartSearch { generation: Generation, query: String },
    /// Stop fetching for a run whose results will be discarded anyway.
    CancelSearch { generation: Generation },
}
