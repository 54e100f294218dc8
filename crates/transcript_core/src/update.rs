use crate::session::EMPTY_QUERY_NOTICE;
use crate::{AppState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::PageLoaded => match state.location().search_query() {
            Some(query) => {
                state.set_search_input(query.clone());
                open_modal(&mut state, query)
            }
            None => Vec::new(),
        },
        Msg::SearchInputChanged(text) => {
            state.set_search_input(text);
            Vec::new()
        }
        Msg::SearchSubmitted => {
            let query = state.search_input().to_string();
            open_modal(&mut state, query)
        }
        Msg::ModalInputChanged(text) => {
            state.set_modal_input(text);
            Vec::new()
        }
        Msg::ModalSearchSubmitted => {
            if state.is_modal_open() {
                let query = state.modal_input().to_string();
                perform_search(&mut state, query)
            } else {
                Vec::new()
            }
        }
        Msg::CloseClicked | Msg::ModalClicked { on_backdrop: true } => close_modal(&mut state),
        Msg::ModalClicked { on_backdrop: false } => Vec::new(),
        Msg::GistInfoLoading { generation } => {
            if state.is_current(generation) && state.session_mut().await_gist_info() {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::SearchStarted { generation } => {
            if state.is_current(generation) && state.session_mut().pages_scheduled() {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::PageSearched {
            generation,
            page: _,
            results,
        } => {
            if state.is_current(generation) && state.session_mut().apply_page(results) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::SearchFinished { generation } => {
            if state.is_current(generation) && state.session_mut().finish() {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::SearchFailed {
            generation,
            failure,
        } => {
            if state.is_current(generation) && state.session_mut().fail(failure) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

/// Opens the modal on a clean results view and runs `query` if it is non-empty.
fn open_modal(state: &mut AppState, query: String) -> Vec<Effect> {
    let mut effects: Vec<Effect> = state.supersede_session().into_iter().collect();
    state.set_modal_input(query.clone());
    state.set_modal_open(true);
    effects.push(Effect::FocusModalInput);
    if !query.is_empty() {
        effects.extend(perform_search(state, query));
    }
    effects
}

fn perform_search(state: &mut AppState, query: String) -> Vec<Effect> {
    if query.trim().is_empty() {
        let effects = state.supersede_session().into_iter().collect();
        state.session_mut().set_notice(EMPTY_QUERY_NOTICE);
        return effects;
    }

    let location = state.location().with_search_query(&query);
    let (cancel, generation) = state.start_session(query.clone());

    let mut effects = Vec::with_capacity(3);
    effects.extend(cancel);
    effects.extend(state.replace_location(location));
    effects.push(Effect::StartSearch { generation, query });
    effects
}

fn close_modal(state: &mut AppState) -> Vec<Effect> {
    if !state.is_modal_open() {
        return Vec::new();
    }
    state.set_modal_open(false);

    let mut effects: Vec<Effect> = state.supersede_session().into_iter().collect();
    if state.location().has_search_fragment() {
        let cleared = state.location().without_fragment();
        effects.extend(state.replace_location(cleared));
    }
    effects
}
