//! Transcript search core: pure state machine for the search modal, the
//! active search session and the address-bar fragment.
mod effect;
mod location;
mod msg;
mod session;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use location::{decode_query, encode_query, Location, SEARCH_FRAGMENT_PREFIX};
pub use msg::Msg;
pub use session::{
    Generation, ResultEntry, SearchFailure, SearchSession, SearchStatus, EMPTY_QUERY_NOTICE,
};
pub use state::AppState;
pub use update::update;
pub use view_model::{AppViewModel, ModalPhase};
