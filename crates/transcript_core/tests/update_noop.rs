use transcript_core::{update, AppState, Location, Msg};

#[test]
fn update_is_noop() {
    let location = Location::parse("https://example.com/index.html").unwrap();
    let state = AppState::new(location, 3);
    let (next, effects) = update(state.clone(), Msg::NoOp);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}

#[test]
fn click_inside_closed_modal_does_not_mark_dirty() {
    let location = Location::parse("https://example.com/index.html").unwrap();
    let (mut next, effects) = update(
        AppState::new(location, 3),
        Msg::ModalClicked { on_backdrop: false },
    );

    assert!(effects.is_empty());
    assert!(!next.consume_dirty());
}
