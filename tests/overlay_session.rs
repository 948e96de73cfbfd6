use action_overlay::overlay::{session, EngineLifecycle};
use action_overlay::{get_overlay, release_overlay};
use serial_test::serial;
use std::sync::Arc;
use std::time::Duration;

#[test]
#[serial]
fn global_accessor_reuses_engine_until_released() {
    release_overlay();
    let first = get_overlay();
    let second = get_overlay();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(first.is_available());

    release_overlay();
    assert_eq!(first.lifecycle(), EngineLifecycle::Destroyed);
    assert!(!session().is_active());

    let fresh = get_overlay();
    assert!(!Arc::ptr_eq(&first, &fresh));
    release_overlay();
}

#[test]
#[serial]
fn releasing_twice_is_harmless() {
    get_overlay().show("click", 0.0);
    release_overlay();
    assert!(session().current().is_none());
    release_overlay();
    assert!(session().current().is_none());
}

#[test]
#[serial]
fn released_engine_ignores_late_commands() {
    let engine = get_overlay();
    engine.show("$ ls", 0.0);
    assert!(engine.flush(Duration::from_secs(2)));
    release_overlay();

    engine.show("late", 0.0);
    assert!(!engine.flush(Duration::from_millis(50)));
    assert!(!engine.is_showing());
}
