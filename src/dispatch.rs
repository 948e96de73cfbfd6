//! Overlay calls the agent dispatch loop makes around each batch of tool
//! invocations.

use crate::overlay::{EngineLifecycle, OverlayEngine};
use crate::translate::{translate_batch, ActionDescriptor};
use std::time::Duration;

/// Longest time a capture waits for the hide to reach the owner thread.
pub const CAPTURE_FLUSH_TIMEOUT: Duration = Duration::from_millis(500);

/// Show every pending action, one per line, for the configured duration.
pub fn announce(engine: &OverlayEngine, actions: &[ActionDescriptor]) {
    if actions.is_empty() {
        return;
    }
    if !engine.is_available() {
        tracing::debug!(actions = actions.len(), "overlay unavailable; batch not announced");
        return;
    }
    let combined = translate_batch(actions);
    tracing::debug!(actions = actions.len(), "announcing overlay batch");
    engine.show(combined, engine.settings().show_duration);
}

pub fn is_screen_capture(action: &ActionDescriptor) -> bool {
    action.tool_name == "computer" && action.param("action") == "screenshot"
}

/// Hide the overlay and give it time to leave the screen before a capture.
/// Returns `false` if the owner thread did not confirm the hide in time.
pub fn hide_for_capture(engine: &OverlayEngine, settle: Duration) -> bool {
    engine.hide();
    let confirmed =
        engine.lifecycle() != EngineLifecycle::Running || engine.flush(CAPTURE_FLUSH_TIMEOUT);
    if !confirmed {
        tracing::debug!("overlay hide not confirmed before capture");
    }
    if !settle.is_zero() {
        std::thread::sleep(settle);
    }
    confirmed
}

/// Settle delay taken from the engine settings.
pub fn capture_settle(engine: &OverlayEngine) -> Duration {
    Duration::from_millis(engine.settings().capture_settle_ms)
}

/// Hides the overlay when dropped, whether the agent run returned,
/// failed, or panicked.
pub struct OverlayRunGuard<'a> {
    engine: &'a OverlayEngine,
}

impl<'a> OverlayRunGuard<'a> {
    pub fn new(engine: &'a OverlayEngine) -> Self {
        Self { engine }
    }
}

impl Drop for OverlayRunGuard<'_> {
    fn drop(&mut self) {
        self.engine.hide();
    }
}

/// Run `f` and hide the overlay afterwards unconditionally.
pub fn run_with_overlay<T>(engine: &OverlayEngine, f: impl FnOnce(&OverlayEngine) -> T) -> T {
    let _guard = OverlayRunGuard::new(engine);
    f(engine)
}
