use crate::overlay::messages::{DisplayCommand, InitStatus, WorkerMessage};
use crate::overlay::snapshot::{OverlaySnapshot, SnapshotBuffer};
use crate::overlay::state::{can_transition, EngineLifecycle, Visibility};
use crate::overlay::window::{native_surface_factory, SurfaceFactory};
use crate::overlay::worker::spawn_worker;
use crate::settings::OverlaySettings;
use std::sync::mpsc::{RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

pub const STARTUP_TIMEOUT: Duration = Duration::from_secs(2);
pub const WORKER_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

struct EngineState {
    lifecycle: EngineLifecycle,
    commands: Option<Sender<WorkerMessage>>,
    worker: Option<JoinHandle<()>>,
}

/// Handle to one overlay panel and its owner thread.
///
/// Every display method only enqueues work and returns; the owner thread
/// applies commands in the order a caller posted them. Failures never
/// surface to the caller, they move the engine to
/// [`EngineLifecycle::Unavailable`] and later calls become no-ops.
pub struct OverlayEngine {
    settings: OverlaySettings,
    factory: SurfaceFactory,
    state: Mutex<EngineState>,
    snapshot: Arc<SnapshotBuffer>,
}

impl OverlayEngine {
    pub fn new(settings: OverlaySettings) -> Self {
        Self::with_surface_factory(settings, native_surface_factory())
    }

    pub fn with_surface_factory(settings: OverlaySettings, factory: SurfaceFactory) -> Self {
        Self {
            settings,
            factory,
            state: Mutex::new(EngineState {
                lifecycle: EngineLifecycle::Uninitialized,
                commands: None,
                worker: None,
            }),
            snapshot: Arc::new(SnapshotBuffer::default()),
        }
    }

    pub fn settings(&self) -> &OverlaySettings {
        &self.settings
    }

    pub fn lifecycle(&self) -> EngineLifecycle {
        self.state
            .lock()
            .map(|s| s.lifecycle)
            .unwrap_or(EngineLifecycle::Unavailable)
    }

    pub fn is_available(&self) -> bool {
        self.lifecycle().accepts_commands()
    }

    /// Spawn the owner thread and wait for its surface to come up. Repeated
    /// calls return the current status without side effects.
    pub fn initialize(&self) -> InitStatus {
        let Ok(mut state) = self.state.lock() else {
            return InitStatus::Unavailable;
        };
        self.initialize_locked(&mut state)
    }

    pub fn show(&self, text: impl Into<String>, duration_seconds: f64) {
        self.post(DisplayCommand::Show {
            text: text.into(),
            duration: duration_seconds,
        });
    }

    pub fn hide(&self) {
        self.post(DisplayCommand::Hide);
    }

    pub fn update_text(&self, text: impl Into<String>) {
        self.post(DisplayCommand::UpdateText(text.into()));
    }

    pub fn reshow(&self) {
        self.post(DisplayCommand::Reshow);
    }

    pub fn post(&self, command: DisplayCommand) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        if state.lifecycle == EngineLifecycle::Uninitialized {
            if !command.initializes() {
                return;
            }
            self.initialize_locked(&mut state);
        }
        if state.lifecycle != EngineLifecycle::Running {
            return;
        }

        let delivered = state
            .commands
            .as_ref()
            .is_some_and(|tx| tx.send(WorkerMessage::Display(command)).is_ok());
        if !delivered {
            tracing::warn!("overlay owner thread stopped; overlay disabled");
            Self::transition_locked(&mut state, EngineLifecycle::Unavailable);
            state.commands = None;
        }
    }

    /// Wait until everything posted before this call has been applied.
    /// Returns `false` on timeout or when the engine is not running.
    pub fn flush(&self, timeout: Duration) -> bool {
        let reply_rx = {
            let Ok(state) = self.state.lock() else {
                return false;
            };
            if state.lifecycle != EngineLifecycle::Running {
                return false;
            }
            let Some(tx) = state.commands.as_ref() else {
                return false;
            };
            let (reply_tx, reply_rx) = std::sync::mpsc::channel();
            if tx.send(WorkerMessage::Flush(reply_tx)).is_err() {
                return false;
            }
            reply_rx
        };
        reply_rx.recv_timeout(timeout).is_ok()
    }

    pub fn snapshot(&self) -> OverlaySnapshot {
        self.snapshot.snapshot()
    }

    pub fn visibility(&self) -> Visibility {
        self.snapshot().visibility
    }

    pub fn is_showing(&self) -> bool {
        self.visibility() == Visibility::Showing
    }

    /// Stop the owner thread and release the window. Safe to call any
    /// number of times.
    pub fn cleanup(&self) {
        let (commands, worker) = {
            let Ok(mut state) = self.state.lock() else {
                return;
            };
            if state.lifecycle == EngineLifecycle::Destroyed {
                return;
            }
            Self::transition_locked(&mut state, EngineLifecycle::Destroyed);
            (state.commands.take(), state.worker.take())
        };

        if let Some(tx) = commands {
            let _ = tx.send(WorkerMessage::Terminate);
        }
        join_worker_with_timeout(worker, WORKER_JOIN_TIMEOUT);
        tracing::debug!("overlay engine destroyed");
    }

    fn initialize_locked(&self, state: &mut EngineState) -> InitStatus {
        match state.lifecycle {
            EngineLifecycle::Running => return InitStatus::AlreadyRunning,
            EngineLifecycle::Unavailable => return InitStatus::Unavailable,
            EngineLifecycle::Destroyed => return InitStatus::Destroyed,
            EngineLifecycle::Uninitialized => {}
        }

        let handles = match spawn_worker(
            self.settings.clone(),
            Arc::clone(&self.factory),
            Arc::clone(&self.snapshot),
        ) {
            Ok(handles) => handles,
            Err(err) => {
                tracing::warn!(?err, "overlay unavailable");
                Self::transition_locked(state, EngineLifecycle::Unavailable);
                return InitStatus::Unavailable;
            }
        };

        match handles.startup.recv_timeout(STARTUP_TIMEOUT) {
            Ok(Ok(())) => {
                state.commands = Some(handles.commands);
                state.worker = Some(handles.thread);
                Self::transition_locked(state, EngineLifecycle::Running);
                tracing::debug!("overlay engine initialized");
                InitStatus::Ready
            }
            Ok(Err(error)) => {
                tracing::warn!(error = %error, "overlay unavailable: window creation failed");
                join_worker_with_timeout(Some(handles.thread), WORKER_JOIN_TIMEOUT);
                Self::transition_locked(state, EngineLifecycle::Unavailable);
                InitStatus::Unavailable
            }
            Err(RecvTimeoutError::Timeout) => {
                // Dropping the sender lets a late worker observe the closed
                // channel and exit on its own.
                tracing::warn!("overlay unavailable: owner thread did not start in time");
                Self::transition_locked(state, EngineLifecycle::Unavailable);
                InitStatus::Unavailable
            }
            Err(RecvTimeoutError::Disconnected) => {
                tracing::warn!("overlay unavailable: owner thread exited during startup");
                join_worker_with_timeout(Some(handles.thread), WORKER_JOIN_TIMEOUT);
                Self::transition_locked(state, EngineLifecycle::Unavailable);
                InitStatus::Unavailable
            }
        }
    }

    fn transition_locked(state: &mut EngineState, next: EngineLifecycle) {
        if can_transition(state.lifecycle, next) {
            state.lifecycle = next;
        } else {
            tracing::error!(
                "invalid overlay lifecycle transition: {:?} -> {:?}",
                state.lifecycle,
                next
            );
        }
    }
}

impl std::fmt::Debug for OverlayEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayEngine")
            .field("lifecycle", &self.lifecycle())
            .field("snapshot", &self.snapshot())
            .finish()
    }
}

fn join_worker_with_timeout(handle: Option<JoinHandle<()>>, timeout: Duration) {
    let Some(handle) = handle else {
        return;
    };

    let (done_tx, done_rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let join_result = handle.join();
        let _ = done_tx.send(join_result);
    });

    match done_rx.recv_timeout(timeout) {
        Ok(Ok(())) => {}
        Ok(Err(_)) => {
            tracing::error!("overlay owner thread panicked while joining");
        }
        Err(RecvTimeoutError::Timeout) => {
            tracing::error!("overlay owner thread join timed out");
        }
        Err(RecvTimeoutError::Disconnected) => {
            tracing::error!("overlay owner thread join channel disconnected");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::window::{headless_surface_factory, OverlaySurface};
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const FLUSH: Duration = Duration::from_secs(2);

    fn headless_engine() -> OverlayEngine {
        OverlayEngine::with_surface_factory(OverlaySettings::default(), headless_surface_factory())
    }

    #[test]
    fn first_show_initializes_lazily() {
        let engine = headless_engine();
        assert_eq!(engine.lifecycle(), EngineLifecycle::Uninitialized);
        engine.show("click", 0.0);
        assert_eq!(engine.lifecycle(), EngineLifecycle::Running);
        assert!(engine.flush(FLUSH));
        assert!(engine.is_showing());
        engine.cleanup();
    }

    #[test]
    fn hide_before_initialization_stays_uninitialized() {
        let engine = headless_engine();
        engine.hide();
        assert_eq!(engine.lifecycle(), EngineLifecycle::Uninitialized);
        assert!(!engine.flush(FLUSH));
    }

    #[test]
    fn initialize_is_idempotent() {
        let engine = headless_engine();
        assert_eq!(engine.initialize(), InitStatus::Ready);
        assert_eq!(engine.initialize(), InitStatus::AlreadyRunning);
        engine.cleanup();
        assert_eq!(engine.initialize(), InitStatus::Destroyed);
    }

    #[test]
    fn factory_failure_degrades_to_silent_no_ops() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = Arc::clone(&attempts);
        let factory: SurfaceFactory = Arc::new(
            move |_settings: &OverlaySettings| -> anyhow::Result<Box<dyn OverlaySurface>> {
                attempts_clone.fetch_add(1, Ordering::SeqCst);
                Err(anyhow!("display unavailable"))
            },
        );
        let engine = OverlayEngine::with_surface_factory(OverlaySettings::default(), factory);

        assert_eq!(engine.initialize(), InitStatus::Unavailable);
        engine.show("click", 1.0);
        engine.update_text("ignored");
        engine.hide();
        assert_eq!(engine.lifecycle(), EngineLifecycle::Unavailable);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(!engine.is_showing());

        engine.cleanup();
        assert_eq!(engine.lifecycle(), EngineLifecycle::Destroyed);
    }

    #[test]
    fn cleanup_twice_is_a_no_op() {
        let engine = headless_engine();
        engine.show("x", 0.0);
        engine.cleanup();
        engine.cleanup();
        assert_eq!(engine.lifecycle(), EngineLifecycle::Destroyed);
        assert!(!engine.is_showing());
        engine.show("after", 0.0);
        assert_eq!(engine.lifecycle(), EngineLifecycle::Destroyed);
    }

    #[test]
    fn commands_from_one_thread_apply_in_order() {
        let engine = headless_engine();
        for i in 0..50 {
            engine.update_text(format!("step {i}"));
        }
        engine.show("final", 0.0);
        assert!(engine.flush(FLUSH));
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.text, "final");
        assert_eq!(snapshot.applied_commands, 51);
        engine.cleanup();
    }
}
