use crate::overlay::layout::{panel_geometry, text_align, PanelGeometry, TextAlign};
use crate::overlay::messages::{DisplayCommand, WorkerMessage};
use crate::overlay::snapshot::{OverlaySnapshot, SnapshotBuffer};
use crate::overlay::state::Visibility;
use crate::overlay::window::{OverlaySurface, SurfaceFactory};
use crate::settings::OverlaySettings;
use anyhow::{anyhow, Result};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Presentation loop cadence while no command or deadline is pending.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

pub(crate) struct WorkerHandles {
    pub thread: JoinHandle<()>,
    pub commands: Sender<WorkerMessage>,
    pub startup: Receiver<Result<(), String>>,
}

/// Converts a show duration to a deadline offset. Zero, negative and
/// non-finite durations never auto-hide.
pub fn auto_hide_after(duration: f64) -> Option<Duration> {
    if duration.is_finite() && duration > 0.0 {
        Duration::try_from_secs_f64(duration).ok()
    } else {
        None
    }
}

#[derive(Debug, Clone, Default)]
struct PanelState {
    visibility: Visibility,
    text: String,
    align: TextAlign,
    geometry: PanelGeometry,
}

pub(crate) struct OverlayWorker {
    surface: Box<dyn OverlaySurface>,
    settings: OverlaySettings,
    panel: PanelState,
    hide_deadline: Option<Instant>,
    applied: u64,
    snapshot: Arc<SnapshotBuffer>,
}

impl OverlayWorker {
    pub(crate) fn new(
        surface: Box<dyn OverlaySurface>,
        settings: OverlaySettings,
        snapshot: Arc<SnapshotBuffer>,
    ) -> Self {
        let worker = Self {
            surface,
            settings,
            panel: PanelState::default(),
            hide_deadline: None,
            applied: 0,
            snapshot,
        };
        worker.publish();
        worker
    }

    /// Returns `false` once the loop should stop.
    pub(crate) fn handle(&mut self, message: WorkerMessage, now: Instant) -> bool {
        match message {
            WorkerMessage::Display(command) => {
                self.apply(command, now);
                self.applied += 1;
                self.publish();
                true
            }
            WorkerMessage::Flush(reply) => {
                let _ = reply.send(());
                true
            }
            WorkerMessage::Terminate => false,
        }
    }

    pub(crate) fn apply(&mut self, command: DisplayCommand, now: Instant) {
        let result = match command {
            DisplayCommand::Show { text, duration } => self.show(text, duration, now),
            DisplayCommand::Hide => self.hide(),
            DisplayCommand::UpdateText(text) => self.update_text(text),
            DisplayCommand::Reshow => self.reshow(),
        };
        if let Err(err) = result {
            tracing::debug!(?err, "overlay display command dropped");
        }
    }

    /// Hides the panel if its auto-hide deadline has passed.
    pub(crate) fn tick(&mut self, now: Instant) -> bool {
        let due = self.hide_deadline.is_some_and(|deadline| now >= deadline);
        if !due {
            return false;
        }
        // A failed hide keeps the deadline so the next tick retries it.
        match self.hide() {
            Ok(()) => {
                self.publish();
                true
            }
            Err(err) => {
                tracing::debug!(?err, "overlay auto-hide failed; retrying");
                false
            }
        }
    }

    pub(crate) fn next_wait(&self, now: Instant) -> Duration {
        match self.hide_deadline {
            Some(deadline) => deadline.saturating_duration_since(now).min(FRAME_INTERVAL),
            None => FRAME_INTERVAL,
        }
    }

    pub(crate) fn pump(&mut self) {
        self.surface.pump();
    }

    pub(crate) fn shutdown(&mut self) {
        self.hide_deadline = None;
        self.surface.shutdown();
        self.panel.visibility = Visibility::Hidden;
        self.publish();
    }

    fn show(&mut self, text: String, duration: f64, now: Instant) -> Result<()> {
        let (screen_width, _) = self.surface.screen_size();
        let geometry = panel_geometry(&self.settings, screen_width, &text);
        let align = text_align(&text);

        let presented = self
            .surface
            .set_geometry(geometry)
            .and_then(|()| self.surface.set_text(&text, align))
            .and_then(|()| self.present());
        if let Err(err) = presented {
            self.restore_surface();
            return Err(err);
        }

        self.panel = PanelState {
            visibility: Visibility::Showing,
            text,
            align,
            geometry,
        };
        // The latest show owns the timer, including clearing it.
        self.hide_deadline = auto_hide_after(duration).map(|after| now + after);
        Ok(())
    }

    fn hide(&mut self) -> Result<()> {
        if self.panel.visibility == Visibility::Showing {
            self.surface.set_visible(false)?;
            self.panel.visibility = Visibility::Hidden;
        }
        self.hide_deadline = None;
        Ok(())
    }

    fn update_text(&mut self, text: String) -> Result<()> {
        self.surface.set_text(&text, self.panel.align)?;
        self.panel.text = text;
        Ok(())
    }

    fn reshow(&mut self) -> Result<()> {
        if self.panel.visibility == Visibility::Showing || self.panel.text.is_empty() {
            return Ok(());
        }
        let presented = self
            .surface
            .set_geometry(self.panel.geometry)
            .and_then(|()| self.present());
        if let Err(err) = presented {
            self.restore_surface();
            return Err(err);
        }
        self.panel.visibility = Visibility::Showing;
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        self.surface.set_opacity(self.settings.opacity)?;
        self.surface.set_visible(true)?;
        self.surface.raise()
    }

    /// Put the surface back to the last applied panel after a partial update.
    fn restore_surface(&mut self) {
        let panel = &self.panel;
        let restored = self
            .surface
            .set_geometry(panel.geometry)
            .and_then(|()| self.surface.set_text(&panel.text, panel.align))
            .and_then(|()| {
                self.surface
                    .set_visible(panel.visibility == Visibility::Showing)
            });
        if let Err(err) = restored {
            tracing::debug!(?err, "overlay surface could not be restored");
        }
    }

    fn publish(&self) {
        self.snapshot.publish(OverlaySnapshot {
            visibility: self.panel.visibility,
            text: self.panel.text.clone(),
            align: self.panel.align,
            geometry: self.panel.geometry,
            auto_hide_pending: self.hide_deadline.is_some(),
            applied_commands: self.applied,
        });
    }
}

pub(crate) fn spawn_worker(
    settings: OverlaySettings,
    factory: SurfaceFactory,
    snapshot: Arc<SnapshotBuffer>,
) -> Result<WorkerHandles> {
    let (commands_tx, commands_rx) = channel::<WorkerMessage>();
    let (startup_tx, startup_rx) = channel::<Result<(), String>>();

    let thread = thread::Builder::new()
        .name("action-overlay".to_string())
        .spawn(move || {
            let surface = match factory(&settings) {
                Ok(surface) => surface,
                Err(err) => {
                    let _ = startup_tx.send(Err(format!("{err:#}")));
                    return;
                }
            };
            let mut worker = OverlayWorker::new(surface, settings, snapshot);
            let _ = startup_tx.send(Ok(()));
            run_presentation_loop(&mut worker, &commands_rx);
            worker.shutdown();
        })
        .map_err(|err| anyhow!("failed to spawn overlay thread: {err}"))?;

    Ok(WorkerHandles {
        thread,
        commands: commands_tx,
        startup: startup_rx,
    })
}

fn run_presentation_loop(worker: &mut OverlayWorker, commands: &Receiver<WorkerMessage>) {
    loop {
        worker.pump();
        worker.tick(Instant::now());

        match commands.recv_timeout(worker.next_wait(Instant::now())) {
            Ok(message) => {
                if !worker.handle(message, Instant::now()) {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                tracing::debug!("overlay command channel closed; stopping owner thread");
                break;
            }
        }
    }
}
