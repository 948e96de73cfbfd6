use crate::overlay::layout::{PanelGeometry, TextAlign};
use crate::overlay::state::Visibility;
use std::sync::Mutex;

/// Copy of the panel state as last applied by the owner thread.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OverlaySnapshot {
    pub visibility: Visibility,
    pub text: String,
    pub align: TextAlign,
    pub geometry: PanelGeometry,
    pub auto_hide_pending: bool,
    pub applied_commands: u64,
}

impl OverlaySnapshot {
    pub fn is_showing(&self) -> bool {
        self.visibility == Visibility::Showing
    }
}

/// Written only by the owner thread; any thread may read a copy.
#[derive(Default)]
pub(crate) struct SnapshotBuffer {
    snapshot: Mutex<OverlaySnapshot>,
}

impl SnapshotBuffer {
    pub(crate) fn publish(&self, next: OverlaySnapshot) {
        if let Ok(mut snapshot) = self.snapshot.lock() {
            *snapshot = next;
        }
    }

    pub(crate) fn snapshot(&self) -> OverlaySnapshot {
        self.snapshot
            .lock()
            .map(|snapshot| snapshot.clone())
            .unwrap_or_default()
    }
}
