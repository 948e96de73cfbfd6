use std::sync::mpsc::Sender;

/// Display work posted to the owner thread.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayCommand {
    Show { text: String, duration: f64 },
    Hide,
    UpdateText(String),
    /// Make the last shown panel visible again without scheduling a hide.
    Reshow,
}

impl DisplayCommand {
    /// Whether posting this command should bring an uninitialized engine up.
    pub fn initializes(&self) -> bool {
        !matches!(self, Self::Hide)
    }
}

#[derive(Debug)]
pub(crate) enum WorkerMessage {
    Display(DisplayCommand),
    Flush(Sender<()>),
    Terminate,
}

/// Outcome of bringing the engine up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStatus {
    Ready,
    AlreadyRunning,
    Unavailable,
    Destroyed,
}

impl InitStatus {
    pub fn is_usable(self) -> bool {
        matches!(self, Self::Ready | Self::AlreadyRunning)
    }
}
