#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineLifecycle {
    Uninitialized,
    Running,
    Unavailable,
    Destroyed,
}

impl EngineLifecycle {
    pub fn accepts_commands(self) -> bool {
        matches!(self, Self::Uninitialized | Self::Running)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Hidden,
    Showing,
}

pub fn can_transition(from: EngineLifecycle, to: EngineLifecycle) -> bool {
    matches!(
        (from, to),
        (EngineLifecycle::Uninitialized, EngineLifecycle::Running)
            | (EngineLifecycle::Uninitialized, EngineLifecycle::Unavailable)
            | (EngineLifecycle::Uninitialized, EngineLifecycle::Destroyed)
            | (EngineLifecycle::Running, EngineLifecycle::Unavailable)
            | (EngineLifecycle::Running, EngineLifecycle::Destroyed)
            | (EngineLifecycle::Unavailable, EngineLifecycle::Destroyed)
    ) || from == to
}
