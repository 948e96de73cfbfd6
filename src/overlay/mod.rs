pub mod layout;
pub mod messages;
pub mod service;
pub mod session;
pub mod snapshot;
pub mod state;
pub mod window;
pub mod worker;

pub use messages::{DisplayCommand, InitStatus};
pub use service::OverlayEngine;
pub use session::{get_overlay, release_overlay, session, OverlaySession};
pub use snapshot::OverlaySnapshot;
pub use state::{EngineLifecycle, Visibility};
pub use window::{HeadlessSurface, OverlaySurface, SurfaceFactory};
