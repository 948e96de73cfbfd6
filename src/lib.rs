pub mod dispatch;
pub mod logging;
pub mod overlay;
pub mod settings;
pub mod translate;

pub use overlay::{get_overlay, release_overlay, OverlayEngine, OverlaySession};
pub use translate::{translate, translate_batch, ActionDescriptor};
