use crate::overlay::service::OverlayEngine;
use crate::overlay::window::{native_surface_factory, SurfaceFactory};
use crate::settings::OverlaySettings;
use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex};

/// Owns at most one [`OverlayEngine`] at a time.
///
/// The slot mutex is held while a new engine is constructed and
/// initialized, so concurrent first callers all receive the same engine.
pub struct OverlaySession {
    settings: Mutex<OverlaySettings>,
    factory: SurfaceFactory,
    engine: Mutex<Option<Arc<OverlayEngine>>>,
}

impl Default for OverlaySession {
    fn default() -> Self {
        Self::new(OverlaySettings::default())
    }
}

impl OverlaySession {
    pub fn new(settings: OverlaySettings) -> Self {
        Self::with_surface_factory(settings, native_surface_factory())
    }

    pub fn with_surface_factory(settings: OverlaySettings, factory: SurfaceFactory) -> Self {
        Self {
            settings: Mutex::new(settings),
            factory,
            engine: Mutex::new(None),
        }
    }

    /// Settings used for the next engine this session builds.
    pub fn configure(&self, settings: OverlaySettings) {
        if let Ok(mut guard) = self.settings.lock() {
            *guard = settings;
        }
    }

    pub fn get_or_create(&self) -> Arc<OverlayEngine> {
        let mut slot = match self.engine.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(engine) = slot.as_ref() {
            return Arc::clone(engine);
        }

        let settings = self
            .settings
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default();
        let engine = Arc::new(OverlayEngine::with_surface_factory(
            settings,
            Arc::clone(&self.factory),
        ));
        let status = engine.initialize();
        tracing::debug!(?status, "overlay session created engine");
        *slot = Some(Arc::clone(&engine));
        engine
    }

    pub fn current(&self) -> Option<Arc<OverlayEngine>> {
        self.engine.lock().ok().and_then(|slot| slot.clone())
    }

    pub fn is_active(&self) -> bool {
        self.current().is_some()
    }

    /// Tear down the held engine, if any. The next
    /// [`get_or_create`](Self::get_or_create) builds a fresh one.
    pub fn release(&self) {
        let engine = match self.engine.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(engine) = engine {
            engine.cleanup();
        }
    }
}

static SESSION: Lazy<OverlaySession> = Lazy::new(OverlaySession::default);

/// Process-wide session. Nothing releases it automatically; call
/// [`release_overlay`] before exiting.
pub fn session() -> &'static OverlaySession {
    &SESSION
}

pub fn get_overlay() -> Arc<OverlayEngine> {
    session().get_or_create()
}

pub fn release_overlay() {
    session().release();
}
