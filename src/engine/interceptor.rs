// src/engine/interceptor.rs
//! Session facade
//!
//! The two public verbs, `start` and `stop`, sequenced over the full set
//! of registered surfaces. Registration order is the capture order; it
//! matters only for determinism of the snapshots, not for correctness.
//!
//! Both verbs are idempotent. `stop` with nothing patched is a no-op, and
//! a repeated `start` without an intervening `stop` restores from the
//! existing snapshots before capturing afresh, so shims never wrap shims
//! and notification counts never compound.

use crate::engine::patcher::patch_surface;
use crate::engine::restorer::unpatch_surface;
use crate::engine::snapshot::SnapshotStore;
use crate::registry::capability::{CapabilityRegistry, LiveTableRegistry};
use crate::registry::member_table::TargetSurface;
use crate::report::session::{ListenerSession, ReportOptions, Sink};
use crate::utils::config::EngineConfig;
use crate::utils::errors::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Engine facade owning the registered surfaces, the snapshot store and
/// the listener session.
pub struct Interceptor {
    registry: Arc<dyn CapabilityRegistry>,
    session: Arc<ListenerSession>,
    store: SnapshotStore,
    surfaces: Vec<TargetSurface>,
    active: AtomicBool,
}

impl Interceptor {
    pub fn new(registry: Arc<dyn CapabilityRegistry>) -> Self {
        Self {
            registry,
            session: Arc::new(ListenerSession::new()),
            store: SnapshotStore::new(),
            surfaces: Vec::new(),
            active: AtomicBool::new(false),
        }
    }

    /// An interceptor over live member tables, the production registry.
    pub fn with_live_tables() -> Self {
        Self::new(Arc::new(LiveTableRegistry::new()))
    }

    /// Register a surface. Surfaces are captured and patched in
    /// registration order.
    pub fn register_surface(&mut self, surface: TargetSurface) {
        self.surfaces.push(surface);
    }

    pub fn surfaces(&self) -> &[TargetSurface] {
        &self.surfaces
    }

    /// The listener session shims report through. Exposed for composable
    /// use together with the per-surface operations.
    pub fn session(&self) -> &Arc<ListenerSession> {
        &self.session
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Start intercepting: capture then patch every registered surface,
    /// then install `sink` as the active notification sink. `None` keeps
    /// the default console-style reporter.
    pub fn start(&self, sink: Option<Sink>, options: ReportOptions) -> Result<()> {
        info!(surfaces = self.surfaces.len(), "starting interception");
        {
            let _quiet = self.session.quiet();
            self.session.configure(options);

            if self.active.load(Ordering::SeqCst) {
                // repeated start: drop the installed shims first so the
                // fresh capture records originals, not wrappers
                for surface in &self.surfaces {
                    unpatch_surface(self.registry.as_ref(), &self.session, &self.store, surface)?;
                }
            }

            for surface in &self.surfaces {
                patch_surface(self.registry.as_ref(), &self.session, &self.store, surface)?;
            }
        }
        self.session.set_active_sink(sink);
        self.active.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// `start` with default options.
    pub fn start_with_sink(&self, sink: Sink) -> Result<()> {
        self.start(Some(sink), ReportOptions::default())
    }

    /// `start` with options taken from loaded configuration. Fails before
    /// patching anything when the configuration is invalid.
    pub fn start_from_config(&self, sink: Option<Sink>, config: &EngineConfig) -> Result<()> {
        self.start(sink, config.report_options()?)
    }

    /// Stop intercepting: restore every registered surface and return the
    /// sink to the default reporter. Safe when nothing is patched.
    pub fn stop(&self) -> Result<()> {
        info!(surfaces = self.surfaces.len(), "stopping interception");
        {
            let _quiet = self.session.quiet();
            for surface in &self.surfaces {
                unpatch_surface(self.registry.as_ref(), &self.session, &self.store, surface)?;
            }
        }
        self.session.reset_sink();
        self.active.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Per-surface operation: capture a snapshot without patching.
    pub fn capture_snapshot(&self, surface: &TargetSurface) -> Result<usize> {
        self.store.capture(self.registry.as_ref(), &self.session, surface)
    }

    /// Per-surface operation: capture and patch one surface.
    pub fn patch_surface(&self, surface: &TargetSurface) -> Result<usize> {
        patch_surface(self.registry.as_ref(), &self.session, &self.store, surface)
    }

    /// Per-surface operation: restore one surface from its snapshot.
    pub fn unpatch_surface(&self, surface: &TargetSurface) -> Result<usize> {
        unpatch_surface(self.registry.as_ref(), &self.session, &self.store, surface)
    }
}
