// src/engine/snapshot.rs
//! Pre-patch snapshot store
//!
//! Captures and owns the original descriptor of every member of a surface,
//! keyed by surface name. A snapshot is captured in full before any member
//! is patched, inside a suppression window, and is the restorer's only
//! source of truth. Capturing again overwrites: last snapshot wins.

use crate::registry::capability::CapabilityRegistry;
use crate::registry::descriptor::{MemberSlot, Probe};
use crate::registry::member_table::TargetSurface;
use crate::report::session::ListenerSession;
use crate::utils::errors::{EngineError, Result};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Member name → original descriptor, for one surface.
pub type SurfaceSnapshot = BTreeMap<String, MemberSlot>;

/// Snapshots for every captured surface, keyed by surface name.
#[derive(Default)]
pub struct SnapshotStore {
    snapshots: RwLock<HashMap<String, SurfaceSnapshot>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the current descriptor of every readable member of
    /// `surface`, replacing any prior snapshot for the same name.
    ///
    /// Unreadable members are omitted: they will be skipped by the patcher
    /// too. Fails only when the surface name is missing or the surface has
    /// no enumerable member table at all.
    pub fn capture(
        &self,
        registry: &dyn CapabilityRegistry,
        session: &ListenerSession,
        surface: &TargetSurface,
    ) -> Result<usize> {
        if surface.name.is_empty() {
            return Err(EngineError::Configuration(
                "a surface name is required to save members, got an empty name".to_string(),
            ));
        }

        let _quiet = session.quiet();
        let names = registry.enumerate_own_members(surface)?;

        let mut snapshot = SurfaceSnapshot::new();
        for name in names {
            match registry.describe(surface, &name) {
                Probe::Described(slot) => {
                    snapshot.insert(name, slot);
                }
                Probe::Unreadable => {
                    debug!(surface = %surface.name, member = %name, "member not capturable, skipping");
                }
            }
        }

        let captured = snapshot.len();
        self.snapshots.write().insert(surface.name.clone(), snapshot);
        debug!(surface = %surface.name, members = captured, "captured surface snapshot");
        Ok(captured)
    }

    /// Clone out the snapshot captured under `surface_name`, if any.
    pub fn get(&self, surface_name: &str) -> Option<SurfaceSnapshot> {
        self.snapshots.read().get(surface_name).cloned()
    }

    pub fn contains(&self, surface_name: &str) -> bool {
        self.snapshots.read().contains_key(surface_name)
    }
}
