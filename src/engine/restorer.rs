// src/engine/restorer.rs
//! Restorer
//!
//! Reverts every currently installed shim on a surface back to the
//! snapshot captured for it. Restoration is best-effort and safe to call
//! when nothing was patched: members that are not currently callable, or
//! that have no snapshot entry, are left untouched rather than failing the
//! whole pass. The one loud failure is a missing surface name, because
//! without it the saved state cannot be located.

use crate::engine::snapshot::SnapshotStore;
use crate::registry::capability::CapabilityRegistry;
use crate::registry::descriptor::{MemberKind, Mutation, Probe};
use crate::registry::member_table::TargetSurface;
use crate::report::session::ListenerSession;
use crate::utils::errors::{EngineError, Result};
use std::sync::Arc;
use tracing::debug;

/// Restore `surface`'s members from its stored snapshot. Returns the
/// number of members written back.
pub fn unpatch_surface(
    registry: &dyn CapabilityRegistry,
    session: &Arc<ListenerSession>,
    store: &SnapshotStore,
    surface: &TargetSurface,
) -> Result<usize> {
    if surface.name.is_empty() {
        return Err(EngineError::Configuration(
            "a surface name is required to locate saved members, got an empty name".to_string(),
        ));
    }

    let Some(snapshot) = store.get(&surface.name) else {
        debug!(surface = %surface.name, "no snapshot captured, nothing to restore");
        return Ok(0);
    };

    let _quiet = session.quiet();
    let mut restored = 0;

    for name in registry.enumerate_own_members(surface).unwrap_or_default() {
        let Probe::Described(current) = registry.describe(surface, &name) else {
            continue;
        };
        // only currently callable members can be carrying a shim
        if !current.is_callable() {
            continue;
        }
        let Some(original) = snapshot.get(&name) else {
            continue;
        };

        let outcome = if current.configurable {
            registry.redefine(surface, &name, original.clone())
        } else if let (
            MemberKind::Data { writable: true, .. },
            MemberKind::Data { value, .. },
        ) = (&current.kind, &original.kind)
        {
            registry.write_value(surface, &name, value.clone())
        } else {
            continue;
        };

        if outcome == Mutation::Applied {
            restored += 1;
        }
    }

    debug!(surface = %surface.name, members = restored, "restored surface members");
    Ok(restored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::patcher::patch_surface;
    use crate::registry::capability::LiveTableRegistry;
    use crate::registry::descriptor::{CallFn, GetFn, MemberSlot, MemberValue, SetFn};
    use crate::registry::member_table::{Instance, MemberTable};
    use crate::report::session::{Notification, Sink};
    use parking_lot::Mutex;
    use proptest::prelude::*;
    use serde_json::Value;
    use std::collections::BTreeMap;

    fn mk_call() -> CallFn {
        Arc::new(|_, _| Ok(Value::from("original")))
    }

    fn mk_get() -> GetFn {
        Arc::new(|_| Ok(Value::Null))
    }

    fn mk_set() -> SetFn {
        Arc::new(|_, _| Ok(()))
    }

    fn recording_session() -> (Arc<ListenerSession>, Arc<Mutex<Vec<Notification>>>) {
        let session = Arc::new(ListenerSession::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let inner = seen.clone();
        let sink: Sink = Arc::new(move |n: &Notification| inner.lock().push(n.clone()));
        session.set_active_sink(Some(sink));
        (session, seen)
    }

    #[test]
    fn test_round_trip_silences_and_restores_behavior() {
        let table = MemberTable::new();
        let original = mk_call();
        table.define("m", MemberSlot::method(original.clone()));
        let surface = TargetSurface::new("Element", table.clone());
        let (session, seen) = recording_session();
        let registry = LiveTableRegistry::new();
        let store = SnapshotStore::new();

        patch_surface(&registry, &session, &store, &surface).unwrap();
        let instance = Instance::of_table(table.clone());
        instance.call("m", &[]).unwrap();
        assert_eq!(seen.lock().len(), 1);

        unpatch_surface(&registry, &session, &store, &surface).unwrap();
        assert_eq!(instance.call("m", &[]).unwrap(), Value::from("original"));
        assert_eq!(seen.lock().len(), 1);

        // identity, not just behavior
        let restored = table.describe("m").unwrap();
        match restored.kind {
            MemberKind::Data {
                value: MemberValue::Callable(call),
                ..
            } => assert!(Arc::ptr_eq(&call, &original)),
            _ => panic!("restored slot changed shape"),
        }
    }

    #[test]
    fn test_unpatch_without_capture_is_a_safe_noop() {
        let table = MemberTable::new();
        let original = mk_call();
        table.define("m", MemberSlot::method(original.clone()));
        let surface = TargetSurface::new("Element", table.clone());
        let (session, _) = recording_session();
        let registry = LiveTableRegistry::new();
        let store = SnapshotStore::new();

        let restored = unpatch_surface(&registry, &session, &store, &surface).unwrap();
        assert_eq!(restored, 0);

        let slot = table.describe("m").unwrap();
        match slot.kind {
            MemberKind::Data {
                value: MemberValue::Callable(call),
                ..
            } => assert!(Arc::ptr_eq(&call, &original)),
            _ => panic!("member changed without a snapshot"),
        }
    }

    #[test]
    fn test_unpatch_requires_surface_name() {
        let table = MemberTable::new();
        table.define("m", MemberSlot::method(mk_call()));
        let surface = TargetSurface::new("", table);
        let (session, _) = recording_session();
        let store = SnapshotStore::new();

        assert!(matches!(
            unpatch_surface(&LiveTableRegistry::new(), &session, &store, &surface),
            Err(EngineError::Configuration(_))
        ));
    }

    #[test]
    fn test_members_without_snapshot_entry_are_untouched() {
        let table = MemberTable::new();
        table.define("captured", MemberSlot::method(mk_call()));
        let surface = TargetSurface::new("Element", table.clone());
        let (session, _) = recording_session();
        let registry = LiveTableRegistry::new();
        let store = SnapshotStore::new();
        store.capture(&registry, &session, &surface).unwrap();

        // appears after capture, so it has no snapshot entry
        let late = mk_call();
        table.define("late_arrival", MemberSlot::method(late.clone()));

        unpatch_surface(&registry, &session, &store, &surface).unwrap();

        let slot = table.describe("late_arrival").unwrap();
        match slot.kind {
            MemberKind::Data {
                value: MemberValue::Callable(call),
                ..
            } => assert!(Arc::ptr_eq(&call, &late)),
            _ => panic!("uncaptured member was modified"),
        }
    }

    #[test]
    fn test_plain_data_is_not_rewritten() {
        let table = MemberTable::new();
        table.define("node_type", MemberSlot::data(Value::from(1)));
        let surface = TargetSurface::new("Node", table.clone());
        let (session, _) = recording_session();
        let registry = LiveTableRegistry::new();
        let store = SnapshotStore::new();

        patch_surface(&registry, &session, &store, &surface).unwrap();
        table.write_value("node_type", MemberValue::Plain(Value::from(9)));

        unpatch_surface(&registry, &session, &store, &surface).unwrap();
        // not callable, so restoration leaves the newer value in place
        let instance = Instance::of_table(table);
        assert_eq!(instance.get("node_type").unwrap(), Value::from(9));
    }

    proptest! {
        /// capture → patch → unpatch leaves every descriptor identical by
        /// `Arc` identity, across member shapes and flag combinations.
        #[test]
        fn prop_round_trip_preserves_descriptor_identity(
            shapes in prop::collection::btree_map("[a-z]{1,8}", 0u8..6, 1..8)
        ) {
            let table = MemberTable::new();
            let mut originals: BTreeMap<String, MemberSlot> = BTreeMap::new();
            for (name, shape) in &shapes {
                let slot = match shape {
                    0 => MemberSlot::method(mk_call()),
                    1 => MemberSlot::method(mk_call()).sealed(),
                    2 => MemberSlot::method(mk_call()).sealed().frozen(),
                    3 => MemberSlot::data(Value::from(*shape)),
                    4 => MemberSlot::accessor(Some(mk_get()), Some(mk_set())),
                    _ => MemberSlot::accessor(Some(mk_get()), None),
                };
                originals.insert(name.clone(), slot.clone());
                table.define(name.clone(), slot);
            }
            let surface = TargetSurface::new("Surface", table.clone());
            let session = Arc::new(ListenerSession::new());
            let registry = LiveTableRegistry::new();
            let store = SnapshotStore::new();

            patch_surface(&registry, &session, &store, &surface).unwrap();
            unpatch_surface(&registry, &session, &store, &surface).unwrap();

            for (name, original) in &originals {
                let current = table.describe(name).unwrap();
                match (&original.kind, &current.kind) {
                    (
                        MemberKind::Data { value: MemberValue::Callable(a), .. },
                        MemberKind::Data { value: MemberValue::Callable(b), .. },
                    ) => prop_assert!(Arc::ptr_eq(a, b)),
                    (
                        MemberKind::Data { value: MemberValue::Plain(a), .. },
                        MemberKind::Data { value: MemberValue::Plain(b), .. },
                    ) => prop_assert_eq!(a, b),
                    (
                        MemberKind::Accessor { get: ga, set: sa },
                        MemberKind::Accessor { get: gb, set: sb },
                    ) => {
                        prop_assert_eq!(ga.is_some(), gb.is_some());
                        prop_assert_eq!(sa.is_some(), sb.is_some());
                        if let (Some(a), Some(b)) = (ga, gb) {
                            prop_assert!(Arc::ptr_eq(a, b));
                        }
                        if let (Some(a), Some(b)) = (sa, sb) {
                            prop_assert!(Arc::ptr_eq(a, b));
                        }
                    }
                    _ => prop_assert!(false, "member `{}` changed shape", name),
                }
            }
        }
    }
}
