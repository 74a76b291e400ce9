// src/engine/patcher.rs
//! Member patcher
//!
//! Wraps each patchable member of a surface with a notifying shim and
//! installs the shim in place of the original. The install path follows
//! the member's shape:
//!
//! - configurable callable data slot → shim through descriptor redefinition
//! - non-configurable but writable callable data slot → shim through the
//!   plain-write path
//! - accessor slot → getter and setter wrapped independently, tagged
//!   `get:` / `set:`
//! - anything else → untouched
//!
//! The mutation is deliberately global: every existing and future instance
//! of the surface observes the shim. A refusal on one member never aborts
//! patching of the rest.

use crate::engine::snapshot::SnapshotStore;
use crate::registry::capability::CapabilityRegistry;
use crate::registry::descriptor::{
    CallFn, GetFn, MemberKind, MemberSlot, MemberValue, Mutation, Probe, SetFn,
};
use crate::registry::member_table::TargetSurface;
use crate::report::session::ListenerSession;
use crate::utils::errors::Result;
use std::sync::Arc;
use tracing::debug;

/// Capture `surface` into the store, then install shims over its
/// patchable members. Returns the number of members shimmed.
pub fn patch_surface(
    registry: &dyn CapabilityRegistry,
    session: &Arc<ListenerSession>,
    store: &SnapshotStore,
    surface: &TargetSurface,
) -> Result<usize> {
    // snapshot first, so restoration always has pre-patch state
    store.capture(registry, session, surface)?;

    let _quiet = session.quiet();
    let mut patched = 0;

    for name in registry.enumerate_own_members(surface)? {
        let Probe::Described(slot) = registry.describe(surface, &name) else {
            debug!(surface = %surface.name, member = %name, "member unreadable, skipping");
            continue;
        };

        let outcome = if slot.configurable {
            match slot.kind {
                MemberKind::Data {
                    value: MemberValue::Callable(original),
                    writable,
                } => registry.redefine(
                    surface,
                    &name,
                    MemberSlot {
                        kind: MemberKind::Data {
                            value: MemberValue::Callable(call_shim(session, &name, original)),
                            writable,
                        },
                        configurable: true,
                        enumerable: slot.enumerable,
                    },
                ),
                MemberKind::Accessor { get, set } => {
                    let get = get.map(|original| get_shim(session, &name, original));
                    let set = set.map(|original| set_shim(session, &name, original));
                    registry.redefine(
                        surface,
                        &name,
                        MemberSlot {
                            kind: MemberKind::Accessor { get, set },
                            configurable: true,
                            enumerable: slot.enumerable,
                        },
                    )
                }
                // configurable plain data: nothing to notify about
                MemberKind::Data { .. } => continue,
            }
        } else if let MemberKind::Data {
            value: MemberValue::Callable(original),
            writable: true,
        } = slot.kind
        {
            registry.write_value(
                surface,
                &name,
                MemberValue::Callable(call_shim(session, &name, original)),
            )
        } else {
            // non-configurable, non-writable or non-callable: untouched
            continue;
        };

        match outcome {
            Mutation::Applied => patched += 1,
            Mutation::Refused => {
                debug!(surface = %surface.name, member = %name, "host refused redefinition, skipping");
            }
        }
    }

    debug!(surface = %surface.name, members = patched, "installed shims");
    Ok(patched)
}

fn call_shim(session: &Arc<ListenerSession>, member: &str, original: CallFn) -> CallFn {
    let session = session.clone();
    let member = member.to_string();
    Arc::new(move |recv, args| {
        session.notify(&member)?;
        original(recv, args)
    })
}

fn get_shim(session: &Arc<ListenerSession>, member: &str, original: GetFn) -> GetFn {
    let session = session.clone();
    let tag = format!("get:{}", member);
    Arc::new(move |recv| {
        session.notify(&tag)?;
        original(recv)
    })
}

fn set_shim(session: &Arc<ListenerSession>, member: &str, original: SetFn) -> SetFn {
    let session = session.clone();
    let tag = format!("set:{}", member);
    Arc::new(move |recv, value| {
        session.notify(&tag)?;
        original(recv, value)
    })
}
