// src/registry/capability.rs
//! Capability registry: the reflection seam
//!
//! The engine never touches member tables directly. Everything it needs
//! from the host — enumerate own members, describe one, redefine one — goes
//! through this trait, so the same capture/patch/restore logic runs against
//! live tables in production and against fakes (including fakes that refuse
//! introspection for chosen members) in tests.

use crate::registry::descriptor::{MemberSlot, MemberValue, Mutation, Probe};
use crate::registry::member_table::TargetSurface;
use crate::utils::errors::{EngineError, Result};

/// Reflection operations over a surface's live member table.
pub trait CapabilityRegistry: Send + Sync {
    /// Ordered sequence of own member names. Fails only when the surface
    /// has no enumerable member table at all — a caller error, not a
    /// runtime condition.
    fn enumerate_own_members(&self, surface: &TargetSurface) -> Result<Vec<String>>;

    /// Attempt to read a member's descriptor. Refusal is a skip outcome.
    fn describe(&self, surface: &TargetSurface, member: &str) -> Probe;

    /// Replace a member through the descriptor-redefinition path.
    fn redefine(&self, surface: &TargetSurface, member: &str, slot: MemberSlot) -> Mutation;

    /// Replace a data member's value through the plain-write path.
    fn write_value(&self, surface: &TargetSurface, member: &str, value: MemberValue) -> Mutation;
}

/// The production registry: operates directly on `MemberTable` handles.
#[derive(Default)]
pub struct LiveTableRegistry;

impl LiveTableRegistry {
    pub fn new() -> Self {
        Self
    }
}

impl CapabilityRegistry for LiveTableRegistry {
    fn enumerate_own_members(&self, surface: &TargetSurface) -> Result<Vec<String>> {
        if surface.handle.is_empty() {
            return Err(EngineError::Configuration(format!(
                "surface `{}` has no enumerable member table",
                surface.name
            )));
        }
        Ok(surface.handle.names())
    }

    fn describe(&self, surface: &TargetSurface, member: &str) -> Probe {
        match surface.handle.describe(member) {
            Some(slot) => Probe::Described(slot),
            None => Probe::Unreadable,
        }
    }

    fn redefine(&self, surface: &TargetSurface, member: &str, slot: MemberSlot) -> Mutation {
        if surface.handle.redefine(member, slot) {
            Mutation::Applied
        } else {
            Mutation::Refused
        }
    }

    fn write_value(&self, surface: &TargetSurface, member: &str, value: MemberValue) -> Mutation {
        if surface.handle.write_value(member, value) {
            Mutation::Applied
        } else {
            Mutation::Refused
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::descriptor::MemberSlot;
    use crate::registry::member_table::MemberTable;
    use serde_json::Value;

    #[test]
    fn test_enumerate_empty_table_is_configuration_error() {
        let registry = LiveTableRegistry::new();
        let surface = TargetSurface::new("Bare", MemberTable::new());
        assert!(matches!(
            registry.enumerate_own_members(&surface),
            Err(EngineError::Configuration(_))
        ));
    }

    #[test]
    fn test_describe_missing_member_is_unreadable() {
        let registry = LiveTableRegistry::new();
        let table = MemberTable::new();
        table.define("present", MemberSlot::data(Value::Null));
        let surface = TargetSurface::new("Element", table);

        assert!(matches!(
            registry.describe(&surface, "present"),
            Probe::Described(_)
        ));
        assert!(matches!(
            registry.describe(&surface, "absent"),
            Probe::Unreadable
        ));
    }

    #[test]
    fn test_redefine_respects_configurability() {
        let registry = LiveTableRegistry::new();
        let table = MemberTable::new();
        table.define("open", MemberSlot::data(Value::Null));
        table.define("locked", MemberSlot::data(Value::Null).sealed());
        let surface = TargetSurface::new("Element", table);

        assert_eq!(
            registry.redefine(&surface, "open", MemberSlot::data(Value::from(1))),
            Mutation::Applied
        );
        assert_eq!(
            registry.redefine(&surface, "locked", MemberSlot::data(Value::from(1))),
            Mutation::Refused
        );
    }
}
