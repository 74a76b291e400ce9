// src/registry/member_table.rs
//! Live member tables, surfaces and instances
//!
//! A `MemberTable` is the shared, process-wide member table a surface's
//! instances dispatch through — the analogue of a prototype. Mutating it
//! affects every existing and future instance of that surface at once,
//! which is exactly the property the patcher relies on.
//!
//! `Instance` carries per-instance field storage; its method calls and
//! accessor gets/sets always resolve through the table at invocation time,
//! so a shim installed after the instance was created is still observed.

use crate::registry::descriptor::{MemberKind, MemberSlot, MemberValue};
use crate::utils::errors::{EngineError, Result};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Shared member table for one surface
#[derive(Default)]
pub struct MemberTable {
    // BTreeMap keeps enumeration deterministic
    slots: RwLock<BTreeMap<String, MemberSlot>>,
}

impl MemberTable {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Define (or replace) a member unconditionally. Host-side setup only;
    /// the engine goes through `redefine`/`write_value`, which honor flags.
    pub fn define(&self, name: impl Into<String>, slot: MemberSlot) {
        self.slots.write().insert(name.into(), slot);
    }

    /// All own member names, in enumeration order.
    pub fn names(&self) -> Vec<String> {
        self.slots.read().keys().cloned().collect()
    }

    /// Clone out the descriptor for one member.
    pub fn describe(&self, name: &str) -> Option<MemberSlot> {
        self.slots.read().get(name).cloned()
    }

    /// Replace a member through the descriptor path. Refused when the
    /// current slot is non-configurable or the member does not exist.
    pub fn redefine(&self, name: &str, slot: MemberSlot) -> bool {
        let mut slots = self.slots.write();
        match slots.get(name) {
            Some(current) if current.configurable => {
                slots.insert(name.to_string(), slot);
                true
            }
            _ => false,
        }
    }

    /// Replace a data member's value through the plain-write path. Refused
    /// for accessors, non-writable data and missing members.
    pub fn write_value(&self, name: &str, value: MemberValue) -> bool {
        let mut slots = self.slots.write();
        match slots.get_mut(name) {
            Some(slot) => match &mut slot.kind {
                MemberKind::Data {
                    value: current,
                    writable: true,
                } => {
                    *current = value;
                    true
                }
                _ => false,
            },
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.read().len()
    }
}

/// One host type to be instrumented: a stable name plus a handle to the
/// live member table. Supplied by the caller; the engine only references it.
#[derive(Clone)]
pub struct TargetSurface {
    pub name: String,
    pub handle: Arc<MemberTable>,
}

impl TargetSurface {
    pub fn new(name: impl Into<String>, handle: Arc<MemberTable>) -> Self {
        Self {
            name: name.into(),
            handle,
        }
    }
}

/// An object of a surface type. Dispatches through the surface's live
/// member table and owns its field values.
pub struct Instance {
    table: Arc<MemberTable>,
    fields: RwLock<HashMap<String, Value>>,
}

impl Instance {
    pub fn new(surface: &TargetSurface) -> Self {
        Self::of_table(surface.handle.clone())
    }

    pub fn of_table(table: Arc<MemberTable>) -> Self {
        Self {
            table,
            fields: RwLock::new(HashMap::new()),
        }
    }

    /// Invoke a callable member with this instance as the receiver.
    pub fn call(&self, member: &str, args: &[Value]) -> Result<Value> {
        let slot = self.table.describe(member).ok_or_else(|| {
            EngineError::Configuration(format!("no member named `{}` on this surface", member))
        })?;
        match slot.kind {
            MemberKind::Data {
                value: MemberValue::Callable(call),
                ..
            } => call(self, args),
            _ => Err(EngineError::Configuration(format!(
                "member `{}` is not callable",
                member
            ))),
        }
    }

    /// Read a member: accessor slots run their getter, plain data slots
    /// yield their value.
    pub fn get(&self, member: &str) -> Result<Value> {
        let slot = self.table.describe(member).ok_or_else(|| {
            EngineError::Configuration(format!("no member named `{}` on this surface", member))
        })?;
        match slot.kind {
            MemberKind::Accessor { get: Some(get), .. } => get(self),
            MemberKind::Accessor { get: None, .. } => Ok(Value::Null),
            MemberKind::Data {
                value: MemberValue::Plain(value),
                ..
            } => Ok(value),
            MemberKind::Data {
                value: MemberValue::Callable(_),
                ..
            } => Err(EngineError::Configuration(format!(
                "member `{}` is callable; invoke it with call()",
                member
            ))),
        }
    }

    /// Write a member: accessor slots run their setter, writable plain data
    /// slots store the value directly.
    pub fn set(&self, member: &str, value: Value) -> Result<()> {
        let slot = self.table.describe(member).ok_or_else(|| {
            EngineError::Configuration(format!("no member named `{}` on this surface", member))
        })?;
        match slot.kind {
            MemberKind::Accessor { set: Some(set), .. } => set(self, value),
            MemberKind::Accessor { set: None, .. } => Err(EngineError::Configuration(format!(
                "member `{}` has no setter",
                member
            ))),
            MemberKind::Data {
                value: MemberValue::Plain(_),
                writable: true,
            } => {
                self.table.write_value(member, MemberValue::Plain(value));
                Ok(())
            }
            _ => Err(EngineError::Configuration(format!(
                "member `{}` is not writable",
                member
            ))),
        }
    }

    /// Per-instance field storage, used by accessor implementations.
    pub fn field(&self, name: &str) -> Option<Value> {
        self.fields.read().get(name).cloned()
    }

    pub fn set_field(&self, name: impl Into<String>, value: Value) {
        self.fields.write().insert(name.into(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::descriptor::{CallFn, GetFn, SetFn};

    fn echo_method() -> CallFn {
        Arc::new(|_, args| Ok(args.first().cloned().unwrap_or(Value::Null)))
    }

    fn field_accessor(field: &'static str) -> (GetFn, SetFn) {
        let get: GetFn = Arc::new(move |recv| Ok(recv.field(field).unwrap_or(Value::Null)));
        let set: SetFn = Arc::new(move |recv, value| {
            recv.set_field(field, value);
            Ok(())
        });
        (get, set)
    }

    #[test]
    fn test_names_in_deterministic_order() {
        let table = MemberTable::new();
        table.define("z_last", MemberSlot::data(Value::Null));
        table.define("a_first", MemberSlot::data(Value::Null));
        assert_eq!(table.names(), vec!["a_first", "z_last"]);
    }

    #[test]
    fn test_call_dispatches_through_table() {
        let table = MemberTable::new();
        table.define("echo", MemberSlot::method(echo_method()));
        let surface = TargetSurface::new("Element", table);
        let instance = Instance::new(&surface);
        let out = instance.call("echo", &[Value::from(42)]).unwrap();
        assert_eq!(out, Value::from(42));
    }

    #[test]
    fn test_call_missing_member_is_configuration_error() {
        let table = MemberTable::new();
        let instance = Instance::of_table(table);
        assert!(matches!(
            instance.call("nope", &[]),
            Err(EngineError::Configuration(_))
        ));
    }

    #[test]
    fn test_accessor_round_trip_through_fields() {
        let table = MemberTable::new();
        let (get, set) = field_accessor("inner_html");
        table.define("inner_html", MemberSlot::accessor(Some(get), Some(set)));
        let instance = Instance::of_table(table);

        assert_eq!(instance.get("inner_html").unwrap(), Value::Null);
        instance.set("inner_html", Value::from("new value")).unwrap();
        assert_eq!(instance.get("inner_html").unwrap(), Value::from("new value"));
    }

    #[test]
    fn test_redefine_refused_on_sealed_slot() {
        let table = MemberTable::new();
        table.define("locked", MemberSlot::method(echo_method()).sealed());
        assert!(!table.redefine("locked", MemberSlot::data(Value::Null)));
    }

    #[test]
    fn test_write_value_refused_on_frozen_slot() {
        let table = MemberTable::new();
        table.define("frozen", MemberSlot::data(Value::from(1)).frozen());
        assert!(!table.write_value("frozen", MemberValue::Plain(Value::from(2))));
    }

    #[test]
    fn test_plain_data_set_updates_table() {
        let table = MemberTable::new();
        table.define("title", MemberSlot::data(Value::from("old")));
        let instance = Instance::of_table(table.clone());
        instance.set("title", Value::from("new")).unwrap();
        // the write is global: a second instance observes it
        let other = Instance::of_table(table);
        assert_eq!(other.get("title").unwrap(), Value::from("new"));
    }
}
