// src/registry/descriptor.rs
//! Reflective member descriptors
//!
//! A member of a surface's member table is either a data slot (a plain
//! value or a callable) or an accessor slot (independent getter/setter).
//! Descriptors are what the snapshot store captures and what the patcher
//! redefines; callable identity is `Arc` identity, so a restored member is
//! the *same* callable that was captured, not a copy.
//!
//! Reading a descriptor can be refused by the host. That outcome is a
//! first-class `Probe::Unreadable`, never an error: an unreadable member is
//! skipped in both capture and patch.

use crate::registry::member_table::Instance;
use crate::utils::errors::Result;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// A callable data member: receives the dispatching instance and arguments.
pub type CallFn = Arc<dyn Fn(&Instance, &[Value]) -> Result<Value> + Send + Sync>;

/// An accessor getter.
pub type GetFn = Arc<dyn Fn(&Instance) -> Result<Value> + Send + Sync>;

/// An accessor setter.
pub type SetFn = Arc<dyn Fn(&Instance, Value) -> Result<()> + Send + Sync>;

/// The value held by a data slot
#[derive(Clone)]
pub enum MemberValue {
    /// An invokable member (a method)
    Callable(CallFn),

    /// A plain, non-invokable value
    Plain(Value),
}

impl MemberValue {
    pub fn is_callable(&self) -> bool {
        matches!(self, MemberValue::Callable(_))
    }
}

impl fmt::Debug for MemberValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberValue::Callable(_) => f.write_str("Callable(..)"),
            MemberValue::Plain(v) => write!(f, "Plain({})", v),
        }
    }
}

/// The shape of a member slot
#[derive(Clone)]
pub enum MemberKind {
    /// Data slot: a value plus its writability
    Data { value: MemberValue, writable: bool },

    /// Accessor slot: getter and setter carry separate identities
    Accessor {
        get: Option<GetFn>,
        set: Option<SetFn>,
    },
}

impl fmt::Debug for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Data { value, writable } => f
                .debug_struct("Data")
                .field("value", value)
                .field("writable", writable)
                .finish(),
            MemberKind::Accessor { get, set } => f
                .debug_struct("Accessor")
                .field("get", &get.is_some())
                .field("set", &set.is_some())
                .finish(),
        }
    }
}

/// Full reflective description of one member
#[derive(Clone, Debug)]
pub struct MemberSlot {
    pub kind: MemberKind,

    /// Whether the slot may be redefined through the descriptor path
    pub configurable: bool,

    /// Preserved across patching so the member's shape does not change
    pub enumerable: bool,
}

impl MemberSlot {
    /// A configurable, writable, enumerable callable data slot.
    pub fn method(call: CallFn) -> Self {
        Self {
            kind: MemberKind::Data {
                value: MemberValue::Callable(call),
                writable: true,
            },
            configurable: true,
            enumerable: true,
        }
    }

    /// A configurable, writable, enumerable plain data slot.
    pub fn data(value: Value) -> Self {
        Self {
            kind: MemberKind::Data {
                value: MemberValue::Plain(value),
                writable: true,
            },
            configurable: true,
            enumerable: true,
        }
    }

    /// A configurable, enumerable accessor slot.
    pub fn accessor(get: Option<GetFn>, set: Option<SetFn>) -> Self {
        Self {
            kind: MemberKind::Accessor { get, set },
            configurable: true,
            enumerable: true,
        }
    }

    /// Mark this slot non-configurable.
    pub fn sealed(mut self) -> Self {
        self.configurable = false;
        self
    }

    /// Mark a data slot non-writable.
    pub fn frozen(mut self) -> Self {
        if let MemberKind::Data { writable, .. } = &mut self.kind {
            *writable = false;
        }
        self
    }

    /// True when invoking, getting or setting this slot runs code.
    pub fn is_callable(&self) -> bool {
        match &self.kind {
            MemberKind::Data { value, .. } => value.is_callable(),
            MemberKind::Accessor { .. } => true,
        }
    }
}

/// Outcome of asking the host to describe a member
#[derive(Clone, Debug)]
pub enum Probe {
    /// The host produced a descriptor
    Described(MemberSlot),

    /// The host refused introspection; the member is skipped
    Unreadable,
}

impl Probe {
    pub fn described(self) -> Option<MemberSlot> {
        match self {
            Probe::Described(slot) => Some(slot),
            Probe::Unreadable => None,
        }
    }
}

/// Outcome of asking the host to mutate a member
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mutation {
    /// The member table was updated
    Applied,

    /// The host refused the mutation; the member is skipped
    Refused,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_call() -> CallFn {
        Arc::new(|_, _| Ok(Value::Null))
    }

    #[test]
    fn test_method_slot_is_callable() {
        let slot = MemberSlot::method(noop_call());
        assert!(slot.is_callable());
        assert!(slot.configurable);
        assert!(slot.enumerable);
    }

    #[test]
    fn test_plain_data_is_not_callable() {
        let slot = MemberSlot::data(Value::from("hello"));
        assert!(!slot.is_callable());
    }

    #[test]
    fn test_accessor_is_callable() {
        let slot = MemberSlot::accessor(Some(Arc::new(|_| Ok(Value::Null))), None);
        assert!(slot.is_callable());
    }

    #[test]
    fn test_sealed_and_frozen() {
        let slot = MemberSlot::method(noop_call()).sealed().frozen();
        assert!(!slot.configurable);
        assert!(matches!(
            slot.kind,
            MemberKind::Data {
                writable: false,
                ..
            }
        ));
    }

    #[test]
    fn test_probe_described() {
        assert!(Probe::Described(MemberSlot::data(Value::Null))
            .described()
            .is_some());
        assert!(Probe::Unreadable.described().is_none());
    }
}
