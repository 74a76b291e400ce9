// src/registry/mod.rs
//! Surface reflection layer
//!
//! Models the host's reflective view of the types being instrumented:
//!
//! - **descriptor**: Member descriptors, probe and mutation outcomes
//! - **member_table**: Live member tables, target surfaces, instances
//! - **capability**: The registry trait the engine reflects through
//!
//! The engine (see `crate::engine`) is written entirely against
//! `CapabilityRegistry`, never against member tables directly.

pub mod capability;
pub mod descriptor;
pub mod member_table;

pub use capability::{CapabilityRegistry, LiveTableRegistry};
pub use descriptor::{CallFn, GetFn, MemberKind, MemberSlot, MemberValue, Mutation, Probe, SetFn};
pub use member_table::{Instance, MemberTable, TargetSurface};
