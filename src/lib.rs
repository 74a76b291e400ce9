// src/lib.rs
//! Surface Sentinel Interception Engine
//!
//! An in-process interception layer that detects and reports calls made
//! against a set of host-provided object surfaces, so an application can
//! enforce an architectural policy ("do not touch these APIs from this
//! layer"). Member tables are patched in place with notifying shims and
//! restored bit-for-bit on stop; the instrumentation itself never throws,
//! loops or leaks state.
//!
//! # Architecture
//!
//! The engine is structured into several key modules:
//!
//! - **registry**: Member descriptors, live member tables, and the
//!   capability-registry trait the engine reflects through
//! - **engine**: Snapshot capture, shim patching, restoration, and the
//!   `start`/`stop` facade
//! - **report**: Listener session, suppression windows, caller-location
//!   resolution, and optional batch reporting
//! - **utils**: Error taxonomy and configuration loading
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use surface_sentinel::{
//!     Instance, Interceptor, MemberSlot, MemberTable, Notification, ReportOptions, Sink,
//!     TargetSurface,
//! };
//!
//! let element = MemberTable::new();
//! element.define(
//!     "append_child",
//!     MemberSlot::method(Arc::new(|_, _| Ok(serde_json::Value::Null))),
//! );
//!
//! let mut interceptor = Interceptor::with_live_tables();
//! interceptor.register_surface(TargetSurface::new("Element", element.clone()));
//!
//! let sink: Sink = Arc::new(|n: &Notification| eprintln!("{}", n.description));
//! interceptor.start(Some(sink), ReportOptions::default()).unwrap();
//!
//! let instance = Instance::of_table(element);
//! instance.call("append_child", &[]).unwrap(); // reported
//!
//! interceptor.stop().unwrap();
//! instance.call("append_child", &[]).unwrap(); // silent again
//! ```

// Public module exports
pub mod engine;
pub mod registry;
pub mod report;
pub mod utils;

// Re-export commonly used types
pub use engine::interceptor::Interceptor;
pub use engine::snapshot::{SnapshotStore, SurfaceSnapshot};
pub use engine::{patch_surface, unpatch_surface};
pub use registry::{
    CallFn, CapabilityRegistry, GetFn, Instance, LiveTableRegistry, MemberKind, MemberSlot,
    MemberTable, MemberValue, Mutation, Probe, SetFn, TargetSurface,
};
pub use report::{
    default_reporter, noop_sink, BatchSink, ListenerSession, Notification, QuietGuard,
    ReportOptions, Sink, DETECTION_PREFIX,
};
pub use utils::config::EngineConfig;
pub use utils::errors::{EngineError, Result};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const GIT_HASH: &str = env!("GIT_HASH");

/// Engine build information
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub build_timestamp: &'static str,
    pub rustc_version: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            version: VERSION,
            git_hash: GIT_HASH,
            build_timestamp: env!("BUILD_TIMESTAMP"),
            rustc_version: env!("RUSTC_VERSION"),
        }
    }
}
