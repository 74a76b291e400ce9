// src/engine/mod.rs
//! Interception engine
//!
//! Capture, patch and restore over the capability registry:
//!
//! - **snapshot**: Pre-patch descriptor store, the restorer's source of truth
//! - **patcher**: Shim construction and installation per member shape
//! - **restorer**: Best-effort restoration back to the snapshot
//! - **interceptor**: The `start`/`stop` facade sequencing all of the above
//!
//! Engine-internal member touches all run inside a suppression window; the
//! only errors that escape are caller configuration mistakes and, in loud
//! mode, the policy violations the engine exists to detect.

pub mod interceptor;
pub mod patcher;
pub mod restorer;
pub mod snapshot;

pub use interceptor::Interceptor;
pub use patcher::patch_surface;
pub use restorer::unpatch_surface;
pub use snapshot::{SnapshotStore, SurfaceSnapshot};
