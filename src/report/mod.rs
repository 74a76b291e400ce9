// src/report/mod.rs
//! Notification reporting layer
//!
//! - **session**: Listener session, report options, suppression guard
//! - **location**: Caller source-location resolution from stack captures
//! - **batch**: Optional quiescence-delayed aggregated reporting
//!
//! Every shim the patcher installs reports through exactly one entry
//! point, `ListenerSession::notify`.

pub mod batch;
pub mod location;
pub mod session;

pub use batch::BatchSink;
pub use location::{resolve_caller_location, validate_frame_offset, DEFAULT_FRAME_OFFSET};
pub use session::{
    default_reporter, noop_sink, ListenerSession, Notification, QuietGuard, ReportOptions, Sink,
    DETECTION_PREFIX,
};
