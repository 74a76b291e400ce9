// src/report/session.rs
//! Listener session and suppression window
//!
//! Holds the one mutable piece of reporting state: the active sink. Every
//! installed shim funnels through `notify`, which formats the message and
//! dispatches according to the configured report mode.
//!
//! The engine's own member touches (snapshotting, patching, restoring) run
//! inside a `QuietGuard`. While any guard is alive, notifications are
//! dropped on the no-op path, which is what keeps the engine from
//! notifying about itself and looping. Guards are depth-counted, released
//! on drop, and must never be held across a call into arbitrary external
//! code.

use crate::report::location::{resolve_caller_location, DEFAULT_FRAME_OFFSET};
use crate::utils::errors::{EngineError, Result};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Message prefix for the default (non-property-only) report format.
pub const DETECTION_PREFIX: &str = "Detected manipulation of instrumented API: ";

/// A notification sink. Receives one structured payload per detected touch.
pub type Sink = Arc<dyn Fn(&Notification) + Send + Sync>;

/// Payload delivered to the sink for every externally originated access.
#[derive(Clone, Debug, Serialize)]
pub struct Notification {
    /// Pre-formatted message per the configured options
    pub description: String,

    /// Bare member name; accessor touches are tagged `get:` / `set:`
    pub member_name: String,

    /// Resolved caller location, when enabled
    pub location: Option<String>,

    /// Wall-clock time of the detection
    pub observed_at: DateTime<Utc>,
}

/// Report-mode configuration. Total: unset options default to disabled.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportOptions {
    /// Raise a `PolicyViolation` instead of reporting to the sink. The
    /// error propagates to the caller of the intercepted member.
    pub loud: bool,

    /// Pause execution for interactive inspection instead of reporting
    pub debug_break: bool,

    /// Report only the member name, without the descriptive prefix
    pub property_only: bool,

    /// Attach a resolved caller source location to each notification
    pub include_caller_location: bool,

    /// Stack frame to report as the caller; defaults when unset
    pub stack_frame_offset: Option<usize>,
}

struct SessionState {
    sink: Sink,
    options: ReportOptions,
}

/// Process-wide reporting state shared by every shim of a session.
pub struct ListenerSession {
    state: Mutex<SessionState>,
    suppress_depth: AtomicUsize,
}

impl Default for ListenerSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ListenerSession {
    /// A session starts with the harmless default reporter installed.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SessionState {
                sink: default_reporter(),
                options: ReportOptions::default(),
            }),
            suppress_depth: AtomicUsize::new(0),
        }
    }

    /// Install a new active sink. `None` retains the current sink; this is
    /// a harmless no-op, not an error.
    pub fn set_active_sink(&self, candidate: Option<Sink>) {
        if let Some(sink) = candidate {
            self.state.lock().sink = sink;
        }
    }

    /// Reset the sink to the default reporter.
    pub fn reset_sink(&self) {
        self.state.lock().sink = default_reporter();
    }

    pub fn configure(&self, options: ReportOptions) {
        self.state.lock().options = options;
    }

    pub fn options(&self) -> ReportOptions {
        self.state.lock().options
    }

    /// Open a suppression window. Notifications raised while the guard is
    /// alive are dropped.
    pub fn quiet(&self) -> QuietGuard<'_> {
        self.suppress_depth.fetch_add(1, Ordering::SeqCst);
        QuietGuard { session: self }
    }

    pub fn suppressed(&self) -> bool {
        self.suppress_depth.load(Ordering::SeqCst) > 0
    }

    /// Single entry point for every installed shim.
    pub fn notify(&self, member: &str) -> Result<()> {
        if self.suppressed() {
            return Ok(());
        }

        // Snapshot state and release the lock before running anything that
        // could call back into the session.
        let (sink, options) = {
            let state = self.state.lock();
            (state.sink.clone(), state.options)
        };

        let location = if options.include_caller_location {
            resolve_caller_location(options.stack_frame_offset.unwrap_or(DEFAULT_FRAME_OFFSET))
        } else {
            None
        };

        let mut description = if options.property_only {
            member.to_string()
        } else {
            format!("{}{}", DETECTION_PREFIX, member)
        };
        if let Some(loc) = &location {
            description.push(' ');
            description.push_str(loc);
        }

        if options.loud {
            return Err(EngineError::PolicyViolation(description));
        }

        if options.debug_break {
            debug_break(&description);
            return Ok(());
        }

        sink(&Notification {
            description,
            member_name: member.to_string(),
            location,
            observed_at: Utc::now(),
        });
        Ok(())
    }
}

/// RAII suppression window. Dropping the guard reopens reporting.
pub struct QuietGuard<'a> {
    session: &'a ListenerSession,
}

impl Drop for QuietGuard<'_> {
    fn drop(&mut self) {
        self.session.suppress_depth.fetch_sub(1, Ordering::SeqCst);
    }
}

/// The console-style reporter used when no sink has been supplied.
pub fn default_reporter() -> Sink {
    Arc::new(|notification: &Notification| {
        warn!(member = %notification.member_name, "{}", notification.description);
    })
}

static NOOP_SINK: Lazy<Sink> = Lazy::new(|| Arc::new(|_: &Notification| {}));

/// The constant no-op sink: always harmless, for callers that want
/// detection side effects (loud mode, debug break) without any reporting.
pub fn noop_sink() -> Sink {
    NOOP_SINK.clone()
}

#[cfg(unix)]
fn debug_break(description: &str) {
    use nix::sys::signal::{raise, Signal};
    warn!("{} (pausing for debugger)", description);
    if let Err(errno) = raise(Signal::SIGTRAP) {
        warn!("failed to raise SIGTRAP for debug break: {}", errno);
    }
}

#[cfg(not(unix))]
fn debug_break(description: &str) {
    warn!("{} (debug break not supported on this platform)", description);
}
