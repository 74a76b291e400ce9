// src/report/location.rs
//! Caller-location resolution
//!
//! Captures a fresh backtrace at the notification site and picks the line
//! at a configured offset, so the reported location belongs to the caller
//! of the intercepted member rather than to the shim. The offset is the
//! caller's responsibility: there is no automatic detection of how many
//! frames deep the engine is.

use crate::utils::errors::{EngineError, Result};
use std::backtrace::{Backtrace, BacktraceStatus};

/// Offset used when line numbers are enabled without an explicit offset.
/// Skips the resolver, the session dispatch and the shim frames.
pub const DEFAULT_FRAME_OFFSET: usize = 4;

/// Validate a caller-supplied frame offset before it is stored.
pub fn validate_frame_offset(offset: i64) -> Result<usize> {
    usize::try_from(offset).map_err(|_| {
        EngineError::Configuration(format!(
            "enabling caller locations requires a non-negative stack frame offset, got: {}",
            offset
        ))
    })
}

/// Resolve a human-readable location from a fresh stack capture.
///
/// Degrades to `None` rather than failing when backtraces are unsupported
/// on the platform or the offset points past the end of the trace.
pub fn resolve_caller_location(frame_offset: usize) -> Option<String> {
    // force_capture populates regardless of RUST_BACKTRACE
    let trace = Backtrace::force_capture();
    if !matches!(trace.status(), BacktraceStatus::Captured) {
        return None;
    }
    let rendered = trace.to_string();
    let line = rendered.lines().nth(frame_offset)?.trim();
    if line.is_empty() {
        return None;
    }
    // drop the frame index prefix ("  4: path::to::fn" -> "path::to::fn")
    let location = match line.split_once(": ") {
        Some((index, rest)) if index.chars().all(|c| c.is_ascii_digit()) => rest,
        _ => line,
    };
    Some(location.to_string())
}
