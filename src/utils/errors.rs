// src/utils/errors.rs
//! Engine-wide error types
//!
//! Two kinds of failure cross the engine boundary:
//!
//! - `Configuration`: the caller supplied an invalid argument (missing
//!   surface name, out-of-range stack frame offset). Raised synchronously,
//!   never swallowed.
//! - `PolicyViolation`: the condition the engine exists to detect. Only
//!   raised in loud report mode, in which case it propagates to the caller
//!   of the intercepted member.
//!
//! Reflection-access failures never appear here: a member the host refuses
//! to describe or redefine is a skip outcome (`Probe::Unreadable`), not an
//! error.

use thiserror::Error;

/// Errors surfaced by the interception engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// Invalid caller-supplied argument or option
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A policy violation escalated by loud report mode.
    /// The message is exactly the text the sink would have received.
    #[error("{0}")]
    PolicyViolation(String),

    /// Configuration source could not be read or deserialized
    #[error("configuration source error: {0}")]
    Config(#[from] config::ConfigError),
}

/// Engine result alias
pub type Result<T> = std::result::Result<T, EngineError>;
