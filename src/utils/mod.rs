// src/utils/mod.rs
//! Common utilities
//!
//! - **errors**: Engine-wide error taxonomy and `Result` alias
//! - **config**: File/environment configuration loading

pub mod config;
pub mod errors;

pub use config::EngineConfig;
pub use errors::{EngineError, Result};
