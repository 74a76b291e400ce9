// src/utils/config.rs
//! Engine configuration
//!
//! Report and batch settings, loadable from an optional `sentinel.*` file
//! plus `SENTINEL_`-prefixed environment overrides
//! (e.g. `SENTINEL_REPORT__LOUD=true`). Everything defaults to disabled,
//! so a missing file is not an error.

use crate::report::location::validate_frame_offset;
use crate::report::session::ReportOptions;
use crate::utils::errors::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub report: ReportSettings,
    pub batch: BatchSettings,
}

/// Report-mode settings, the file/env mirror of `ReportOptions`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub loud: bool,
    pub debug_break: bool,
    pub property_only: bool,
    pub include_caller_location: bool,

    /// Raw, unvalidated: `report_options()` rejects negatives
    pub stack_frame_offset: Option<i64>,
}

/// Batch-report settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    pub enabled: bool,
    pub quiescence_ms: u64,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            quiescence_ms: 500,
        }
    }
}

impl EngineConfig {
    /// Load from `sentinel.*` in the working directory (if present) and
    /// `SENTINEL_` environment overrides.
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("sentinel").required(false))
            .add_source(config::Environment::with_prefix("SENTINEL").separator("__"))
            .build()?;
        let loaded: EngineConfig = settings.try_deserialize()?;
        debug!(?loaded, "configuration loaded");
        Ok(loaded)
    }

    /// Load from an explicit configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.to_path_buf()))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Validated `ReportOptions` for `ListenerSession::configure`.
    pub fn report_options(&self) -> Result<ReportOptions> {
        let stack_frame_offset = match self.report.stack_frame_offset {
            Some(raw) => Some(validate_frame_offset(raw)?),
            None => None,
        };
        Ok(ReportOptions {
            loud: self.report.loud,
            debug_break: self.report.debug_break,
            property_only: self.report.property_only,
            include_caller_location: self.report.include_caller_location,
            stack_frame_offset,
        })
    }

    pub fn quiescence(&self) -> Duration {
        Duration::from_millis(self.batch.quiescence_ms)
    }
}
