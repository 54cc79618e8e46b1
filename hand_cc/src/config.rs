//! Application configuration — one TOML file for the whole pipeline.
//!
//! ```toml
//! preset = "hand"        # channel tables used when [engine]/[bus] are absent
//! port = "PythonMIDI"    # or "auto"
//! queue_capacity = 4
//!
//! [bus]
//! midi_channel = 0
//! [bus.controls]
//! palm_height = 1
//! ```

use std::path::Path;

use cc_bus::{PortSelector, WireMap};
use cc_engine::EngineConfig;
use serde::Deserialize;

use crate::app::AppError;

pub const DEFAULT_PRESET:         &str  = "gestures";
pub const DEFAULT_QUEUE_CAPACITY: usize = 4;

/// Configuration for the full application.
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub engine:         EngineConfig,
    pub wire:           WireMap,
    pub port:           PortSelector,
    /// Frames allowed to queue between the source and the engine.
    pub queue_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            engine:         EngineConfig::gestures(),
            wire:           WireMap::gestures(),
            port:           PortSelector::Auto,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// On-disk shape.  Everything is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    preset:         Option<String>,
    port:           Option<String>,
    queue_capacity: Option<usize>,
    engine:         Option<EngineConfig>,
    bus:            Option<WireMap>,
}

impl AppConfig {
    /// Engine and wire tables from a named preset (`gestures` or `hand`).
    pub fn preset(name: &str) -> Result<Self, AppError> {
        match (EngineConfig::preset(name), WireMap::preset(name)) {
            (Some(engine), Some(wire)) => Ok(AppConfig { engine, wire, ..AppConfig::default() }),
            _ => Err(AppError::UnknownPreset(name.to_string())),
        }
    }

    pub fn from_toml(s: &str) -> Result<Self, AppError> {
        let file: ConfigFile = toml::from_str(s)?;
        let base = AppConfig::preset(file.preset.as_deref().unwrap_or(DEFAULT_PRESET))?;
        Ok(AppConfig {
            engine:         file.engine.unwrap_or(base.engine),
            wire:           file.bus.unwrap_or(base.wire),
            port:           file.port.map(|p| PortSelector::parse(&p)).unwrap_or(base.port),
            queue_capacity: file.queue_capacity.unwrap_or(base.queue_capacity).max(1),
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| AppError::ConfigRead { path: path.display().to_string(), source })?;
        AppConfig::from_toml(&text)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
