//! Game settings
//!
//! Loaded from an optional JSON file. Every field falls back to its default
//! when omitted.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{GameError, Result};
use crate::sim::RevealTiming;

/// Tunables for a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Gap between successive reveals (ms)
    pub reveal_interval_ms: u64,
    /// Extra time the last revealed cell stays lit before the board hides (ms)
    pub hold_after_last_ms: u64,
    /// Number of cells on the board
    pub grid_size: usize,
    /// Pattern length of the first round
    pub initial_pattern_length: usize,
    /// Fixed RNG seed; a random one is drawn when absent
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reveal_interval_ms: REVEAL_INTERVAL_MS,
            hold_after_last_ms: HOLD_AFTER_LAST_MS,
            grid_size: GRID_SIZE,
            initial_pattern_length: INITIAL_PATTERN_LENGTH,
            seed: None,
        }
    }
}

impl Settings {
    /// Default settings with a fixed seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.grid_size == 0 {
            return Err(GameError::InvalidSettings("grid_size must be at least 1".into()));
        }
        if self.initial_pattern_length == 0 || self.initial_pattern_length > self.grid_size {
            return Err(GameError::InvalidSettings(format!(
                "initial_pattern_length must be within 1..={}, got {}",
                self.grid_size, self.initial_pattern_length
            )));
        }
        if self.reveal_interval_ms == 0 {
            return Err(GameError::InvalidSettings(
                "reveal_interval_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Parse and validate settings from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file, using defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(json) => {
                let settings = Self::from_json(&json)?;
                log::info!("Loaded settings from {}", path.display());
                Ok(settings)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No settings at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn timing(&self) -> RevealTiming {
        RevealTiming {
            interval_ms: self.reveal_interval_ms,
            hold_ms: self.hold_after_last_ms,
        }
    }

    /// Time from round start until the board hides for a pattern of `len` cells
    pub fn reveal_duration_ms(&self, len: usize) -> u64 {
        self.timing().hide_at(len)
    }
}
