//! Error types
//!
//! Gameplay mistakes (wrong cell, wrong order) are not errors; they are a
//! normal transition to [`SessionStatus::Failed`](crate::sim::SessionStatus).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GameError {
    /// Pattern length outside `1..=grid_size`
    #[error("Invalid pattern length {length} for a grid of {grid_size} cells")]
    InvalidLength { length: usize, grid_size: usize },
    /// Pattern built from an explicit order that is empty, repeats a cell or leaves the grid
    #[error("Invalid reveal order: {0}")]
    InvalidOrder(String),
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
    #[error("Malformed settings JSON")]
    SettingsParse(#[from] serde_json::Error),
    #[error("Could not read settings file")]
    SettingsIo(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GameError>;
