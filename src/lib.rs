//! Grid Recall - a "simulate the pattern" memory game on a 3x3 board
//!
//! Core modules:
//! - `sim`: Deterministic game core (scheduler, patterns, rounds, session)
//! - `settings`: Tunables loaded from JSON
//! - `error`: Error type shared by the crate
//!
//! Rendering and input devices live outside this crate. A presentation layer
//! calls [`GameSession::start`], [`GameSession::click`] and
//! [`GameSession::reset`], drives time with [`GameSession::tick`], and reads
//! back the grid, status and pattern length.

pub mod error;
pub mod settings;
pub mod sim;

pub use error::{GameError, Result};
pub use settings::Settings;
pub use sim::{ClickOutcome, GameSession, SessionEvent, SessionSnapshot, SessionStatus};

/// Game configuration defaults
pub mod consts {
    /// Gap between successive reveals (ms)
    pub const REVEAL_INTERVAL_MS: u64 = 500;
    /// Hold time after the last reveal before the board hides (ms)
    pub const HOLD_AFTER_LAST_MS: u64 = 600;
    /// Cells on the board (3x3)
    pub const GRID_SIZE: usize = 9;
    /// Board width in cells
    pub const GRID_COLUMNS: usize = 3;
    /// Pattern length of the first round
    pub const INITIAL_PATTERN_LENGTH: usize = 3;
}

/// Convert a cell index to `(row, column)` on a board `columns` wide
#[inline]
pub fn cell_to_row_col(cell: usize, columns: usize) -> (usize, usize) {
    (cell / columns, cell % columns)
}

/// Convert `(row, column)` to a cell index on a board `columns` wide
#[inline]
pub fn row_col_to_cell(row: usize, col: usize, columns: usize) -> usize {
    row * columns + col
}
