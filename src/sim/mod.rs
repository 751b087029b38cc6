//! Deterministic game core
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Simulated clock only, advanced explicitly by the host
//! - Seeded RNG only
//! - Cancel pending cues before scheduling new ones
//! - No rendering or platform dependencies

pub mod pattern;
pub mod round;
pub mod scheduler;
pub mod session;

pub use pattern::{Pattern, PatternSource, RandomPatterns, ScriptedPatterns, generate};
pub use round::{CueKind, RevealTiming, RoundClick, RoundController, RoundPhase, ScheduledCue};
pub use scheduler::{Scheduler, TimerHandle, TimerQueue};
pub use session::{ClickOutcome, GameSession, SessionEvent, SessionSnapshot, SessionStatus};
