//! Round controller
//!
//! Owns the visual grid and the player's progress for one round. Reveal and
//! hide effects are handed to a [`Scheduler`] as [`ScheduledCue`] values and
//! applied when the host feeds them back through [`RoundController::apply`].
//!
//! Every cue is stamped with the round generation it was issued for. Any
//! transition that ends a round's active window cancels the scheduler and
//! bumps the generation, so a cue that slips through is dropped on apply.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::pattern::{Pattern, PatternSource};
use super::scheduler::Scheduler;
use crate::error::Result;

/// Round lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// No round running
    Idle,
    /// Choreography being scheduled (transient, input opens right after)
    Revealing,
    /// Accepting clicks; reveals may still be animating
    AwaitingInput,
    /// Every cell was clicked in order
    Complete,
    /// Wrong cell or wrong order
    Failed,
}

impl RoundPhase {
    pub fn accepts_input(self) -> bool {
        matches!(self, RoundPhase::Revealing | RoundPhase::AwaitingInput)
    }
}

/// Grid effect carried by a scheduled cue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CueKind {
    Reveal(usize),
    HideAll,
}

/// Deferred grid mutation, tagged with the round it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledCue {
    pub generation: u64,
    pub kind: CueKind,
}

/// Reveal choreography timing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealTiming {
    /// Gap between successive reveals
    pub interval_ms: u64,
    /// How long the last revealed cell stays up before the board hides
    pub hold_ms: u64,
}

impl RevealTiming {
    /// Delay of the `step`-th reveal (0-indexed)
    pub fn reveal_at(&self, step: usize) -> u64 {
        step as u64 * self.interval_ms
    }

    /// Delay of the hide-all for a pattern of `len` cells
    pub fn hide_at(&self, len: usize) -> u64 {
        self.reveal_at(len.saturating_sub(1)) + self.hold_ms
    }
}

/// Result of feeding one click to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundClick {
    /// Round not accepting input, cell already revealed, or cell off the grid
    Ignored,
    /// Correct cell, round still running
    Correct { progress: usize },
    /// Correct cell and it was the last one
    Completed,
    /// Wrong cell or wrong order; `expected` is `None` if the queue was empty
    Mismatch { expected: Option<usize> },
}

#[derive(Debug, Clone)]
pub struct RoundController {
    timing: RevealTiming,
    grid: Vec<bool>,
    pattern: Option<Pattern>,
    expected: VecDeque<usize>,
    progress: usize,
    phase: RoundPhase,
    generation: u64,
    /// Cues of the current generation not yet applied
    cues_pending: usize,
}

impl RoundController {
    pub fn new(grid_size: usize, timing: RevealTiming) -> Self {
        Self {
            timing,
            grid: vec![false; grid_size],
            pattern: None,
            expected: VecDeque::new(),
            progress: 0,
            phase: RoundPhase::Idle,
            generation: 0,
            cues_pending: 0,
        }
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn grid(&self) -> &[bool] {
        &self.grid
    }

    pub fn grid_size(&self) -> usize {
        self.grid.len()
    }

    pub fn progress(&self) -> usize {
        self.progress
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn timing(&self) -> RevealTiming {
        self.timing
    }

    /// Pattern of the running round
    pub fn pattern(&self) -> Option<&Pattern> {
        self.pattern.as_ref()
    }

    /// Cells still to be clicked, front first
    pub fn expected(&self) -> impl Iterator<Item = usize> + '_ {
        self.expected.iter().copied()
    }

    /// True while the reveal/hide choreography of the current round is still queued
    pub fn is_revealing(&self) -> bool {
        self.phase.accepts_input() && self.cues_pending > 0
    }

    /// Begin a round with a fresh pattern of `length` cells
    pub fn start_round<P, S>(&mut self, length: usize, patterns: &mut P, scheduler: &mut S) -> Result<()>
    where
        P: PatternSource + ?Sized,
        S: Scheduler<ScheduledCue> + ?Sized,
    {
        self.invalidate(scheduler);

        let pattern = patterns.next_pattern(length, self.grid.len())?;
        self.grid.fill(false);
        self.expected = pattern.expected_queue();
        self.progress = 0;
        self.phase = RoundPhase::Revealing;

        for (step, &cell) in pattern.order().iter().enumerate() {
            self.push_cue(scheduler, self.timing.reveal_at(step), CueKind::Reveal(cell));
        }
        self.push_cue(scheduler, self.timing.hide_at(pattern.len()), CueKind::HideAll);

        log::debug!(
            "Round generation {} scheduled {} reveals, board hides at {}ms",
            self.generation,
            pattern.len(),
            self.timing.hide_at(pattern.len())
        );

        self.pattern = Some(pattern);
        self.phase = RoundPhase::AwaitingInput;
        Ok(())
    }

    /// Validate a click against the expected order
    pub fn click<S>(&mut self, cell: usize, scheduler: &mut S) -> RoundClick
    where
        S: Scheduler<ScheduledCue> + ?Sized,
    {
        if !self.phase.accepts_input() {
            return RoundClick::Ignored;
        }
        let Some(&revealed) = self.grid.get(cell) else {
            log::warn!("Click on cell {} outside a grid of {}", cell, self.grid.len());
            return RoundClick::Ignored;
        };
        if revealed {
            return RoundClick::Ignored;
        }

        self.grid[cell] = true;
        let expected = self.expected.pop_front();
        let selected = self.pattern.as_ref().is_some_and(|p| p.contains(cell));

        if !selected || expected != Some(cell) {
            // Leave the board as drawn so the mistake stays visible
            self.invalidate(scheduler);
            self.phase = RoundPhase::Failed;
            return RoundClick::Mismatch { expected };
        }

        self.progress += 1;
        if self.progress == self.expected_len() {
            self.invalidate(scheduler);
            self.phase = RoundPhase::Complete;
            RoundClick::Completed
        } else {
            RoundClick::Correct {
                progress: self.progress,
            }
        }
    }

    /// Apply a fired cue. Returns the effect if it belonged to the current round.
    pub fn apply(&mut self, cue: ScheduledCue) -> Option<CueKind> {
        if cue.generation != self.generation || !self.phase.accepts_input() {
            log::debug!(
                "Dropping stale cue {:?} from generation {} (current {})",
                cue.kind,
                cue.generation,
                self.generation
            );
            return None;
        }

        match cue.kind {
            CueKind::Reveal(cell) => {
                if let Some(slot) = self.grid.get_mut(cell) {
                    *slot = true;
                }
            }
            CueKind::HideAll => self.grid.fill(false),
        }
        self.cues_pending = self.cues_pending.saturating_sub(1);
        Some(cue.kind)
    }

    /// Cancel everything and return to an empty idle board
    pub fn reset<S>(&mut self, scheduler: &mut S)
    where
        S: Scheduler<ScheduledCue> + ?Sized,
    {
        self.invalidate(scheduler);
        self.grid.fill(false);
        self.pattern = None;
        self.expected.clear();
        self.progress = 0;
        self.phase = RoundPhase::Idle;
    }

    fn expected_len(&self) -> usize {
        self.pattern.as_ref().map_or(0, Pattern::len)
    }

    fn push_cue<S>(&mut self, scheduler: &mut S, delay_ms: u64, kind: CueKind)
    where
        S: Scheduler<ScheduledCue> + ?Sized,
    {
        scheduler.schedule(
            delay_ms,
            ScheduledCue {
                generation: self.generation,
                kind,
            },
        );
        self.cues_pending += 1;
    }

    /// Cancel before reschedule: nothing issued so far may touch the grid again
    fn invalidate<S>(&mut self, scheduler: &mut S)
    where
        S: Scheduler<ScheduledCue> + ?Sized,
    {
        scheduler.cancel_all();
        self.generation = self.generation.wrapping_add(1);
        self.cues_pending = 0;
    }
}
