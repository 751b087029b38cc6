//! Game session
//!
//! Cross-round state: pattern length, status and round count. Drives the
//! [`RoundController`] from the first round until the board is full (win) or
//! the player slips (failure).

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::pattern::{Pattern, PatternSource, RandomPatterns};
use super::round::{CueKind, RoundClick, RoundController, ScheduledCue};
use super::scheduler::{Scheduler, TimerQueue};
use crate::error::Result;
use crate::settings::Settings;

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionStatus {
    #[default]
    NotStarted,
    InProgress,
    Won,
    Failed,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Won | SessionStatus::Failed)
    }

    /// Heading shown above the board
    pub fn title(self) -> &'static str {
        match self {
            SessionStatus::Won => "You Won",
            SessionStatus::Failed => "You Failed",
            SessionStatus::NotStarted | SessionStatus::InProgress => "Grid Matrix",
        }
    }
}

/// What a click did, from the presentation's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClickOutcome {
    /// No state change
    Ignored,
    Correct { progress: usize },
    /// Round finished and the next one (with `next_length` cells) has started
    RoundComplete { next_length: usize },
    Won,
    Failed {
        clicked: usize,
        expected: Option<usize>,
    },
}

/// Things that happened since the last drain, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    RoundStarted { round: u32, length: usize },
    CellRevealed { cell: usize },
    BoardHidden,
    CellClicked { cell: usize, correct: bool },
    Won { rounds: u32 },
    Failed { clicked: usize, expected: Option<usize> },
    Reset,
}

/// Read-only view for rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub pattern_length: usize,
    pub round: u32,
    pub progress: usize,
    pub grid: Vec<bool>,
    /// Reveal choreography still running
    pub revealing: bool,
}

pub struct GameSession<P = RandomPatterns, S = TimerQueue<ScheduledCue>> {
    settings: Settings,
    status: SessionStatus,
    pattern_length: usize,
    round: u32,
    controller: RoundController,
    patterns: P,
    scheduler: S,
    events: Vec<SessionEvent>,
}

impl GameSession {
    /// Session with a seeded RNG and the simulated clock.
    /// Uses `settings.seed` when set, otherwise draws a seed from the thread RNG.
    pub fn new(settings: Settings) -> Result<Self> {
        let seed = settings.seed.unwrap_or_else(|| rand::rng().random());
        log::info!("Session seed: {}", seed);
        Self::with_sources(settings, RandomPatterns::seeded(seed), TimerQueue::new())
    }
}

impl<P, S> GameSession<P, S>
where
    P: PatternSource,
    S: Scheduler<ScheduledCue>,
{
    pub fn with_sources(settings: Settings, patterns: P, scheduler: S) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            controller: RoundController::new(settings.grid_size, settings.timing()),
            pattern_length: settings.initial_pattern_length,
            settings,
            status: SessionStatus::NotStarted,
            round: 0,
            patterns,
            scheduler,
            events: Vec::new(),
        })
    }

    /// Begin the first round. Ignored unless the session is fresh (or was reset).
    pub fn start(&mut self) -> Result<()> {
        if self.status != SessionStatus::NotStarted {
            log::debug!("Start ignored, session is {:?}", self.status);
            return Ok(());
        }

        self.pattern_length = self.settings.initial_pattern_length;
        self.round = 0;
        self.begin_round()?;
        self.status = SessionStatus::InProgress;
        Ok(())
    }

    /// Cancel everything and return to the initial state
    pub fn reset(&mut self) {
        self.controller.reset(&mut self.scheduler);
        self.status = SessionStatus::NotStarted;
        self.pattern_length = self.settings.initial_pattern_length;
        self.round = 0;
        self.events.push(SessionEvent::Reset);
        log::info!("Session reset");
    }

    /// Player clicked `cell`
    pub fn click(&mut self, cell: usize) -> Result<ClickOutcome> {
        if self.status != SessionStatus::InProgress {
            return Ok(ClickOutcome::Ignored);
        }

        match self.controller.click(cell, &mut self.scheduler) {
            RoundClick::Ignored => Ok(ClickOutcome::Ignored),
            RoundClick::Correct { progress } => {
                self.events.push(SessionEvent::CellClicked { cell, correct: true });
                Ok(ClickOutcome::Correct { progress })
            }
            RoundClick::Mismatch { expected } => {
                self.events.push(SessionEvent::CellClicked { cell, correct: false });
                self.events.push(SessionEvent::Failed {
                    clicked: cell,
                    expected,
                });
                self.status = SessionStatus::Failed;
                log::info!(
                    "Failed in round {} (length {}): clicked {}, expected {:?}",
                    self.round,
                    self.pattern_length,
                    cell,
                    expected
                );
                Ok(ClickOutcome::Failed {
                    clicked: cell,
                    expected,
                })
            }
            RoundClick::Completed => {
                self.events.push(SessionEvent::CellClicked { cell, correct: true });
                self.complete_round()
            }
        }
    }

    /// Advance the clock by `dt_ms` and apply the reveal/hide cues that came due.
    /// Returns how many cues changed the grid.
    pub fn tick(&mut self, dt_ms: u64) -> usize {
        let mut applied = 0;
        for cue in self.scheduler.advance(dt_ms) {
            match self.controller.apply(cue) {
                Some(CueKind::Reveal(cell)) => {
                    self.events.push(SessionEvent::CellRevealed { cell });
                    applied += 1;
                }
                Some(CueKind::HideAll) => {
                    self.events.push(SessionEvent::BoardHidden);
                    applied += 1;
                }
                None => {}
            }
        }
        applied
    }

    /// Take all events recorded since the last call
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn pattern_length(&self) -> usize {
        self.pattern_length
    }

    /// One bool per cell, true when lit
    pub fn visual_grid(&self) -> &[bool] {
        self.controller.grid()
    }

    pub fn progress(&self) -> usize {
        self.controller.progress()
    }

    /// 1-based round number, 0 before the first start
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn is_revealing(&self) -> bool {
        self.controller.is_revealing()
    }

    /// Whether the Start button should be enabled
    pub fn can_start(&self) -> bool {
        self.status == SessionStatus::NotStarted
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn controller(&self) -> &RoundController {
        &self.controller
    }

    /// Pattern of the current round (debug/test aid; a UI should not show it)
    pub fn current_pattern(&self) -> Option<&Pattern> {
        self.controller.pattern()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            pattern_length: self.pattern_length,
            round: self.round,
            progress: self.progress(),
            grid: self.visual_grid().to_vec(),
            revealing: self.is_revealing(),
        }
    }

    fn begin_round(&mut self) -> Result<()> {
        self.controller
            .start_round(self.pattern_length, &mut self.patterns, &mut self.scheduler)?;
        self.round += 1;
        self.events.push(SessionEvent::RoundStarted {
            round: self.round,
            length: self.pattern_length,
        });
        log::info!("Round {} started with {} cells", self.round, self.pattern_length);
        Ok(())
    }

    fn complete_round(&mut self) -> Result<ClickOutcome> {
        if self.pattern_length >= self.settings.grid_size {
            self.status = SessionStatus::Won;
            self.events.push(SessionEvent::Won { rounds: self.round });
            log::info!("Won after {} rounds", self.round);
            return Ok(ClickOutcome::Won);
        }

        self.pattern_length += 1;
        self.begin_round()?;
        Ok(ClickOutcome::RoundComplete {
            next_length: self.pattern_length,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{GRID_SIZE, INITIAL_PATTERN_LENGTH};
    use crate::sim::pattern::ScriptedPatterns;
    use proptest::prelude::*;

    fn scripted(orders: Vec<Vec<usize>>) -> GameSession<ScriptedPatterns> {
        GameSession::with_sources(
            Settings::seeded(1),
            ScriptedPatterns::new(orders),
            TimerQueue::new(),
        )
        .unwrap()
    }

    /// Click through the current pattern in reveal order
    fn play_round<P: PatternSource>(session: &mut GameSession<P>) -> ClickOutcome {
        let order = session.current_pattern().unwrap().order().to_vec();
        let mut last = ClickOutcome::Ignored;
        for cell in order {
            last = session.click(cell).unwrap();
        }
        last
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = GameSession::new(Settings::seeded(5)).unwrap();
        assert_eq!(session.status(), SessionStatus::NotStarted);
        assert_eq!(session.pattern_length(), INITIAL_PATTERN_LENGTH);
        assert_eq!(session.visual_grid(), &[false; GRID_SIZE]);
        assert!(session.can_start());
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let settings = Settings {
            initial_pattern_length: 0,
            ..Settings::default()
        };
        assert!(GameSession::new(settings).is_err());
    }

    #[test]
    fn test_click_before_start_is_ignored() {
        let mut session = scripted(vec![vec![4, 1, 7]]);
        assert_eq!(session.click(4).unwrap(), ClickOutcome::Ignored);
        assert!(session.drain_events().is_empty());
    }

    #[test]
    fn test_scenario_correct_round_advances() {
        let mut session = scripted(vec![vec![4, 1, 7]]);
        session.start().unwrap();
        session.tick(5_000);

        assert_eq!(session.click(4).unwrap(), ClickOutcome::Correct { progress: 1 });
        assert_eq!(session.progress(), 1);
        assert_eq!(session.click(1).unwrap(), ClickOutcome::Correct { progress: 2 });
        assert_eq!(
            session.click(7).unwrap(),
            ClickOutcome::RoundComplete { next_length: 4 }
        );

        assert_eq!(session.status(), SessionStatus::InProgress);
        assert_eq!(session.pattern_length(), 4);
        assert_eq!(session.round(), 2);
        assert_eq!(session.progress(), 0);
        assert_eq!(session.current_pattern().unwrap().len(), 4);
        assert!(session.visual_grid().iter().all(|&c| !c));
        assert!(session.is_revealing());
    }

    #[test]
    fn test_scenario_wrong_first_click_fails() {
        let mut session = scripted(vec![vec![4, 1, 7]]);
        session.start().unwrap();
        session.tick(5_000);

        assert_eq!(
            session.click(1).unwrap(),
            ClickOutcome::Failed {
                clicked: 1,
                expected: Some(4)
            }
        );
        assert_eq!(session.status(), SessionStatus::Failed);
        assert_eq!(session.progress(), 0);
        assert_eq!(session.status().title(), "You Failed");

        // Locked out until reset
        assert_eq!(session.click(4).unwrap(), ClickOutcome::Ignored);
        assert_eq!(session.click(0).unwrap(), ClickOutcome::Ignored);
        assert!(session.visual_grid()[1]);
        assert!(!session.visual_grid()[4]);
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut session = scripted(vec![vec![4, 1, 7], vec![0, 1, 2]]);
        session.start().unwrap();
        session.start().unwrap();
        assert_eq!(session.round(), 1);
        assert_eq!(session.current_pattern().unwrap().order(), &[4, 1, 7]);
        assert!(!session.can_start());
    }

    #[test]
    fn test_start_after_failure_requires_reset() {
        let mut session = scripted(vec![vec![4, 1, 7], vec![0, 1, 2]]);
        session.start().unwrap();
        session.click(0).unwrap();
        session.start().unwrap();
        assert_eq!(session.status(), SessionStatus::Failed);

        session.reset();
        session.start().unwrap();
        assert_eq!(session.status(), SessionStatus::InProgress);
        assert_eq!(session.current_pattern().unwrap().order(), &[0, 1, 2]);
    }

    #[test]
    fn test_full_game_wins_at_grid_size() {
        let mut session = GameSession::new(Settings::seeded(11)).unwrap();
        session.start().unwrap();

        for length in INITIAL_PATTERN_LENGTH..GRID_SIZE {
            session.tick(10_000);
            assert_eq!(
                play_round(&mut session),
                ClickOutcome::RoundComplete {
                    next_length: length + 1
                }
            );
        }

        session.tick(10_000);
        assert_eq!(play_round(&mut session), ClickOutcome::Won);
        assert_eq!(session.status(), SessionStatus::Won);
        assert_eq!(session.pattern_length(), GRID_SIZE);
        assert_eq!(session.round(), 7);
        assert_eq!(session.status().title(), "You Won");
        assert_eq!(session.click(0).unwrap(), ClickOutcome::Ignored);
        assert_eq!(session.scheduler().pending_len(), 0);
    }

    #[test]
    fn test_win_freezes_board_even_mid_reveal() {
        let mut session = GameSession::new(Settings {
            initial_pattern_length: GRID_SIZE,
            ..Settings::seeded(3)
        })
        .unwrap();
        session.start().unwrap();

        // Speed-play before any reveal has fired
        assert_eq!(play_round(&mut session), ClickOutcome::Won);
        assert!(session.visual_grid().iter().all(|&c| c));

        session.tick(60_000);
        assert!(session.visual_grid().iter().all(|&c| c));
    }

    #[test]
    fn test_reset_from_any_state() {
        let mut session = scripted(vec![vec![4, 1, 7]]);
        session.start().unwrap();
        session.tick(500);
        session.click(4).unwrap();

        session.reset();
        assert_eq!(session.status(), SessionStatus::NotStarted);
        assert_eq!(session.pattern_length(), 3);
        assert_eq!(session.progress(), 0);
        assert_eq!(session.round(), 0);
        assert!(session.visual_grid().iter().all(|&c| !c));
        assert_eq!(session.scheduler().pending_len(), 0);

        // Old cues are gone for good
        session.tick(10_000);
        assert!(session.visual_grid().iter().all(|&c| !c));
    }

    #[test]
    fn test_round_advance_drops_old_cues() {
        let mut session = scripted(vec![vec![4, 1, 7], vec![0, 2, 3, 5]]);
        session.start().unwrap();

        // Finish the round before any of its cues fire
        play_round(&mut session);
        assert_eq!(session.round(), 2);
        session.drain_events();

        // Only the new round's choreography may touch the grid
        session.tick(0);
        assert_eq!(session.visual_grid().iter().filter(|&&c| c).count(), 1);
        assert!(session.visual_grid()[0]);
        session.tick(10_000);
        assert!(session.visual_grid().iter().all(|&c| !c));

        let events = session.drain_events();
        assert_eq!(
            events,
            vec![
                SessionEvent::CellRevealed { cell: 0 },
                SessionEvent::CellRevealed { cell: 2 },
                SessionEvent::CellRevealed { cell: 3 },
                SessionEvent::CellRevealed { cell: 5 },
                SessionEvent::BoardHidden,
            ]
        );
    }

    #[test]
    fn test_events_follow_play() {
        let mut session = scripted(vec![vec![4, 1, 7]]);
        session.start().unwrap();
        session.tick(2_000);
        session.click(4).unwrap();
        session.click(7).unwrap();

        assert_eq!(
            session.drain_events(),
            vec![
                SessionEvent::RoundStarted { round: 1, length: 3 },
                SessionEvent::CellRevealed { cell: 4 },
                SessionEvent::CellRevealed { cell: 1 },
                SessionEvent::CellRevealed { cell: 7 },
                SessionEvent::BoardHidden,
                SessionEvent::CellClicked { cell: 4, correct: true },
                SessionEvent::CellClicked { cell: 7, correct: false },
                SessionEvent::Failed {
                    clicked: 7,
                    expected: Some(1)
                },
            ]
        );
        assert!(session.drain_events().is_empty());
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut session = scripted(vec![vec![4, 1, 7]]);
        session.start().unwrap();
        session.tick(0);

        let snapshot = session.snapshot();
        assert_eq!(snapshot.status, SessionStatus::InProgress);
        assert!(snapshot.revealing);
        assert!(snapshot.grid[4]);

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: SessionSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }

    proptest! {
        #[test]
        fn prop_correct_play_always_wins(seed in any::<u64>()) {
            let mut session = GameSession::new(Settings::seeded(seed)).unwrap();
            session.start().unwrap();
            let mut outcome = ClickOutcome::Ignored;
            while session.status() == SessionStatus::InProgress {
                outcome = play_round(&mut session);
            }
            prop_assert_eq!(outcome, ClickOutcome::Won);
            prop_assert_eq!(session.pattern_length(), GRID_SIZE);
        }

        #[test]
        fn prop_unselected_click_fails(seed in any::<u64>(), dt in 0u64..3_000) {
            let mut session = GameSession::new(Settings::seeded(seed)).unwrap();
            session.start().unwrap();
            session.tick(dt);

            let pattern = session.current_pattern().unwrap().clone();
            let Some(outside) = (0..GRID_SIZE).find(|&c| !pattern.contains(c)) else {
                return Ok(());
            };
            let outcome = session.click(outside).unwrap();
            prop_assert!(
                matches!(outcome, ClickOutcome::Failed { .. }),
                "expected failure, got {:?}",
                outcome
            );

            let frozen = session.visual_grid().to_vec();
            session.tick(10_000);
            prop_assert_eq!(session.visual_grid(), frozen.as_slice());
            for cell in 0..GRID_SIZE {
                prop_assert_eq!(session.click(cell).unwrap(), ClickOutcome::Ignored);
            }
        }

        #[test]
        fn prop_reset_restores_initial_state(seed in any::<u64>(), clicks in proptest::collection::vec(0usize..GRID_SIZE, 0..12)) {
            let mut session = GameSession::new(Settings::seeded(seed)).unwrap();
            session.start().unwrap();
            for cell in clicks {
                session.click(cell).unwrap();
            }
            session.reset();

            prop_assert_eq!(session.status(), SessionStatus::NotStarted);
            prop_assert_eq!(session.pattern_length(), INITIAL_PATTERN_LENGTH);
            prop_assert_eq!(session.progress(), 0);
            prop_assert!(session.visual_grid().iter().all(|&c| !c));
        }
    }
}
