//! Grid Recall entry point
//!
//! Native demo: plays one session on the simulated clock with a bot that only
//! watches the reveal events, then repeats them once the board hides.
//!
//! Usage: `grid-recall [settings.json] [--fumble]`

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::path::Path;

    use grid_recall::consts::GRID_COLUMNS;
    use grid_recall::{ClickOutcome, GameSession, Result, SessionEvent, Settings, cell_to_row_col};

    /// Simulated frame step (ms)
    const FRAME_MS: u64 = 50;
    /// Hard stop in case the session never settles
    const MAX_FRAMES: u32 = 10_000;

    /// Remembers what it sees and plays it back
    #[derive(Default)]
    struct Bot {
        seen: Vec<usize>,
        /// Round in which to click a wrong cell
        fumble_round: Option<u32>,
        round: u32,
    }

    impl Bot {
        /// Returns the clicks to make for this batch of events
        fn observe(&mut self, events: &[SessionEvent], grid_size: usize) -> Vec<usize> {
            let mut clicks = Vec::new();
            for event in events {
                match *event {
                    SessionEvent::RoundStarted { round, length } => {
                        log::info!("Round {} ({} cells), watching...", round, length);
                        self.round = round;
                        self.seen.clear();
                    }
                    SessionEvent::CellRevealed { cell } => {
                        let (row, col) = cell_to_row_col(cell, GRID_COLUMNS);
                        log::debug!("Saw cell {} at row {}, col {}", cell, row, col);
                        self.seen.push(cell);
                    }
                    SessionEvent::BoardHidden => {
                        if self.fumble_round == Some(self.round) {
                            let wrong = (0..grid_size).find(|c| !self.seen.contains(c));
                            clicks.extend(wrong);
                        } else {
                            clicks.extend(self.seen.iter().copied());
                        }
                    }
                    _ => {}
                }
            }
            clicks
        }
    }

    pub fn run() -> Result<()> {
        let mut settings_path = None;
        let mut fumble = false;
        for arg in std::env::args().skip(1) {
            if arg == "--fumble" {
                fumble = true;
            } else {
                settings_path = Some(arg);
            }
        }

        let settings = match settings_path {
            Some(path) => Settings::load(Path::new(&path))?,
            None => Settings::default(),
        };
        let grid_size = settings.grid_size;

        let mut session = GameSession::new(settings)?;
        let mut bot = Bot {
            fumble_round: fumble.then_some(2),
            ..Bot::default()
        };

        session.start()?;
        for _ in 0..MAX_FRAMES {
            session.tick(FRAME_MS);
            let events = session.drain_events();
            for cell in bot.observe(&events, grid_size) {
                match session.click(cell)? {
                    ClickOutcome::RoundComplete { next_length } => {
                        log::info!("Round cleared, next pattern has {} cells", next_length);
                    }
                    ClickOutcome::Failed { clicked, expected } => {
                        log::warn!("Clicked {} but expected {:?}", clicked, expected);
                    }
                    _ => {}
                }
            }
            if session.status().is_terminal() {
                break;
            }
        }

        let snapshot = session.snapshot();
        log::info!(
            "{} after {} rounds (pattern length {})",
            snapshot.status.title(),
            snapshot.round,
            snapshot.pattern_length
        );
        println!("{}", serde_json::to_string_pretty(&snapshot).unwrap_or_default());
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Grid Recall (native demo) starting...");

    if let Err(err) = demo::run() {
        log::error!("{}", err);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Presentation for the web lives outside this crate
}
