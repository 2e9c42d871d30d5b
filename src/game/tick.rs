// Fixed-cadence tick loop: countdowns, live play, game over

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use super::physics::{self, TickOutcome};
use super::state::{GameState, Side, Snapshot};
use crate::game_modes::common::cadence_sleep;

/// Seconds of pause before every serve. Fixed, since both peers must pause in step.
pub const COUNTDOWN_SECS: u64 = 3;

/// Text shown in the pause popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Banner {
    Starting,
    Scored(Side),
    GameOver,
}

impl Banner {
    pub fn text(self) -> &'static str {
        match self {
            Banner::Starting => "Starting Game",
            Banner::Scored(Side::Right) => "SCORE -->",
            Banner::Scored(Side::Left) => "<-- SCORE",
            Banner::GameOver => "GAME OVER",
        }
    }
}

/// Pause popup drawn over the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlay {
    pub banner: Banner,
    /// Seconds left before play resumes; `None` once the match is over.
    pub remaining: Option<u64>,
}

/// Anything that can show a frame. Must draw from its arguments alone.
pub trait RenderSink {
    fn render(&mut self, snapshot: &Snapshot, overlay: Option<&Overlay>) -> io::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Countdown(Banner),
    Live,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchEnd {
    /// Round limit reached.
    Completed { left: u8, right: u8 },
    /// Someone cleared the running flag first (quit key or a failed actor).
    Aborted,
}

pub struct TickLoop<R: RenderSink> {
    state: GameState,
    sink: R,
    interval: Duration,
    running: Arc<AtomicBool>,
    phase: Phase,
}

impl<R: RenderSink> TickLoop<R> {
    pub fn new(
        state: GameState,
        sink: R,
        interval: Duration,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            state,
            sink,
            interval,
            running,
            phase: Phase::Countdown(Banner::Starting),
        }
    }

    /// Show the popup for `banner`.
    ///
    /// Mid-match this counts down one second per number. Once the round limit is
    /// reached it draws the popup a single time and returns at once.
    pub async fn countdown(&mut self, banner: Banner) -> io::Result<()> {
        let snapshot = self.state.snapshot();

        if self.state.is_over() {
            let overlay = Overlay {
                banner,
                remaining: None,
            };
            return self.sink.render(&snapshot, Some(&overlay));
        }

        for remaining in (1..=COUNTDOWN_SECS).rev() {
            let overlay = Overlay {
                banner,
                remaining: Some(remaining),
            };
            self.sink.render(&snapshot, Some(&overlay))?;
            sleep(Duration::from_secs(1)).await;
        }
        Ok(())
    }

    /// Opening "Starting Game" countdown. Play is live afterwards.
    pub async fn start(&mut self) -> io::Result<()> {
        self.countdown(Banner::Starting).await?;
        self.phase = Phase::Live;
        Ok(())
    }

    /// One live tick: physics, then either a plain frame or the next phase.
    pub fn tick(&mut self) -> io::Result<Phase> {
        match physics::step(&mut self.state) {
            TickOutcome::InPlay => {
                self.sink.render(&self.state.snapshot(), None)?;
                Ok(Phase::Live)
            }
            TickOutcome::Scored { side, game_over } => {
                info!(
                    ?side,
                    left = self.state.score_left,
                    right = self.state.score_right,
                    "point scored"
                );
                let banner = if game_over {
                    Banner::GameOver
                } else {
                    Banner::Scored(side)
                };
                Ok(Phase::Countdown(banner))
            }
        }
    }

    /// Drive the match from the current phase until the round limit or an abort.
    pub async fn run(&mut self) -> io::Result<MatchEnd> {
        loop {
            if !self.running.load(Ordering::Acquire) {
                debug!(phase = ?self.phase, "running flag cleared, leaving tick loop");
                return Ok(MatchEnd::Aborted);
            }

            match self.phase {
                Phase::Countdown(banner) => {
                    self.countdown(banner).await?;
                    self.phase = if self.state.is_over() {
                        Phase::GameOver
                    } else {
                        Phase::Live
                    };
                }
                Phase::Live => {
                    let started = Instant::now();
                    self.phase = self.tick()?;
                    sleep(cadence_sleep(self.interval, started.elapsed())).await;
                }
                Phase::GameOver => {
                    return Ok(MatchEnd::Completed {
                        left: self.state.score_left,
                        right: self.state.score_right,
                    });
                }
            }
        }
    }
}
