//! Interval playback.
//!
//! The sequencer walks the interval list once, front to back:
//!
//! ```text
//! Countdown -> Boundary -> Countdown -> ... -> Done
//!     |                                          ^
//!     +---------------- quit --------------------+
//! ```
//!
//! All waiting goes through a [`Clock`] and all side effects through a
//! [`Frontend`] and a [`Beeper`], so the loop runs in tests without a
//! terminal or a sound card.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::utilities::config::Timing;
use crate::utilities::display::Frame;
use crate::utilities::error::TimerError;
use crate::utilities::intervals::{Interval, IntervalSet};

/// Seconds left at which the next interval is previewed.
pub const PREVIEW_THRESHOLD: u32 = 30;

/// What the user asked for during one tick. Ordered by precedence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Action {
    #[default]
    None,
    Skip,
    Quit,
}

impl Action {
    pub fn merge(self, other: Action) -> Action {
        self.max(other)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlashColor {
    Bright,
    Accent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Quit,
}

pub trait Frontend {
    fn draw(&mut self, frame: &Frame) -> std::io::Result<()>;
    fn fill(&mut self, color: FlashColor) -> std::io::Result<()>;
    fn draw_completion(&mut self, label: &str, pause: Duration) -> std::io::Result<()>;
    /// Drains pending input without blocking.
    fn poll_action(&mut self) -> std::io::Result<Action>;
    fn release(&mut self) -> std::io::Result<()>;
}

pub trait Beeper {
    /// Plays the end-of-interval beeps. Failures are handled internally.
    fn beep(&mut self);
    fn release(&mut self);
}

pub trait Clock {
    fn sleep(&mut self, duration: Duration);
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Playback counters for one run.
#[derive(Clone, Debug)]
pub struct Session {
    intervals: IntervalSet,
    pub current_index: usize,
    pub time_remaining: u32,
    pub elapsed_total: u64,
    pub running: bool,
}

impl Session {
    pub fn new(intervals: IntervalSet) -> Self {
        let time_remaining = intervals.get(0).map(|i| i.duration).unwrap_or(0);
        Self {
            intervals,
            current_index: 0,
            time_remaining,
            elapsed_total: 0,
            running: true,
        }
    }

    pub fn intervals(&self) -> &IntervalSet {
        &self.intervals
    }

    pub fn current(&self) -> Option<&Interval> {
        self.intervals.get(self.current_index)
    }

    pub fn next(&self) -> Option<&Interval> {
        self.intervals.get(self.current_index + 1)
    }

    pub fn is_done(&self) -> bool {
        !self.running || self.current_index >= self.intervals.len()
    }

    /// Fraction of the whole session elapsed, in `0.0..=1.0`.
    pub fn overall_progress(&self) -> f64 {
        let total = self.intervals.total_duration();
        if total == 0 {
            return 0.0;
        }
        (self.elapsed_total as f64 / total as f64).clamp(0.0, 1.0)
    }

    /// Fraction of the current interval elapsed, in `0.0..=1.0`.
    pub fn current_progress(&self) -> f64 {
        match self.current() {
            Some(interval) if interval.duration > 0 => {
                (1.0 - self.time_remaining as f64 / interval.duration as f64).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }

    /// The upcoming interval, once the current one is nearly over.
    pub fn preview(&self) -> Option<&Interval> {
        if self.time_remaining <= PREVIEW_THRESHOLD {
            self.next()
        } else {
            None
        }
    }

    fn tick(&mut self) {
        self.time_remaining = self.time_remaining.saturating_sub(1);
        self.elapsed_total += 1;
    }

    fn advance(&mut self) {
        self.current_index += 1;
        self.time_remaining = self.current().map(|i| i.duration).unwrap_or(0);
    }
}

pub struct Sequencer<C: Clock> {
    session: Session,
    timing: Timing,
    clock: C,
    stop: Arc<AtomicBool>,
}

impl<C: Clock> Sequencer<C> {
    pub fn new(session: Session, timing: Timing, clock: C, stop: Arc<AtomicBool>) -> Self {
        Self {
            session,
            timing,
            clock,
            stop,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Plays every interval and then releases the frontend and beeper,
    /// whichever way the run ends.
    pub fn run<F: Frontend, B: Beeper>(
        &mut self,
        frontend: &mut F,
        beeper: &mut B,
    ) -> Result<Outcome, TimerError> {
        let result = self.play(frontend, beeper);

        beeper.release();
        let released = frontend.release();

        let outcome = result?;
        released?;
        Ok(outcome)
    }

    fn play<F: Frontend, B: Beeper>(
        &mut self,
        frontend: &mut F,
        beeper: &mut B,
    ) -> Result<Outcome, TimerError> {
        log::info!(
            "starting session: {} intervals, {}s total",
            self.session.intervals().len(),
            self.session.intervals().total_duration()
        );

        while !self.session.is_done() {
            if self.countdown(frontend)? == Action::Quit {
                self.session.running = false;
                break;
            }
            if !self.boundary(frontend, beeper)? {
                self.session.running = false;
                break;
            }
            self.session.advance();
        }

        if self.session.running {
            log::info!("session completed after {}s", self.session.elapsed_total);
            Ok(Outcome::Completed)
        } else {
            log::info!(
                "session quit during interval {} after {}s",
                self.session.current_index,
                self.session.elapsed_total
            );
            Ok(Outcome::Quit)
        }
    }

    /// Ticks the current interval down. Returns `Skip` for an early exit,
    /// `Quit` when playback must stop, and `None` when time ran out.
    fn countdown<F: Frontend>(&mut self, frontend: &mut F) -> Result<Action, TimerError> {
        while self.session.time_remaining > 0 {
            frontend.draw(&Frame::compose(&self.session))?;

            self.clock.sleep(self.timing.tick);
            self.session.tick();

            let action = frontend.poll_action()?.merge(self.stop_requested());
            match action {
                Action::Quit => {
                    log::debug!("quit requested");
                    return Ok(Action::Quit);
                }
                Action::Skip => {
                    log::debug!("skipping interval {}", self.session.current_index);
                    return Ok(Action::Skip);
                }
                Action::None => {}
            }
        }
        Ok(Action::None)
    }

    /// Flash, beep and show the completion screen. Returns `false` when a
    /// stop request arrived during the flash.
    fn boundary<F: Frontend, B: Beeper>(
        &mut self,
        frontend: &mut F,
        beeper: &mut B,
    ) -> Result<bool, TimerError> {
        let label = match self.session.current() {
            Some(interval) => interval.label.clone(),
            None => return Ok(true),
        };
        log::info!("interval {} ({label}) finished", self.session.current_index);

        for _ in 0..self.timing.flash_repeats {
            frontend.fill(FlashColor::Bright)?;
            self.clock.sleep(self.timing.flash_hold);
            frontend.fill(FlashColor::Accent)?;
            self.clock.sleep(self.timing.flash_hold);
        }

        if self.stop_requested() == Action::Quit {
            return Ok(false);
        }

        beeper.beep();
        frontend.draw_completion(&label, self.timing.completion_pause)?;
        self.clock.sleep(self.timing.completion_pause);
        Ok(true)
    }

    fn stop_requested(&self) -> Action {
        if self.stop.load(Ordering::SeqCst) {
            Action::Quit
        } else {
            Action::None
        }
    }
}
