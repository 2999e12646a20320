use crate::session::{GameSession, Phase};
use crate::time::Millis;

/// Snapshot of session time at one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockReading {
    /// True elapsed time; may exceed the session duration.
    pub elapsed_secs: f64,
    /// `max(0, duration - elapsed)`.
    pub remaining_secs: f64,
}

/// Outcome of a clock tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClockTick {
    /// Time remains; schedule the next frame.
    Running(ClockReading),
    /// The one and only terminal transition.
    Finished(ClockReading),
    /// Tick after the session already finished.
    Idle,
}

/// Sole authority over the `Running -> Finished` transition.
#[derive(Debug, Default)]
pub struct GameClock {
    phase: Phase,
}

impl GameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn read(session: &GameSession, now: Millis) -> ClockReading {
        ClockReading {
            elapsed_secs: session.elapsed_secs(now),
            remaining_secs: session.remaining_secs(now),
        }
    }

    pub fn tick(&mut self, session: &GameSession, now: Millis) -> ClockTick {
        if self.phase == Phase::Finished {
            return ClockTick::Idle;
        }
        let reading = Self::read(session, now);
        if reading.remaining_secs > 0.0 {
            ClockTick::Running(reading)
        } else {
            self.phase = Phase::Finished;
            ClockTick::Finished(reading)
        }
    }
}
