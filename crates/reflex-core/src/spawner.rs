use rand::Rng;

use crate::scheduler::{Scheduler, TimerId};
use crate::surface::{Bounds, Position};

/// What the spawner does on one cadence tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnDecision {
    Spawn,
    /// The session has run out of time; stop the cadence for good.
    Stop,
}

/// Spawn only while time remains. This never decides game over; that is
/// the clock's job.
pub fn decide(elapsed_secs: f64, duration_secs: f64) -> SpawnDecision {
    if elapsed_secs < duration_secs {
        SpawnDecision::Spawn
    } else {
        SpawnDecision::Stop
    }
}

/// Uniformly random top-left corner keeping a `size` square fully inside
/// `bounds`. An area smaller than the target collapses the span to zero.
pub fn random_position<R: Rng + ?Sized>(rng: &mut R, bounds: Bounds, size: f64) -> Position {
    let span_x = (bounds.width - size).max(0.0);
    let span_y = (bounds.height - size).max(0.0);
    Position {
        x: rng.random::<f64>() * span_x,
        y: rng.random::<f64>() * span_y,
    }
}

/// Owner of the repeating spawn cadence.
///
/// Once cancelled the cadence never resumes; further cancels are no-ops.
#[derive(Debug, Default)]
pub struct Spawner {
    timer: Option<TimerId>,
    cancelled: bool,
}

impl Spawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the cadence. Ignored if already running or cancelled.
    pub fn arm<T, S: Scheduler<T>>(&mut self, sched: &mut S, interval_ms: f64, task: T) {
        if self.timer.is_some() || self.cancelled {
            return;
        }
        self.timer = Some(sched.set_interval(interval_ms, task));
    }

    /// Returns `true` only for the call that actually cancelled the cadence.
    pub fn cancel<T, S: Scheduler<T>>(&mut self, sched: &mut S) -> bool {
        self.cancelled = true;
        match self.timer.take() {
            Some(id) => {
                sched.cancel(id);
                true
            },
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.timer.is_some()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::scheduler::VirtualScheduler;

    #[test]
    fn spawns_only_before_duration() {
        assert_eq!(decide(0.0, 30.0), SpawnDecision::Spawn);
        assert_eq!(decide(29.99, 30.0), SpawnDecision::Spawn);
        assert_eq!(decide(30.0, 30.0), SpawnDecision::Stop);
        assert_eq!(decide(31.5, 30.0), SpawnDecision::Stop);
    }

    #[test]
    fn tiny_area_pins_to_origin() {
        let mut rng = StdRng::seed_from_u64(1);
        let pos = random_position(&mut rng, Bounds::new(30.0, 20.0), 50.0);
        assert_eq!(pos, Position { x: 0.0, y: 0.0 });
    }

    #[test]
    fn cancel_is_idempotent_and_final() {
        let mut sched = VirtualScheduler::new(0.0);
        let mut spawner = Spawner::new();
        spawner.arm(&mut sched, 500.0, ());
        assert!(spawner.is_active());
        assert!(spawner.cancel(&mut sched));
        assert!(!spawner.cancel(&mut sched));
        assert!(!spawner.is_active());
        assert_eq!(sched.pending_count(), 0);

        spawner.arm(&mut sched, 500.0, ());
        assert!(!spawner.is_active(), "cancelled cadence must not resume");
        assert_eq!(sched.pending_count(), 0);
    }

    #[test]
    fn arm_twice_keeps_one_interval() {
        let mut sched = VirtualScheduler::new(0.0);
        let mut spawner = Spawner::new();
        spawner.arm(&mut sched, 500.0, ());
        spawner.arm(&mut sched, 500.0, ());
        assert_eq!(sched.pending_count(), 1);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn footprint_stays_inside_bounds(
                seed in any::<u64>(),
                width in 50.0f64..4000.0,
                height in 50.0f64..4000.0,
                size in 1.0f64..50.0,
            ) {
                let mut rng = StdRng::seed_from_u64(seed);
                let bounds = Bounds::new(width, height);
                for _ in 0..16 {
                    let pos = random_position(&mut rng, bounds, size);
                    prop_assert!(bounds.contains_square(pos, size), "{pos:?} outside {bounds:?}");
                }
            }
        }
    }
}
