//! Cooperative timer abstraction.
//!
//! Game code registers work through [`Scheduler`] and never blocks. The
//! browser client backs it with `requestAnimationFrame`, `setTimeout` and
//! `setInterval`; [`VirtualScheduler`] is a deterministic event queue over a
//! virtual clock so whole sessions can be driven synchronously.

use crate::time::Millis;

/// Handle for a timeout or interval, usable with [`Scheduler::cancel`].
pub type TimerId = u64;

/// Default frame interval of the virtual clock (60 Hz).
pub const DEFAULT_FRAME_MS: f64 = 1000.0 / 60.0;

/// Intervals shorter than this are clamped, as browsers do.
const MIN_INTERVAL_MS: f64 = 1.0;

pub trait Scheduler<T> {
    /// Run `task` at the next display refresh.
    fn request_frame(&mut self, task: T);

    /// Run `task` once after `delay_ms`.
    fn set_timeout(&mut self, delay_ms: f64, task: T) -> TimerId;

    /// Run `task` every `period_ms`, first after one full period.
    fn set_interval(&mut self, period_ms: f64, task: T) -> TimerId;

    /// Cancel a timeout or interval. Unknown or already-fired ids are ignored.
    fn cancel(&mut self, id: TimerId);
}

#[derive(Debug)]
struct Pending<T> {
    id: TimerId,
    due: Millis,
    seq: u64,
    period: Option<f64>,
    task: T,
}

/// Single-threaded event queue driven by an explicit virtual clock.
///
/// Entries due at the same instant run in registration order.
#[derive(Debug)]
pub struct VirtualScheduler<T> {
    now: Millis,
    frame_ms: f64,
    next_id: TimerId,
    next_seq: u64,
    pending: Vec<Pending<T>>,
}

impl<T: Clone> VirtualScheduler<T> {
    pub fn new(start: Millis) -> Self {
        Self::with_frame_interval(start, DEFAULT_FRAME_MS)
    }

    pub fn with_frame_interval(start: Millis, frame_ms: f64) -> Self {
        Self {
            now: start,
            frame_ms: frame_ms.max(MIN_INTERVAL_MS),
            next_id: 1,
            next_seq: 0,
            pending: Vec::new(),
        }
    }

    pub fn now(&self) -> Millis {
        self.now
    }

    /// Number of queued frames, timeouts and intervals.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Pop the earliest entry due at or before `until`, advancing the clock
    /// to its due time. Intervals are re-armed before returning.
    pub fn pop_due(&mut self, until: Millis) -> Option<(Millis, T)> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= until)
            .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)))
            .map(|(i, _)| i)?;
        let entry = self.pending.swap_remove(idx);
        self.now = self.now.max(entry.due);
        if let Some(period) = entry.period {
            let seq = self.bump_seq();
            self.pending.push(Pending {
                id: entry.id,
                due: entry.due + period,
                seq,
                period: Some(period),
                task: entry.task.clone(),
            });
        }
        Some((entry.due, entry.task))
    }

    /// Move the clock forward without running anything.
    pub fn advance_to(&mut self, until: Millis) {
        self.now = self.now.max(until);
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn push(&mut self, due: Millis, period: Option<f64>, task: T) -> TimerId {
        let id = self.next_id;
        self.next_id += 1;
        let seq = self.bump_seq();
        self.pending.push(Pending {
            id,
            due,
            seq,
            period,
            task,
        });
        id
    }
}

impl<T: Clone> Scheduler<T> for VirtualScheduler<T> {
    fn request_frame(&mut self, task: T) {
        let due = self.now + self.frame_ms;
        self.push(due, None, task);
    }

    fn set_timeout(&mut self, delay_ms: f64, task: T) -> TimerId {
        let due = self.now + delay_ms.max(0.0);
        self.push(due, None, task)
    }

    fn set_interval(&mut self, period_ms: f64, task: T) -> TimerId {
        let period = period_ms.max(MIN_INTERVAL_MS);
        let due = self.now + period;
        self.push(due, Some(period), task)
    }

    fn cancel(&mut self, id: TimerId) {
        self.pending.retain(|p| p.id != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(sched: &mut VirtualScheduler<&'static str>, until: Millis) -> Vec<(Millis, &'static str)> {
        let mut fired = Vec::new();
        while let Some(entry) = sched.pop_due(until) {
            fired.push(entry);
        }
        sched.advance_to(until);
        fired
    }

    #[test]
    fn timeouts_fire_in_due_order() {
        let mut sched = VirtualScheduler::new(0.0);
        sched.set_timeout(300.0, "late");
        sched.set_timeout(100.0, "early");
        assert_eq!(drain(&mut sched, 1000.0), vec![(100.0, "early"), (300.0, "late")]);
        assert_eq!(sched.now(), 1000.0);
        assert_eq!(sched.pending_count(), 0);
    }

    #[test]
    fn ties_keep_registration_order() {
        let mut sched = VirtualScheduler::new(0.0);
        sched.set_timeout(50.0, "a");
        sched.set_timeout(50.0, "b");
        let fired: Vec<_> = drain(&mut sched, 50.0).into_iter().map(|(_, t)| t).collect();
        assert_eq!(fired, vec!["a", "b"]);
    }

    #[test]
    fn interval_repeats_until_cancelled() {
        let mut sched = VirtualScheduler::new(0.0);
        let id = sched.set_interval(500.0, "spawn");
        assert_eq!(drain(&mut sched, 1600.0).len(), 3);
        assert_eq!(sched.pending_count(), 1);
        sched.cancel(id);
        assert_eq!(sched.pending_count(), 0);
        assert!(drain(&mut sched, 10_000.0).is_empty());
    }

    #[test]
    fn cancel_unknown_id_is_ignored() {
        let mut sched = VirtualScheduler::<&str>::new(0.0);
        sched.cancel(42);
        assert_eq!(sched.pending_count(), 0);
    }

    #[test]
    fn frames_follow_the_frame_interval() {
        let mut sched = VirtualScheduler::with_frame_interval(0.0, 10.0);
        sched.request_frame("frame");
        assert_eq!(sched.pop_due(5.0), None);
        assert_eq!(sched.pop_due(10.0), Some((10.0, "frame")));
        // one-shot until requested again
        assert_eq!(sched.pop_due(100.0), None);
    }

    #[test]
    fn zero_period_interval_is_clamped() {
        let mut sched = VirtualScheduler::new(0.0);
        sched.set_interval(0.0, "tick");
        assert_eq!(drain(&mut sched, 3.0).len(), 3);
    }
}
