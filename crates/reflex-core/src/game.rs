use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::clock::{ClockTick, GameClock};
use crate::config::GameConfig;
use crate::hit::{HitOutcome, ScoreState};
use crate::report::ResultPayload;
use crate::scheduler::Scheduler;
use crate::session::{GameSession, Phase, SessionId};
use crate::spawner::{self, SpawnDecision, Spawner};
use crate::surface::{Field, Surface};
use crate::target::{Target, TargetId, TargetSet};
use crate::time::{Millis, format_countdown};

/// Work items the game registers with its scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Render-driven clock tick.
    Frame,
    /// Spawner cadence tick.
    Spawn,
    /// Lifetime of a target ran out.
    Expire(TargetId),
}

/// Everything that changes during a session, owned in one place.
#[derive(Debug)]
struct GameState {
    session: GameSession,
    clock: GameClock,
    score: ScoreState,
}

/// One session of the target-click game.
///
/// `H` is the handle type of the [`Surface`] the game draws on. All entry
/// points run to completion; the caller owns the scheduler and the surface
/// and passes them in.
pub struct Game<H> {
    config: GameConfig,
    state: GameState,
    targets: TargetSet<H>,
    spawner: Spawner,
    rng: StdRng,
}

impl<H> Game<H> {
    pub fn new(session_id: SessionId, config: GameConfig, now: Millis, seed: u64) -> Self {
        let session = GameSession::new(session_id, now, config.duration_secs);
        Self {
            config,
            state: GameState {
                session,
                clock: GameClock::new(),
                score: ScoreState::default(),
            },
            targets: TargetSet::new(),
            spawner: Spawner::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn score(&self) -> &ScoreState {
        &self.state.score
    }

    pub fn phase(&self) -> Phase {
        self.state.clock.phase()
    }

    pub fn is_spawning(&self) -> bool {
        self.spawner.is_active()
    }

    pub fn live_targets(&self) -> impl Iterator<Item = TargetId> + '_ {
        self.targets.ids()
    }

    pub fn target(&self, id: TargetId) -> Option<&Target<H>> {
        self.targets.get(id)
    }

    pub fn targets_spawned(&self) -> u64 {
        self.targets.spawned()
    }

    /// Arm the spawner and run the first clock tick. Returns the payload if
    /// the session is already over.
    pub fn start<S, T>(&mut self, now: Millis, sched: &mut T, surface: &mut S) -> Option<ResultPayload>
    where
        S: Surface<Handle = H>,
        T: Scheduler<Task>,
    {
        tracing::debug!(session = %self.state.session.session_id, "Game started");
        surface.set_text(Field::Score, "0");
        surface.set_text(Field::Combo, "0");
        self.spawner
            .arm(sched, self.config.spawn_interval_ms, Task::Spawn);
        self.tick(now, sched, surface)
    }

    /// Run one scheduled task. Returns the result payload exactly once, on
    /// the tick that ends the session.
    pub fn handle<S, T>(
        &mut self,
        task: Task,
        now: Millis,
        sched: &mut T,
        surface: &mut S,
    ) -> Option<ResultPayload>
    where
        S: Surface<Handle = H>,
        T: Scheduler<Task>,
    {
        match task {
            Task::Frame => self.tick(now, sched, surface),
            Task::Spawn => {
                self.spawn(now, sched, surface);
                None
            },
            Task::Expire(id) => {
                self.expire(id, surface);
                None
            },
        }
    }

    /// Player activated target `id`. Returns `None` if the target is already
    /// gone or the session is over.
    pub fn hit<S>(&mut self, id: TargetId, now: Millis, surface: &mut S) -> Option<HitOutcome>
    where
        S: Surface<Handle = H>,
    {
        if !self.targets.contains(id) {
            return None;
        }
        let outcome = if self.phase() == Phase::Running {
            let outcome = self
                .state
                .score
                .register_hit(now, self.config.combo_window_ms);
            surface.set_text(Field::Score, &outcome.hits.to_string());
            surface.set_text(Field::Combo, &outcome.combos.to_string());
            tracing::debug!(
                target_id = id,
                hits = outcome.hits,
                combos = outcome.combos,
                combo = outcome.combo,
                "Target hit"
            );
            Some(outcome)
        } else {
            None
        };
        self.remove_target(id, surface);
        outcome
    }

    fn tick<S, T>(&mut self, now: Millis, sched: &mut T, surface: &mut S) -> Option<ResultPayload>
    where
        S: Surface<Handle = H>,
        T: Scheduler<Task>,
    {
        match self.state.clock.tick(&self.state.session, now) {
            ClockTick::Idle => None,
            ClockTick::Running(reading) => {
                surface.set_text(Field::Time, &format_countdown(reading.remaining_secs));
                sched.request_frame(Task::Frame);
                None
            },
            ClockTick::Finished(reading) => {
                surface.set_text(Field::Time, &format_countdown(0.0));
                self.spawner.cancel(sched);
                let payload = ResultPayload::snapshot(&self.state.score, reading.elapsed_secs);
                tracing::info!(
                    session = %self.state.session.session_id,
                    hits = payload.hits,
                    combos = payload.combos,
                    duration = payload.duration,
                    "Game over"
                );
                Some(payload)
            },
        }
    }

    fn spawn<S, T>(&mut self, now: Millis, sched: &mut T, surface: &mut S)
    where
        S: Surface<Handle = H>,
        T: Scheduler<Task>,
    {
        // A browser may still deliver a callback queued before cancellation.
        if !self.spawner.is_active() {
            return;
        }
        let elapsed = self.state.session.elapsed_secs(now);
        match spawner::decide(elapsed, self.state.session.duration_secs) {
            SpawnDecision::Stop => {
                if self.spawner.cancel(sched) {
                    tracing::debug!(elapsed, "Spawner stopped");
                }
            },
            SpawnDecision::Spawn => {
                let size = self.config.target_size;
                let position = spawner::random_position(&mut self.rng, surface.bounds(), size);
                let id = self.targets.allocate_id();
                let handle = surface.create_entity(position, size);
                surface.subscribe_click(&handle, id);
                self.targets.insert(Target {
                    id,
                    position,
                    spawn_time: now,
                    lifetime_ms: self.config.target_lifetime_ms,
                    handle,
                });
                sched.set_timeout(self.config.target_lifetime_ms, Task::Expire(id));
                tracing::debug!(target_id = id, x = position.x, y = position.y, "Target spawned");
            },
        }
    }

    fn expire<S>(&mut self, id: TargetId, surface: &mut S)
    where
        S: Surface<Handle = H>,
    {
        if self.remove_target(id, surface) {
            tracing::debug!(target_id = id, "Target expired");
        }
    }

    fn remove_target<S>(&mut self, id: TargetId, surface: &mut S) -> bool
    where
        S: Surface<Handle = H>,
    {
        match self.targets.remove(id) {
            Some(target) => {
                surface.remove_entity(&target.handle);
                true
            },
            None => false,
        }
    }
}
