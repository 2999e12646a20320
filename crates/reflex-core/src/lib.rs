pub mod clock;
pub mod config;
pub mod csrf;
pub mod game;
pub mod hit;
pub mod report;
pub mod scheduler;
pub mod scoring;
pub mod session;
pub mod spawner;
pub mod surface;
pub mod target;
pub mod time;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use std::cell::RefCell;
    use std::collections::{BTreeMap, HashMap, VecDeque};
    use std::time::Duration;

    use crate::game::{Game, Task};
    use crate::report::{FinishRequest, ReportError, ResultPayload, ResultsService, ServiceResponse};
    use crate::scheduler::VirtualScheduler;
    use crate::surface::{Bounds, Field, Position, Surface};
    use crate::target::TargetId;
    use crate::time::Millis;

    /// In-memory surface that records every call.
    #[derive(Debug, Default)]
    pub struct RecordingSurface {
        pub bounds: Bounds,
        texts: HashMap<Field, String>,
        live: BTreeMap<u32, (Position, f64)>,
        clicks: HashMap<u32, TargetId>,
        created: Vec<(Position, f64)>,
        removals: usize,
        double_removals: usize,
        next_handle: u32,
    }

    impl RecordingSurface {
        pub fn new(bounds: Bounds) -> Self {
            Self {
                bounds,
                ..Self::default()
            }
        }

        pub fn text(&self, field: Field) -> Option<&str> {
            self.texts.get(&field).map(String::as_str)
        }

        pub fn live_count(&self) -> usize {
            self.live.len()
        }

        /// Every entity ever created, with its position and size.
        pub fn created(&self) -> &[(Position, f64)] {
            &self.created
        }

        pub fn removals(&self) -> usize {
            self.removals
        }

        /// Removals of handles that were already gone.
        pub fn double_removals(&self) -> usize {
            self.double_removals
        }

        /// Handles of entities currently on the surface, oldest first.
        pub fn live_handles(&self) -> Vec<u32> {
            self.live.keys().copied().collect()
        }

        /// Target a click on `handle` would be reported as.
        pub fn subscribed_target(&self, handle: u32) -> Option<TargetId> {
            self.clicks.get(&handle).copied()
        }
    }

    impl Surface for RecordingSurface {
        type Handle = u32;

        fn bounds(&self) -> Bounds {
            self.bounds
        }

        fn create_entity(&mut self, position: Position, size: f64) -> u32 {
            self.next_handle += 1;
            self.live.insert(self.next_handle, (position, size));
            self.created.push((position, size));
            self.next_handle
        }

        fn remove_entity(&mut self, handle: &u32) {
            if self.live.remove(handle).is_some() {
                self.removals += 1;
                self.clicks.remove(handle);
            } else {
                self.double_removals += 1;
            }
        }

        fn set_text(&mut self, field: Field, value: &str) {
            self.texts.insert(field, value.to_string());
        }

        fn subscribe_click(&mut self, handle: &u32, target: TargetId) {
            self.clicks.insert(*handle, target);
        }
    }

    /// Run every task due up to `until`, returning the game-over payload if
    /// it was produced in this window. Panics if it is produced twice.
    pub fn drive(
        game: &mut Game<u32>,
        sched: &mut VirtualScheduler<Task>,
        surface: &mut RecordingSurface,
        until: Millis,
    ) -> Option<ResultPayload> {
        let mut finished = None;
        while let Some((at, task)) = sched.pop_due(until) {
            if let Some(payload) = game.handle(task, at, sched, surface) {
                assert!(finished.is_none(), "game over fired twice");
                finished = Some(payload);
            }
        }
        sched.advance_to(until);
        finished
    }

    /// Results service answering from a script. Exhausted scripts fail with
    /// a transport error.
    #[derive(Debug, Default)]
    pub struct ScriptedService {
        responses: RefCell<VecDeque<Result<ServiceResponse, ReportError>>>,
        requests: RefCell<Vec<FinishRequest>>,
        backoffs: RefCell<Vec<Duration>>,
    }

    impl ScriptedService {
        pub fn new(responses: Vec<Result<ServiceResponse, ReportError>>) -> Self {
            Self {
                responses: RefCell::new(responses.into()),
                ..Self::default()
            }
        }

        /// A successful answer redirecting to `url`.
        pub fn redirect(url: &str) -> ServiceResponse {
            ServiceResponse {
                status: 200,
                body: serde_json::json!({ "status": "ok", "redirect_url": url }).to_string(),
            }
        }

        pub fn requests(&self) -> Vec<FinishRequest> {
            self.requests.borrow().clone()
        }

        pub fn backoffs(&self) -> Vec<Duration> {
            self.backoffs.borrow().clone()
        }
    }

    impl ResultsService for ScriptedService {
        async fn submit(&self, request: &FinishRequest) -> Result<ServiceResponse, ReportError> {
            self.requests.borrow_mut().push(request.clone());
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(ReportError::Transport("no scripted response".to_string())))
        }

        async fn backoff(&self, delay: Duration) {
            self.backoffs.borrow_mut().push(delay);
        }
    }
}
