use std::collections::HashMap;
use std::rc::Weak;

use wasm_bindgen::prelude::*;
use web_sys::Window;

use reflex_core::game::Task;
use reflex_core::scheduler::{Scheduler, TimerId};

use crate::diag;
use crate::runtime::{WeakRuntime, dispatch, dispatch_timer};

#[derive(Debug, Clone, Copy)]
enum JsTimer {
    Timeout(i32),
    Interval(i32),
}

/// `Scheduler` over `requestAnimationFrame`, `setTimeout` and `setInterval`.
/// Callbacks re-enter the game through the shared runtime.
pub struct BrowserTimers {
    window: Window,
    runtime: WeakRuntime,
    active: HashMap<TimerId, JsTimer>,
    next_id: TimerId,
}

impl BrowserTimers {
    pub fn new(window: Window, runtime: WeakRuntime) -> Self {
        Self {
            window,
            runtime,
            active: HashMap::new(),
            next_id: 1,
        }
    }

    /// Forget a timeout that has run.
    pub fn fired(&mut self, id: TimerId) {
        if let Some(JsTimer::Timeout(_)) = self.active.get(&id) {
            self.active.remove(&id);
        }
    }

    fn allocate(&mut self) -> TimerId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

fn as_js_delay(ms: f64) -> i32 {
    ms.max(0.0).round().min(i32::MAX as f64) as i32
}

impl Scheduler<Task> for BrowserTimers {
    fn request_frame(&mut self, task: Task) {
        let runtime = Weak::clone(&self.runtime);
        let callback = Closure::once_into_js(move |_timestamp: f64| dispatch(&runtime, task));
        if let Err(e) = self.window.request_animation_frame(callback.unchecked_ref()) {
            diag::console_warn!("requestAnimationFrame failed: {e:?}");
        }
    }

    fn set_timeout(&mut self, delay_ms: f64, task: Task) -> TimerId {
        let id = self.allocate();
        let runtime = Weak::clone(&self.runtime);
        let callback = Closure::once_into_js(move || dispatch_timer(&runtime, id, task));
        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.unchecked_ref(),
                as_js_delay(delay_ms),
            ) {
            Ok(handle) => {
                self.active.insert(id, JsTimer::Timeout(handle));
            },
            Err(e) => diag::console_warn!("setTimeout failed: {e:?}"),
        }
        id
    }

    fn set_interval(&mut self, period_ms: f64, task: Task) -> TimerId {
        let id = self.allocate();
        let runtime = Weak::clone(&self.runtime);
        // Owned by JS: the interval may be cleared from inside its own callback.
        let callback =
            Closure::<dyn FnMut()>::new(move || dispatch_timer(&runtime, id, task)).into_js_value();
        match self
            .window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                callback.unchecked_ref(),
                as_js_delay(period_ms).max(1),
            ) {
            Ok(handle) => {
                self.active.insert(id, JsTimer::Interval(handle));
            },
            Err(e) => diag::console_warn!("setInterval failed: {e:?}"),
        }
        id
    }

    fn cancel(&mut self, id: TimerId) {
        match self.active.remove(&id) {
            Some(JsTimer::Timeout(handle)) => self.window.clear_timeout_with_handle(handle),
            Some(JsTimer::Interval(handle)) => self.window.clear_interval_with_handle(handle),
            None => {},
        }
    }
}
