use std::cell::RefCell;
use std::rc::{Rc, Weak};

use wasm_bindgen::prelude::*;

use reflex_core::game::{Game, Task};
use reflex_core::report::{ReportOutcome, ResultPayload, SessionReporter};
use reflex_core::scheduler::TimerId;
use reflex_core::scoring::{compute_score, time_left};
use reflex_core::target::TargetId;

use crate::diag;
use crate::dom::{DomHandle, DomRefs, DomSurface};
use crate::fetch::FetchResultsService;
use crate::lifecycle::{releases_listeners, undelivered_notice};
use crate::page::{PageContext, seed_from_unit};
use crate::timers::BrowserTimers;

/// Everything one session needs, shared between JS callbacks.
/// Uses Rc<RefCell> because WASM is single-threaded.
pub struct Runtime {
    window: web_sys::Window,
    game: Game<DomHandle>,
    surface: DomSurface,
    timers: BrowserTimers,
    /// Taken by the first game-over hand-off.
    reporter: Option<SessionReporter>,
}

pub type WeakRuntime = Weak<RefCell<Runtime>>;

thread_local! {
    static ACTIVE: RefCell<Option<Rc<RefCell<Runtime>>>> = const { RefCell::new(None) };
}

fn now_ms(window: &web_sys::Window) -> f64 {
    window.performance().map(|p| p.now()).unwrap_or(0.0)
}

fn window() -> Result<web_sys::Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no window"))
}

/// Build the session from the page and start the clock and spawner.
pub fn launch() -> Result<(), JsValue> {
    let window = window()?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let page = PageContext::read(&document)?;
    let refs = DomRefs::lookup(&document)?;
    let now = now_ms(&window);
    let seed = seed_from_unit(js_sys::Math::random());

    let reporter = SessionReporter::new(
        page.session_id.clone(),
        page.csrf_token.clone(),
        page.config.retry.clone(),
    );
    let runtime = Rc::new_cyclic(|weak: &WeakRuntime| {
        RefCell::new(Runtime {
            window: window.clone(),
            game: Game::new(page.session_id.clone(), page.config.clone(), now, seed),
            surface: DomSurface::new(refs, Weak::clone(weak)),
            timers: BrowserTimers::new(window.clone(), Weak::clone(weak)),
            reporter: Some(reporter),
        })
    });

    // Registered before starting so callbacks scheduled by `start` find a
    // live runtime.
    ACTIVE.with(|slot| *slot.borrow_mut() = Some(Rc::clone(&runtime)));
    let finished = {
        let mut guard = runtime.borrow_mut();
        let rt = &mut *guard;
        rt.game.start(now, &mut rt.timers, &mut rt.surface)
    };
    diag::console_log!("Reflex session {} started", page.session_id);
    if let Some(payload) = finished {
        hand_off(&runtime, payload);
    }
    Ok(())
}

/// Run a scheduled task against the live runtime.
pub fn dispatch(runtime: &WeakRuntime, task: Task) {
    run_task(runtime, None, task);
}

/// Run a task fired by timer `id`.
pub fn dispatch_timer(runtime: &WeakRuntime, id: TimerId, task: Task) {
    run_task(runtime, Some(id), task);
}

fn run_task(runtime: &WeakRuntime, fired: Option<TimerId>, task: Task) {
    let Some(runtime) = runtime.upgrade() else {
        return;
    };
    let finished = {
        let Ok(mut guard) = runtime.try_borrow_mut() else {
            diag::console_warn!("Re-entrant {task:?} dropped");
            return;
        };
        let rt = &mut *guard;
        if let Some(id) = fired {
            rt.timers.fired(id);
        }
        if releases_listeners(task) {
            rt.surface.release_retired();
        }
        let now = now_ms(&rt.window);
        rt.game.handle(task, now, &mut rt.timers, &mut rt.surface)
    };
    if let Some(payload) = finished {
        hand_off(&runtime, payload);
    }
}

/// Click on target `target`.
pub fn dispatch_hit(runtime: &WeakRuntime, target: TargetId) {
    let Some(runtime) = runtime.upgrade() else {
        return;
    };
    let Ok(mut guard) = runtime.try_borrow_mut() else {
        diag::console_warn!("Re-entrant click on target {target} dropped");
        return;
    };
    let rt = &mut *guard;
    let now = now_ms(&rt.window);
    if let Some(outcome) = rt.game.hit(target, now, &mut rt.surface)
        && outcome.combo
    {
        diag::console_log!("Combo! {} so far", outcome.combos);
    }
}

/// Deliver the result payload once and leave the page with the outcome.
fn hand_off(runtime: &Rc<RefCell<Runtime>>, payload: ResultPayload) {
    let (reporter, window, game_secs) = {
        let mut rt = runtime.borrow_mut();
        let Some(reporter) = rt.reporter.take() else {
            return;
        };
        let game_secs = rt.game.config().duration_secs;
        (reporter, rt.window.clone(), game_secs)
    };
    diag::console_log!(
        "Game over: {} hits, {} combos, projected score {}",
        payload.hits,
        payload.combos,
        compute_score(payload.hits, payload.combos, time_left(payload.duration, game_secs))
    );

    wasm_bindgen_futures::spawn_local(async move {
        let service = FetchResultsService::new(window.clone());
        let outcome = reporter.report(&service, payload).await;
        let location = window.location();
        match outcome {
            ReportOutcome::Navigate(url) => {
                if let Err(e) = location.set_href(&url) {
                    diag::console_warn!("Navigation to {url} failed: {e:?}");
                    reload(&location);
                }
            },
            ReportOutcome::Reload => {
                diag::console_warn!("{}", undelivered_notice(&payload));
                reload(&location);
            },
        }
    });
}

fn reload(location: &web_sys::Location) {
    if let Err(e) = location.reload() {
        diag::console_warn!("Reload failed: {e:?}");
    }
}
