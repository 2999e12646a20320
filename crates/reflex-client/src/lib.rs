mod diag;
pub mod lifecycle;
pub mod page;

#[cfg(target_family = "wasm")]
mod dom;
#[cfg(target_family = "wasm")]
mod fetch;
#[cfg(target_family = "wasm")]
mod runtime;
#[cfg(target_family = "wasm")]
mod timers;

use wasm_bindgen::prelude::*;

/// WASM entry point. Starts the session once the page's elements exist.
#[wasm_bindgen(start)]
pub fn start() {
    #[cfg(target_family = "wasm")]
    {
        console_error_panic_hook::set_once();
        boot();
    }
}

#[cfg(target_family = "wasm")]
fn boot() {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        diag::console_warn!("Reflex: no document to attach to");
        return;
    };
    if document.ready_state() == "loading" {
        let on_ready = Closure::once_into_js(launch_logged);
        if let Err(e) = document
            .add_event_listener_with_callback("DOMContentLoaded", on_ready.unchecked_ref())
        {
            diag::console_warn!("Reflex: cannot wait for DOMContentLoaded: {e:?}");
        }
    } else {
        launch_logged();
    }
}

#[cfg(target_family = "wasm")]
fn launch_logged() {
    if let Err(e) = runtime::launch() {
        diag::console_warn!("Reflex failed to start: {e:?}");
    }
}
