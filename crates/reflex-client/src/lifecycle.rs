//! Browser-independent decisions of the runtime.

use reflex_core::game::Task;
use reflex_core::report::ResultPayload;

/// Whether listeners of removed targets may be dropped before running
/// `task`. Clicks remove targets from inside their own listener, so only
/// tasks that never run in a click callback qualify. Expiries keep going
/// after game over, when frames have stopped.
pub fn releases_listeners(task: Task) -> bool {
    matches!(task, Task::Frame | Task::Expire(_))
}

/// Console line for a result the service never accepted.
pub fn undelivered_notice(payload: &ResultPayload) -> String {
    format!(
        "Results not delivered ({} hits, {} combos in {:.1}s); reloading",
        payload.hits, payload.combos, payload.duration
    )
}
