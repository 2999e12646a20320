/// Monotonic timestamp in milliseconds: `performance.now()` in the browser,
/// the virtual clock in tests.
pub type Millis = f64;

/// Seconds elapsed between two timestamps. Never negative.
pub fn elapsed_secs(start: Millis, now: Millis) -> f64 {
    ((now - start) / 1000.0).max(0.0)
}

/// Countdown text as shown in the HUD, one decimal place.
pub fn format_countdown(remaining_secs: f64) -> String {
    format!("{:.1}", remaining_secs.max(0.0))
}
