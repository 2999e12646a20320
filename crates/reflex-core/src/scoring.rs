/// Seconds the results service credits as "left over" for a run of
/// `duration_secs` in a game of `game_secs`.
pub fn time_left(duration_secs: f64, game_secs: f64) -> f64 {
    (game_secs - duration_secs).max(0.0)
}

/// Final score as computed by the results service.
///
/// Scoring rules:
/// - Each hit: +10
/// - Each combo: +5
/// - Each whole second left on the clock: +1
pub fn compute_score(hits: u32, combos: u32, time_left_secs: f64) -> u32 {
    let bonus = time_left_secs.max(0.0).floor() as u32;
    hits.saturating_mul(10)
        .saturating_add(combos.saturating_mul(5))
        .saturating_add(bonus)
}
