use serde::{Deserialize, Serialize};

use crate::time::Millis;

/// Running score. Counters only ever grow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreState {
    pub hits: u32,
    pub combos: u32,
    pub last_hit_time: Option<Millis>,
}

/// Result of registering a single hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitOutcome {
    pub hits: u32,
    pub combos: u32,
    /// Whether this hit continued a combo.
    pub combo: bool,
}

impl ScoreState {
    /// Count a hit at `now`. The combo window is inclusive: a hit exactly
    /// `combo_window_ms` after the previous one still continues the combo.
    pub fn register_hit(&mut self, now: Millis, combo_window_ms: f64) -> HitOutcome {
        self.hits = self.hits.saturating_add(1);
        let combo = self
            .last_hit_time
            .is_some_and(|last| now - last <= combo_window_ms);
        if combo {
            self.combos = self.combos.saturating_add(1);
        }
        self.last_hit_time = Some(now);
        HitOutcome {
            hits: self.hits,
            combos: self.combos,
            combo,
        }
    }
}
