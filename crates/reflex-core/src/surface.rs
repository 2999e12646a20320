use serde::{Deserialize, Serialize};

use crate::target::TargetId;

/// Top-left corner of an entity, in CSS pixels relative to the play area.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Size of the play area in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether a square of side `size` at `pos` lies entirely inside.
    pub fn contains_square(&self, pos: Position, size: f64) -> bool {
        pos.x >= 0.0 && pos.y >= 0.0 && pos.x + size <= self.width && pos.y + size <= self.height
    }
}

/// HUD text fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Score,
    Combo,
    Time,
}

/// Display/input adapter the game draws through.
///
/// The browser implementation maps entities to DOM elements; tests use
/// `test_helpers::RecordingSurface`. Calls are assumed to succeed.
pub trait Surface {
    /// Opaque reference to a visual entity.
    type Handle;

    /// Current play-area bounds. Must be re-read on every call, never cached.
    fn bounds(&self) -> Bounds;

    fn create_entity(&mut self, position: Position, size: f64) -> Self::Handle;

    fn remove_entity(&mut self, handle: &Self::Handle);

    fn set_text(&mut self, field: Field, value: &str);

    /// Route clicks on `handle` back to the game as hits on `target`.
    fn subscribe_click(&mut self, handle: &Self::Handle, target: TargetId);
}
