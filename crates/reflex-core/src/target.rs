use std::collections::BTreeMap;

use crate::surface::Position;
use crate::time::Millis;

/// Identifier of a spawned target, unique within a session.
pub type TargetId = u64;

/// A transient clickable entity. `H` is the surface's handle type.
#[derive(Debug, Clone)]
pub struct Target<H> {
    pub id: TargetId,
    pub position: Position,
    pub spawn_time: Millis,
    pub lifetime_ms: f64,
    pub handle: H,
}

/// Targets currently on screen.
///
/// A target leaves the set exactly once; later removals of the same id
/// return `None` so callers can treat them as no-ops.
#[derive(Debug)]
pub struct TargetSet<H> {
    live: BTreeMap<TargetId, Target<H>>,
    next_id: TargetId,
    spawned: u64,
}

impl<H> Default for TargetSet<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> TargetSet<H> {
    pub fn new() -> Self {
        Self {
            live: BTreeMap::new(),
            next_id: 1,
            spawned: 0,
        }
    }

    /// Reserve the id for the next target.
    pub fn allocate_id(&mut self) -> TargetId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn insert(&mut self, target: Target<H>) {
        self.spawned += 1;
        self.live.insert(target.id, target);
    }

    pub fn remove(&mut self, id: TargetId) -> Option<Target<H>> {
        self.live.remove(&id)
    }

    pub fn get(&self, id: TargetId) -> Option<&Target<H>> {
        self.live.get(&id)
    }

    pub fn contains(&self, id: TargetId) -> bool {
        self.live.contains_key(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = TargetId> + '_ {
        self.live.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Total targets ever inserted this session.
    pub fn spawned(&self) -> u64 {
        self.spawned
    }
}
