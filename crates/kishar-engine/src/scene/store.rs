use glam::Mat4;

use crate::time::FrameTime;

/// Opaque entity identifier.
///
/// Identifiers are unique per [`Scene`] and never reused.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

/// Scene update behavior.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    /// When enabled, every update tick creates one brand-new entity with a
    /// fresh identity transform. The store grows without bound; this mirrors
    /// a stress-test behavior and is off unless explicitly requested.
    pub spawn_per_tick: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            spawn_per_tick: false,
        }
    }
}

/// Flat entity store with a single component type: a 4×4 transform.
///
/// Transforms are visited in insertion order; no ordering is promised beyond
/// "each transform-carrying entity exactly once per pass".
#[derive(Debug, Default)]
pub struct Scene {
    next_id: u64,
    entities: Vec<EntityId>,
    transforms: Vec<(EntityId, Mat4)>,
    config: SceneConfig,
    ticks: u64,
}

impl Scene {
    pub fn new(config: SceneConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Creates a new entity with no components.
    pub fn create_entity(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.entities.push(id);
        id
    }

    /// Attaches a transform to `id`, replacing any existing one.
    pub fn attach_transform(&mut self, id: EntityId, transform: Mat4) {
        if let Some(slot) = self.transforms.iter_mut().find(|(e, _)| *e == id) {
            slot.1 = transform;
            return;
        }
        self.transforms.push((id, transform));
    }

    /// Visits every transform-carrying entity exactly once.
    ///
    /// Entities without a transform are never visited.
    pub fn for_each_transform(&mut self, mut f: impl FnMut(EntityId, &mut Mat4)) {
        for (id, transform) in &mut self.transforms {
            f(*id, transform);
        }
    }

    /// Runs one update tick: optionally spawns a fresh entity, then touches
    /// every transform in the store.
    pub fn update(&mut self, time: &FrameTime) {
        if self.config.spawn_per_tick {
            let id = self.create_entity();
            self.attach_transform(id, Mat4::IDENTITY);
        }

        let mut visited = 0usize;
        self.for_each_transform(|_, _| visited += 1);

        self.ticks += 1;
        log::trace!(
            "scene update t={:.3}s entities={} transforms={}",
            time.since_start,
            self.entities.len(),
            visited,
        );
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn transform_count(&self) -> usize {
        self.transforms.len()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
