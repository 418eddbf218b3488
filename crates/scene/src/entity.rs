use glam::Mat4;
use lantern_common::{ModelHandle, TextureHandle};

/// A placed scene object.
///
/// `buffer_offset`/`buffer_size` locate this entity's record inside the
/// per-entity uniform buffer. They are zero until the uniform writer assigns
/// them and are stable for the rest of the session afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entity {
    pub world: Mat4,
    pub model: ModelHandle,
    /// Used when the model's material carries no albedo texture.
    pub fallback_texture: TextureHandle,
    pub buffer_offset: u32,
    pub buffer_size: u32,
}

impl Entity {
    pub fn new(world: Mat4, model: ModelHandle, fallback_texture: TextureHandle) -> Self {
        Self {
            world,
            model,
            fallback_texture,
            buffer_offset: 0,
            buffer_size: 0,
        }
    }
}

/// Ordered, append-only entity storage.
///
/// Creation order is serialization order; entities are never reordered, which
/// keeps their uniform buffer offsets valid for the whole session.
#[derive(Debug, Clone, Default)]
pub struct EntitySet {
    entities: Vec<Entity>,
}

impl EntitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity; returns its index in creation order.
    pub fn spawn(&mut self, world: Mat4, model: ModelHandle, fallback_texture: TextureHandle) -> usize {
        self.entities.push(Entity::new(world, model, fallback_texture));
        self.entities.len() - 1
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Entity> {
        self.entities.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Entity> {
        self.entities.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut()
    }
}
