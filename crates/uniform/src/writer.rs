use glam::{Mat4, Vec3};
use lantern_common::GpuLimits;
use lantern_scene::{Entity, EntitySet, LightSet};

use crate::buffer::{AlignedBuffer, BufferUsage, WriteMode};

/// Most lights one frame can carry. Must match the shader's light array
/// length.
pub const MAX_LIGHTS: usize = 16;

/// Bytes per serialized light: kind tag slot, color, direction, position,
/// each in a 16-byte slot.
pub const LIGHT_STRIDE: usize = 64;

/// Bytes per entity record: world matrix plus the combined
/// view-projection-times-world matrix.
pub const ENTITY_RECORD_SIZE: u32 = 128;

/// Light records start here: camera position slot plus the count scalar,
/// rounded up to the per-light alignment.
const LIGHTS_BASE_OFFSET: usize = 32;

const GLOBAL_CAPACITY: usize = LIGHTS_BASE_OFFSET + MAX_LIGHTS * LIGHT_STRIDE;

/// Buffer sizing failures at startup. Overflow during a frame is a sizing
/// bug and panics in the buffer layer instead.
#[derive(Debug, thiserror::Error)]
pub enum UniformError {
    #[error("global uniform block needs {needed} bytes but the device caps blocks at {limit}")]
    GlobalBlockTooLarge { needed: u32, limit: u32 },
    #[error("entity record of {record} bytes exceeds the device block limit {limit}")]
    EntityRecordTooLarge { record: u32, limit: u32 },
}

/// Serializes the scene into the two uniform buffers the renderer binds:
/// one global block (camera position + light list) and one per-entity
/// block region (two matrices per entity, records aligned to the device's
/// uniform offset alignment).
///
/// Entity offsets are assigned exactly once, by `rewrite_entities`, and
/// stay fixed for the session; later frames patch records in place.
#[derive(Debug)]
pub struct SceneUniformWriter {
    limits: GpuLimits,
    global: AlignedBuffer,
    entities: AlignedBuffer,
}

impl SceneUniformWriter {
    /// Size both buffers from the device-reported limits. The global block
    /// must fit in a single binding; the entity buffer spends the whole
    /// maximum block size, bound 128 bytes at a time via dynamic offsets.
    pub fn new(limits: GpuLimits) -> Result<Self, UniformError> {
        if GLOBAL_CAPACITY as u32 > limits.max_uniform_block_size {
            return Err(UniformError::GlobalBlockTooLarge {
                needed: GLOBAL_CAPACITY as u32,
                limit: limits.max_uniform_block_size,
            });
        }
        if ENTITY_RECORD_SIZE > limits.max_uniform_block_size {
            return Err(UniformError::EntityRecordTooLarge {
                record: ENTITY_RECORD_SIZE,
                limit: limits.max_uniform_block_size,
            });
        }
        tracing::info!(
            global_capacity = GLOBAL_CAPACITY,
            entity_capacity = limits.max_uniform_block_size,
            alignment = limits.uniform_offset_alignment,
            "scene uniform writer ready"
        );
        Ok(Self {
            limits,
            global: AlignedBuffer::allocate(GLOBAL_CAPACITY, BufferUsage::Stream),
            entities: AlignedBuffer::allocate(
                limits.max_uniform_block_size as usize,
                BufferUsage::Stream,
            ),
        })
    }

    pub fn limits(&self) -> GpuLimits {
        self.limits
    }

    /// How many entity records fit given the alignment-rounded stride.
    pub fn max_entities(&self) -> usize {
        let stride = ENTITY_RECORD_SIZE.max(self.limits.uniform_offset_alignment) as usize;
        self.entities.capacity() / stride
    }

    /// Fully replace the global block: camera position, light count, then
    /// each light as (kind, color, direction, position). Both direction and
    /// position are always serialized so every light occupies the same
    /// stride.
    pub fn rewrite_global(&mut self, camera_position: Vec3, lights: &LightSet) {
        assert!(
            lights.len() <= MAX_LIGHTS,
            "{} lights exceed the buffer's capacity for {MAX_LIGHTS}",
            lights.len()
        );
        let mut scope = self.global.begin_write(WriteMode::Replace);
        scope.push_vec3(camera_position);
        scope.push_u32(lights.len() as u32);
        for light in lights.iter() {
            scope.align_head(16);
            scope.push_u32(light.kind.gpu_tag());
            scope.push_vec3(light.color);
            scope.push_vec3(light.direction);
            scope.push_vec3(light.position);
        }
    }

    /// Fully replace the entity buffer and assign each entity its record
    /// offset. This is the only place offsets are assigned; creation order
    /// is record order.
    pub fn rewrite_entities(&mut self, entities: &mut EntitySet, view_projection: Mat4) {
        let mut scope = self.entities.begin_write(WriteMode::Replace);
        for entity in entities.iter_mut() {
            scope.align_head(self.limits.uniform_offset_alignment as usize);
            let offset = scope.head();
            scope.push_mat4(&entity.world);
            scope.push_mat4(&(view_projection * entity.world));
            entity.buffer_offset = offset as u32;
            entity.buffer_size = ENTITY_RECORD_SIZE;
        }
        tracing::debug!(count = entities.len(), "entity buffer rewritten");
    }

    /// Re-derive only the combined matrix of one entity's record. The world
    /// matrix half is left untouched.
    pub fn patch_entity_transform(&mut self, entity: &Entity, view_projection: Mat4) {
        let combined = view_projection * entity.world;
        let mut scope = self.entities.begin_write(WriteMode::Append);
        scope.write_at(
            entity.buffer_offset as usize + 64,
            bytemuck::bytes_of(&combined),
        );
    }

    /// Patch every entity's combined matrix after a camera move.
    pub fn patch_all(&mut self, entities: &EntitySet, view_projection: Mat4) {
        for entity in entities.iter() {
            self.patch_entity_transform(entity, view_projection);
        }
    }

    pub fn global_bytes(&self) -> &[u8] {
        self.global.bytes()
    }

    pub fn global_head(&self) -> usize {
        self.global.head()
    }

    pub fn entity_bytes(&self) -> &[u8] {
        self.entities.bytes()
    }

    pub fn take_global_dirty(&mut self) -> Option<std::ops::Range<usize>> {
        self.global.take_dirty()
    }

    pub fn take_entity_dirty(&mut self) -> Option<std::ops::Range<usize>> {
        self.entities.take_dirty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lantern_common::{ModelHandle, TextureHandle};
    use lantern_scene::Light;

    fn two_light_set() -> LightSet {
        let mut set = LightSet::new();
        set.replace_all(vec![
            Light::directional("sun", Vec3::new(0.9, 0.85, 0.7), Vec3::new(-0.5, -1.0, 0.2)),
            Light::point("fill", Vec3::new(0.8, 0.6, 0.4), Vec3::new(2.0, 1.5, 2.0)),
        ]);
        set
    }

    fn read_f32(bytes: &[u8], offset: usize) -> f32 {
        f32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    fn read_u32(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    #[test]
    fn global_block_layout_for_two_lights() {
        let mut writer = SceneUniformWriter::new(GpuLimits::default()).unwrap();
        let camera = Vec3::new(0.0, 3.5, -18.0);
        writer.rewrite_global(camera, &two_light_set());

        let bytes = writer.global_bytes();
        // Camera position in the first 16-byte slot.
        assert_eq!(read_f32(bytes, 0), 0.0);
        assert_eq!(read_f32(bytes, 4), 3.5);
        assert_eq!(read_f32(bytes, 8), -18.0);
        // Light count right after it.
        assert_eq!(read_u32(bytes, 16), 2);
        // First light at the 16-aligned base: kind, then color.
        assert_eq!(read_u32(bytes, 32), 0);
        assert_eq!(read_f32(bytes, 48), 0.9);
        // Second light one stride later; its color slot sits at 112.
        assert_eq!(read_u32(bytes, 96), 1);
        assert_eq!(read_f32(bytes, 112), 0.8);
        assert_eq!(read_f32(bytes, 116), 0.6);
        assert_eq!(read_f32(bytes, 120), 0.4);
        // Point light position in the last slot of its record.
        assert_eq!(read_f32(bytes, 144), 2.0);
        // Head covers camera slot + count slot + two full light strides.
        assert_eq!(writer.global_head(), 32 + 2 * LIGHT_STRIDE);
    }

    #[test]
    fn rewrite_global_is_idempotent() {
        let mut writer = SceneUniformWriter::new(GpuLimits::default()).unwrap();
        let camera = Vec3::new(1.0, 2.0, 3.0);
        let lights = LightSet::default_rig();

        writer.rewrite_global(camera, &lights);
        let first = writer.global_bytes().to_vec();
        writer.rewrite_global(camera, &lights);
        assert_eq!(writer.global_bytes(), &first[..]);
    }

    #[test]
    fn entity_offsets_are_aligned_and_increasing() {
        let mut writer = SceneUniformWriter::new(GpuLimits::default()).unwrap();
        let mut entities = EntitySet::new();
        for i in 0..4 {
            entities.spawn(
                Mat4::from_translation(Vec3::new(i as f32 * 5.0, 0.0, 0.0)),
                ModelHandle(0),
                TextureHandle(0),
            );
        }
        writer.rewrite_entities(&mut entities, Mat4::IDENTITY);

        let mut last = None;
        for entity in entities.iter() {
            assert_eq!(entity.buffer_offset % 256, 0);
            assert_eq!(entity.buffer_size, ENTITY_RECORD_SIZE);
            if let Some(prev) = last {
                assert!(entity.buffer_offset > prev);
            }
            last = Some(entity.buffer_offset);
        }
    }

    #[test]
    fn entity_record_round_trips_both_matrices() {
        let mut writer = SceneUniformWriter::new(GpuLimits::default()).unwrap();
        let mut entities = EntitySet::new();
        let world = Mat4::from_translation(Vec3::new(5.0, 0.0, -5.0));
        entities.spawn(world, ModelHandle(0), TextureHandle(0));

        let view_proj = Mat4::perspective_rh(1.0, 1.5, 0.1, 100.0)
            * Mat4::look_at_rh(Vec3::new(0.0, 3.0, -10.0), Vec3::ZERO, Vec3::Y);
        writer.rewrite_entities(&mut entities, view_proj);

        let offset = entities.get(0).unwrap().buffer_offset as usize;
        let bytes = writer.entity_bytes();
        let world_back: Mat4 = bytemuck::pod_read_unaligned(&bytes[offset..offset + 64]);
        let combined_back: Mat4 = bytemuck::pod_read_unaligned(&bytes[offset + 64..offset + 128]);
        assert_eq!(world_back, world);
        assert_eq!(combined_back, view_proj * world);
    }

    #[test]
    fn patch_rewrites_only_the_combined_matrix() {
        let mut writer = SceneUniformWriter::new(GpuLimits::default()).unwrap();
        let mut entities = EntitySet::new();
        let world = Mat4::from_rotation_y(0.7);
        entities.spawn(world, ModelHandle(0), TextureHandle(0));
        writer.rewrite_entities(&mut entities, Mat4::IDENTITY);
        writer.take_entity_dirty();

        let moved = Mat4::perspective_rh(1.2, 1.0, 0.1, 500.0);
        let entity = *entities.get(0).unwrap();
        writer.patch_entity_transform(&entity, moved);

        let offset = entity.buffer_offset as usize;
        let bytes = writer.entity_bytes();
        let world_back: Mat4 = bytemuck::pod_read_unaligned(&bytes[offset..offset + 64]);
        let combined_back: Mat4 = bytemuck::pod_read_unaligned(&bytes[offset + 64..offset + 128]);
        assert_eq!(world_back, world);
        assert_eq!(combined_back, moved * world);
        // Only the second matrix's span is dirty.
        assert_eq!(writer.take_entity_dirty(), Some(offset + 64..offset + 128));
    }

    #[test]
    fn writer_rejects_a_device_that_cannot_fit_the_global_block() {
        // 256-byte blocks pass the raw limits check but cannot hold the
        // light array.
        let limits = GpuLimits::new(256, 256).unwrap();
        assert!(matches!(
            SceneUniformWriter::new(limits),
            Err(UniformError::GlobalBlockTooLarge { .. })
        ));
    }

    #[test]
    fn max_entities_follows_the_alignment_stride() {
        let writer = SceneUniformWriter::new(GpuLimits::default()).unwrap();
        // 64 KiB / 256-byte stride.
        assert_eq!(writer.max_entities(), 256);
    }
}
