//! Uniform buffer serialization: an aligned byte writer and the per-frame
//! scene data layout built on top of it.
//!
//! The CPU-side layout here is the wire format the shaders consume. Scalars
//! are 4-byte aligned, 3-component vectors occupy a full 16-byte slot, and
//! matrices are four 16-byte columns, matching uniform-block packing rules.
//!
//! # Invariants
//! - A buffer's `head` never exceeds its capacity; an append that would not
//!   fit panics instead of truncating.
//! - After `align_head(a)`, `head % a == 0` and `head` has not decreased.
//! - Per-entity records start at offsets aligned to the device-reported
//!   uniform offset alignment and keep those offsets for the whole session.

mod buffer;
mod writer;

pub use buffer::{AlignedBuffer, BufferUsage, WriteMode, WriteScope};
pub use writer::{
    SceneUniformWriter, UniformError, ENTITY_RECORD_SIZE, LIGHT_STRIDE, MAX_LIGHTS,
};
