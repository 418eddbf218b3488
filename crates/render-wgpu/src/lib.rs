//! wgpu forward renderer.
//!
//! Binds the byte layouts produced by `lantern-uniform` without reinterpreting
//! them: group 0 is the global block (camera + lights), group 1 is the
//! per-entity block bound 128 bytes at a time through a dynamic offset, and
//! group 2 is the material's albedo texture.
//!
//! # Invariants
//! - The renderer never mutates scene state; it reads entities and uploads
//!   only the byte ranges the uniform writer marked dirty.
//! - Entity dynamic offsets come straight from the writer's bookkeeping; the
//!   renderer performs no offset arithmetic of its own.
//! - Meshes missing a required vertex attribute are rejected at upload time,
//!   never at draw time.

mod error;
mod gpu;
mod shaders;

pub use error::RenderError;
pub use gpu::{device_limits, ForwardRenderer};
