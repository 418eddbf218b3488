//! Asset tables: meshes, models, materials, textures.
//!
//! Assets live in ordered tables addressed by index handles. The renderer
//! consumes assets by handle, never by raw file paths. Importing from model
//! files is an external collaborator's job; this crate only defines the
//! descriptors the renderer needs plus a few procedural defaults.
//!
//! # Invariants
//! - Tables are append-only; a handle handed out stays valid for the session.
//! - Submesh vertex data is interleaved floats matching the submesh layout.

mod mesh;
mod store;

pub use mesh::{
    ATTR_NORMAL, ATTR_POSITION, ATTR_UV, Mesh, Submesh, VertexAttribute, VertexLayout, unit_cube,
};
pub use store::{AssetError, AssetStore, Material, Model, TextureDesc};
