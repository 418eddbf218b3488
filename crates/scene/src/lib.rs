//! Scene data: ordered light and entity collections.
//!
//! Both collections are plain ordered storage mutated by the application and
//! consulted by the uniform writer; neither owns any GPU state.
//!
//! # Invariants
//! - Lights are replaced as a whole list, never edited in place.
//! - Entities are append-only within a session; their buffer offsets, once
//!   assigned by the uniform writer, never move.

mod entity;
mod light;

pub use entity::{Entity, EntitySet};
pub use light::{Light, LightKind, LightSet};
