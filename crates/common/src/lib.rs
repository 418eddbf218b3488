//! Shared types: asset handles and the device-reported GPU limits.
//!
//! # Invariants
//! - Handles are plain indices into ordered tables; they never outlive the
//!   session that produced them.
//! - `GpuLimits::uniform_offset_alignment` is a power of two.

mod limits;
mod types;

pub use limits::{GpuLimits, LimitsError};
pub use types::{MaterialHandle, MeshHandle, ModelHandle, TextureHandle};
