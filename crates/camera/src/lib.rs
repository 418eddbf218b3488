//! Camera: position + orthonormal orientation triple, updated from per-frame
//! input and exposing view/projection matrices.
//!
//! # Invariants
//! - `forward`, `up`, `right` are mutually orthogonal unit vectors after
//!   every update.
//! - Pitch stays strictly inside (-89°, 89°); the forward vector can never
//!   reach straight up or down.
//! - Public matrix getters always return values consistent with the current
//!   pose; the change flag is an upload signal, not a staleness excuse.

mod camera;

pub use camera::Camera;
