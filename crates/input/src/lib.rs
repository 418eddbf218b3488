//! Per-frame input snapshot consumed by the camera.
//!
//! The platform layer (winit, in the desktop app) translates raw events into
//! this snapshot; the camera never sees platform key codes.
//!
//! # Invariants
//! - Scroll is an edge-triggered accumulator: reading it clears it, so one
//!   scroll delta is consumed exactly once.
//! - Mouse deltas and key-press edges are valid for one frame and cleared by
//!   `end_frame`.

mod frame;

pub use frame::{InputFrame, Key};
