use std::collections::HashSet;

/// Semantic movement keys, mapped from platform key codes by the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
    /// Movement speed doubler (held).
    Boost,
}

/// Input state for one frame.
#[derive(Debug, Clone, Default)]
pub struct InputFrame {
    /// Seconds since the previous frame.
    pub dt: f32,
    /// Mouse movement since the previous frame, in pixels.
    pub mouse_dx: f32,
    pub mouse_dy: f32,
    /// Right mouse button: free-look rotation.
    pub rotate_held: bool,
    /// Middle mouse button: orbit around the camera target.
    pub orbit_held: bool,
    scroll: f32,
    held: HashSet<Key>,
    recenter_pressed: bool,
}

impl InputFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate mouse movement (multiple events can land in one frame).
    pub fn add_mouse_delta(&mut self, dx: f32, dy: f32) {
        self.mouse_dx += dx;
        self.mouse_dy += dy;
    }

    /// Accumulate scroll ticks.
    pub fn add_scroll(&mut self, ticks: f32) {
        self.scroll += ticks;
    }

    /// Consume the scroll accumulator. Clears it, so a second read in the
    /// same frame sees zero.
    pub fn take_scroll(&mut self) -> f32 {
        std::mem::take(&mut self.scroll)
    }

    /// Peek at the accumulator without consuming it (debug UI only).
    pub fn scroll(&self) -> f32 {
        self.scroll
    }

    pub fn set_key(&mut self, key: Key, pressed: bool) {
        if pressed {
            self.held.insert(key);
        } else {
            self.held.remove(&key);
        }
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn any_movement_key_held(&self) -> bool {
        use Key::*;
        [Forward, Backward, Left, Right, Up, Down]
            .iter()
            .any(|k| self.held.contains(k))
    }

    /// Record the recenter key press (edge, not level).
    pub fn press_recenter(&mut self) {
        tracing::debug!("recenter requested");
        self.recenter_pressed = true;
    }

    pub fn recenter_pressed(&self) -> bool {
        self.recenter_pressed
    }

    /// Clear per-frame deltas and edges. Held keys and button levels persist.
    pub fn end_frame(&mut self) {
        self.mouse_dx = 0.0;
        self.mouse_dy = 0.0;
        self.scroll = 0.0;
        self.recenter_pressed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_is_cleared_on_read() {
        let mut input = InputFrame::new();
        input.add_scroll(2.0);
        input.add_scroll(1.0);
        assert_eq!(input.take_scroll(), 3.0);
        assert_eq!(input.take_scroll(), 0.0);
    }

    #[test]
    fn end_frame_clears_deltas_but_not_held_keys() {
        let mut input = InputFrame::new();
        input.add_mouse_delta(4.0, -2.0);
        input.set_key(Key::Forward, true);
        input.press_recenter();
        input.end_frame();
        assert_eq!(input.mouse_dx, 0.0);
        assert_eq!(input.mouse_dy, 0.0);
        assert!(!input.recenter_pressed());
        assert!(input.is_held(Key::Forward));
    }

    #[test]
    fn key_release_removes_from_held_set() {
        let mut input = InputFrame::new();
        input.set_key(Key::Boost, true);
        assert!(input.is_held(Key::Boost));
        input.set_key(Key::Boost, false);
        assert!(!input.is_held(Key::Boost));
        assert!(!input.any_movement_key_held());
    }

    #[test]
    fn mouse_deltas_accumulate_within_a_frame() {
        let mut input = InputFrame::new();
        input.add_mouse_delta(1.0, 1.0);
        input.add_mouse_delta(2.0, -0.5);
        assert_eq!(input.mouse_dx, 3.0);
        assert_eq!(input.mouse_dy, 0.5);
    }
}
