use glam::{Mat4, Quat, Vec3};
use lantern_input::{InputFrame, Key};

const WORLD_UP: Vec3 = Vec3::Y;

/// Keeps pitch strictly inside the open (-89°, 89°) interval so the forward
/// vector never degenerates against world-up.
const PITCH_LIMIT_DEG: f32 = 89.0 - 0.01;

const HOME_POSITION: Vec3 = Vec3::new(0.0, 3.5, -18.0);
const HOME_YAW_DEG: f32 = 90.0;
const HOME_PITCH_DEG: f32 = 0.0;

/// Free-look/orbit camera.
///
/// One instance lives for the whole session. `update` consumes the frame's
/// input deltas in fixed priority order (rotation, zoom, movement, recenter)
/// and returns whether the pose changed, which is the caller's cue to push
/// fresh uniform data.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    forward: Vec3,
    up: Vec3,
    right: Vec3,
    /// Degrees. Converted to radians only at trig call sites.
    yaw: f32,
    pitch: f32,
    /// Orbit pivot.
    target: Vec3,

    fov_y: f32,
    aspect: f32,
    near: f32,
    far: f32,

    view: Mat4,
    projection: Mat4,

    /// Degrees of rotation per pixel of mouse travel.
    rotate_sensitivity: f32,
    /// World units per second of key movement.
    move_speed: f32,
    /// World units per scroll tick.
    zoom_speed: f32,

    components_changed: bool,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(16.0 / 9.0)
    }
}

impl Camera {
    pub fn new(aspect: f32) -> Self {
        let mut cam = Self {
            position: HOME_POSITION,
            forward: Vec3::Z,
            up: WORLD_UP,
            right: Vec3::NEG_X,
            yaw: HOME_YAW_DEG,
            pitch: HOME_PITCH_DEG,
            target: Vec3::ZERO,
            fov_y: 60.0_f32.to_radians(),
            aspect,
            near: 0.1,
            far: 1000.0,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            rotate_sensitivity: 0.15,
            move_speed: 10.0,
            zoom_speed: 2.0,
            components_changed: false,
        };
        cam.update_vectors();
        cam.refresh_view();
        cam.refresh_projection();
        cam
    }

    // --- Accessors ---

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn yaw_deg(&self) -> f32 {
        self.yaw
    }

    pub fn pitch_deg(&self) -> f32 {
        self.pitch
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    // --- Projection parameters ---

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.refresh_projection();
        self.components_changed = true;
    }

    pub fn set_vertical_fov(&mut self, fov_y: f32) {
        self.fov_y = fov_y;
        self.refresh_projection();
        self.components_changed = true;
    }

    pub fn set_zoom_speed(&mut self, units_per_tick: f32) {
        self.zoom_speed = units_per_tick;
    }

    /// Apply one frame of input. Returns true if the pose or projection
    /// changed and the scene uniforms need a refresh.
    ///
    /// Behaviors run in fixed priority order; rotation and translation are
    /// independent and can both apply within the same frame.
    pub fn update(&mut self, input: &mut InputFrame) -> bool {
        let has_mouse_delta = input.mouse_dx != 0.0 || input.mouse_dy != 0.0;
        if input.rotate_held && has_mouse_delta {
            self.rotate(input.mouse_dx, input.mouse_dy);
        } else if input.orbit_held && has_mouse_delta {
            self.orbit(input.mouse_dx, input.mouse_dy);
        }

        let scroll = input.take_scroll();
        if scroll != 0.0 {
            self.dolly(scroll);
        }

        if input.any_movement_key_held() {
            self.fly(input);
        }

        if input.recenter_pressed() {
            self.recenter();
        }

        let changed = self.components_changed;
        if changed {
            self.refresh_view();
            self.components_changed = false;
        }
        changed
    }

    /// Aim at a world point, re-deriving the orientation triple and backing
    /// yaw/pitch out of the new forward vector so incremental rotation stays
    /// consistent afterwards.
    pub fn look_at(&mut self, target: Vec3) {
        self.forward = (target - self.position).normalize();
        self.right = self.forward.cross(WORLD_UP).normalize();
        self.up = self.right.cross(self.forward).normalize();
        self.yaw = self.forward.z.atan2(self.forward.x).to_degrees();
        self.pitch = self
            .forward
            .y
            .asin()
            .to_degrees()
            .clamp(-PITCH_LIMIT_DEG, PITCH_LIMIT_DEG);
        self.components_changed = true;
        self.refresh_view();
    }

    // --- Per-frame behaviors ---

    /// Free-look: yaw about world-up, then pitch about the local right axis.
    fn rotate(&mut self, dx: f32, dy: f32) {
        let yaw_delta = dx * self.rotate_sensitivity;
        let pitch_delta = -dy * self.rotate_sensitivity;

        let yaw_rot = Quat::from_axis_angle(WORLD_UP, -yaw_delta.to_radians());
        let pitch_rot = Quat::from_axis_angle(self.right, pitch_delta.to_radians());

        let rotated_forward = (pitch_rot * (yaw_rot * self.forward)).normalize();
        let rotated_up = pitch_rot * (yaw_rot * self.up);

        if rotated_up.dot(WORLD_UP) < 0.0 {
            // Vertical rotation carried us past the pole: pin pitch at the
            // limit, keep the yaw we already had plus the horizontal part.
            self.yaw += yaw_delta;
            self.pitch = PITCH_LIMIT_DEG.copysign(self.pitch + pitch_delta);
        } else {
            self.yaw = rotated_forward.z.atan2(rotated_forward.x).to_degrees();
            self.pitch = rotated_forward
                .y
                .asin()
                .to_degrees()
                .clamp(-PITCH_LIMIT_DEG, PITCH_LIMIT_DEG);
        }

        self.update_vectors();
        self.components_changed = true;
    }

    /// Orbit variant: rotate the eye around the target, then re-aim at it.
    fn orbit(&mut self, dx: f32, dy: f32) {
        let yaw_delta = dx * self.rotate_sensitivity;
        let pitch_delta = -dy * self.rotate_sensitivity;

        let yaw_rot = Quat::from_axis_angle(WORLD_UP, -yaw_delta.to_radians());
        let pitch_rot = Quat::from_axis_angle(self.right, pitch_delta.to_radians());

        let mut offset = yaw_rot * (self.position - self.target);
        let pitched = pitch_rot * offset;
        let aim = (-pitched).normalize();
        if aim.y.asin().to_degrees().abs() < PITCH_LIMIT_DEG {
            offset = pitched;
        }
        self.position = self.target + offset;
        self.look_at(self.target);
    }

    /// Translate along forward, consuming the scroll accumulator's value.
    fn dolly(&mut self, ticks: f32) {
        self.position += self.forward * ticks * self.zoom_speed;
        self.components_changed = true;
    }

    /// Free-fly movement from held keys. Speed scales with frame time and
    /// doubles while Boost is held.
    fn fly(&mut self, input: &InputFrame) {
        let mut dir = Vec3::ZERO;
        if input.is_held(Key::Forward) {
            dir += self.forward;
        }
        if input.is_held(Key::Backward) {
            dir -= self.forward;
        }
        if input.is_held(Key::Right) {
            dir += self.right;
        }
        if input.is_held(Key::Left) {
            dir -= self.right;
        }
        if input.is_held(Key::Up) {
            dir += WORLD_UP;
        }
        if input.is_held(Key::Down) {
            dir -= WORLD_UP;
        }

        let dir = dir.normalize_or_zero();
        if dir == Vec3::ZERO {
            return;
        }
        let boost = if input.is_held(Key::Boost) { 2.0 } else { 1.0 };
        self.position += dir * self.move_speed * input.dt * boost;
        self.components_changed = true;
    }

    /// Jump back to the home pose, aimed at the world origin.
    fn recenter(&mut self) {
        tracing::debug!("camera recentered");
        self.position = HOME_POSITION;
        self.look_at(Vec3::ZERO);
    }

    // --- Derived state ---

    /// Rebuild the orthonormal triple from yaw/pitch.
    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.forward = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize();
        self.right = self.forward.cross(WORLD_UP).normalize();
        self.up = self.right.cross(self.forward).normalize();
    }

    fn refresh_view(&mut self) {
        self.view = Mat4::look_at_rh(self.position, self.position + self.forward, self.up);
    }

    fn refresh_projection(&mut self) {
        self.projection = Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn assert_orthonormal(cam: &Camera) {
        assert!((cam.forward().length() - 1.0).abs() < EPS);
        assert!((cam.up().length() - 1.0).abs() < EPS);
        assert!((cam.right().length() - 1.0).abs() < EPS);
        assert!(cam.forward().dot(cam.up()).abs() < EPS);
        assert!(cam.forward().dot(cam.right()).abs() < EPS);
        assert!(cam.up().dot(cam.right()).abs() < EPS);
    }

    #[test]
    fn initial_forward_from_yaw_and_pitch() {
        let cam = Camera::new(16.0 / 9.0);
        assert_eq!(cam.position(), Vec3::new(0.0, 3.5, -18.0));
        assert!((cam.forward() - Vec3::Z).length() < EPS);
        assert_orthonormal(&cam);
    }

    #[test]
    fn pitch_never_reaches_the_pole() {
        let mut cam = Camera::new(1.0);
        let mut input = InputFrame::new();
        input.rotate_held = true;
        for _ in 0..500 {
            input.add_mouse_delta(0.0, -50.0); // relentless pitch-up
            cam.update(&mut input);
            input.end_frame();
            assert!(cam.pitch_deg() > -89.0 && cam.pitch_deg() < 89.0);
            assert_orthonormal(&cam);
        }
        for _ in 0..500 {
            input.add_mouse_delta(0.0, 50.0); // and back down past the bottom
            cam.update(&mut input);
            input.end_frame();
            assert!(cam.pitch_deg() > -89.0 && cam.pitch_deg() < 89.0);
            assert_orthonormal(&cam);
        }
    }

    #[test]
    fn vectors_stay_orthonormal_through_mixed_rotation() {
        let mut cam = Camera::new(1.0);
        let mut input = InputFrame::new();
        input.rotate_held = true;
        let deltas = [(13.0, -7.0), (-40.0, 22.0), (5.0, 90.0), (-120.0, -60.0)];
        for _ in 0..50 {
            for (dx, dy) in deltas {
                input.add_mouse_delta(dx, dy);
                cam.update(&mut input);
                input.end_frame();
                assert_orthonormal(&cam);
            }
        }
    }

    #[test]
    fn scroll_dolly_consumes_the_accumulator() {
        let mut cam = Camera::new(1.0);
        cam.set_zoom_speed(2.0);
        let start = cam.position();
        let forward = cam.forward();

        let mut input = InputFrame::new();
        input.add_scroll(3.0);
        assert!(cam.update(&mut input));
        assert!((cam.position() - (start + forward * 6.0)).length() < EPS);

        // Next frame, no scroll: nothing moves and the accumulator reads 0.
        input.end_frame();
        let here = cam.position();
        assert!(!cam.update(&mut input));
        assert_eq!(cam.position(), here);
        assert_eq!(input.scroll(), 0.0);
    }

    #[test]
    fn keyed_movement_scales_with_dt_and_boost() {
        let mut cam = Camera::new(1.0);
        let start = cam.position();
        let forward = cam.forward();

        let mut input = InputFrame::new();
        input.dt = 0.5;
        input.set_key(Key::Forward, true);
        cam.update(&mut input);
        let plain = (cam.position() - start).length();
        assert!((cam.position() - (start + forward * 5.0)).length() < EPS);

        input.set_key(Key::Boost, true);
        cam.update(&mut input);
        let boosted = (cam.position() - (start + forward * plain)).length();
        assert!((boosted - plain * 2.0).abs() < EPS);
    }

    #[test]
    fn recenter_returns_home_and_aims_at_origin() {
        let mut cam = Camera::new(1.0);
        let mut input = InputFrame::new();
        input.dt = 1.0;
        input.set_key(Key::Left, true);
        input.set_key(Key::Up, true);
        cam.update(&mut input);
        input.set_key(Key::Left, false);
        input.set_key(Key::Up, false);
        assert_ne!(cam.position(), Vec3::new(0.0, 3.5, -18.0));

        input.press_recenter();
        assert!(cam.update(&mut input));
        assert_eq!(cam.position(), Vec3::new(0.0, 3.5, -18.0));
        let to_origin = (Vec3::ZERO - cam.position()).normalize();
        assert!((cam.forward() - to_origin).length() < EPS);
        assert!((cam.yaw_deg() - 90.0).abs() < EPS);
    }

    #[test]
    fn idle_frame_reports_no_change() {
        let mut cam = Camera::new(1.0);
        let mut input = InputFrame::new();
        input.dt = 0.016;
        assert!(!cam.update(&mut input));
    }

    #[test]
    fn view_matrix_tracks_the_pose() {
        let mut cam = Camera::new(1.0);
        let mut input = InputFrame::new();
        input.add_scroll(1.0);
        cam.update(&mut input);
        let expected = Mat4::look_at_rh(
            cam.position(),
            cam.position() + cam.forward(),
            cam.up(),
        );
        assert!((cam.view_matrix() - expected).abs_diff_eq(Mat4::ZERO, 1e-5));
    }

    #[test]
    fn rotation_and_translation_compose_in_one_frame() {
        let mut cam = Camera::new(1.0);
        let start = cam.position();
        let mut input = InputFrame::new();
        input.dt = 1.0;
        input.rotate_held = true;
        input.add_mouse_delta(100.0, 0.0);
        input.set_key(Key::Forward, true);
        assert!(cam.update(&mut input));
        // Both behaviors applied: yaw moved and position moved.
        assert!((cam.yaw_deg() - 90.0).abs() > 1.0);
        assert!((cam.position() - start).length() > 1.0);
    }

    #[test]
    fn orbit_keeps_distance_to_target() {
        let mut cam = Camera::new(1.0);
        let dist = cam.position().length();
        let mut input = InputFrame::new();
        input.orbit_held = true;
        input.add_mouse_delta(60.0, -15.0);
        assert!(cam.update(&mut input));
        assert!((cam.position().length() - dist).abs() < 1e-3);
        // Still aimed at the pivot.
        let to_target = (Vec3::ZERO - cam.position()).normalize();
        assert!((cam.forward() - to_target).length() < 1e-3);
        assert_orthonormal(&cam);
    }
}
