use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Light variants. The discriminants are the GPU-side tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightKind {
    Directional = 0,
    Point = 1,
}

impl LightKind {
    /// Tag serialized into the global uniform block.
    pub fn gpu_tag(self) -> u32 {
        self as u32
    }
}

/// A single light.
///
/// Both `direction` and `position` are always carried (and always serialized,
/// for a uniform per-light stride); consumers read the one that matches the
/// kind and ignore the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub name: String,
    pub kind: LightKind,
    pub color: Vec3,
    pub direction: Vec3,
    pub position: Vec3,
}

impl Light {
    /// A directional light. The direction is normalized on construction.
    pub fn directional(name: impl Into<String>, color: Vec3, direction: Vec3) -> Self {
        Self {
            name: name.into(),
            kind: LightKind::Directional,
            color,
            direction: direction.normalize(),
            position: Vec3::ZERO,
        }
    }

    /// A point light at a world position.
    pub fn point(name: impl Into<String>, color: Vec3, position: Vec3) -> Self {
        Self {
            name: name.into(),
            kind: LightKind::Point,
            color,
            direction: Vec3::NEG_Y,
            position,
        }
    }
}

/// Ordered list of lights, replaced wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LightSet {
    lights: Vec<Light>,
}

impl LightSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole list. Lights are never removed individually.
    pub fn replace_all(&mut self, lights: Vec<Light>) {
        tracing::debug!(count = lights.len(), "light set replaced");
        self.lights = lights;
    }

    pub fn iter(&self) -> impl Iterator<Item = &Light> {
        self.lights.iter()
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    /// The stock demo rig: a warm sun, a cool rim, and one point fill.
    pub fn default_rig() -> Self {
        let mut set = Self::new();
        set.replace_all(vec![
            Light::directional("sun", Vec3::new(0.9, 0.85, 0.7), Vec3::new(-0.5, -1.0, 0.2)),
            Light::directional("rim", Vec3::new(0.15, 0.2, 0.3), Vec3::new(0.7, -0.3, -0.6)),
            Light::point("fill", Vec3::new(0.8, 0.6, 0.4), Vec3::new(2.0, 1.5, 2.0)),
        ]);
        set
    }

    /// A flat grid of point lights for stressing the serializer and shader.
    pub fn stress_grid(rows: u32, cols: u32, spacing: f32) -> Self {
        let mut lights = Vec::with_capacity((rows * cols) as usize);
        for r in 0..rows {
            for c in 0..cols {
                let x = (c as f32 - (cols as f32 - 1.0) / 2.0) * spacing;
                let z = (r as f32 - (rows as f32 - 1.0) / 2.0) * spacing;
                lights.push(Light::point(
                    format!("grid_{r}_{c}"),
                    Vec3::new(0.6, 0.6, 0.9),
                    Vec3::new(x, 2.0, z),
                ));
            }
        }
        let mut set = Self::new();
        set.replace_all(lights);
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpu_tags_are_stable() {
        assert_eq!(LightKind::Directional.gpu_tag(), 0);
        assert_eq!(LightKind::Point.gpu_tag(), 1);
    }

    #[test]
    fn directional_normalizes_direction() {
        let l = Light::directional("sun", Vec3::ONE, Vec3::new(0.0, -2.0, 0.0));
        assert!((l.direction.length() - 1.0).abs() < 1e-6);
        assert_eq!(l.direction, Vec3::NEG_Y);
    }

    #[test]
    fn default_rig_has_three_lights() {
        let rig = LightSet::default_rig();
        assert_eq!(rig.len(), 3);
        let kinds: Vec<LightKind> = rig.iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![LightKind::Directional, LightKind::Directional, LightKind::Point]
        );
    }

    #[test]
    fn stress_grid_count_and_placement() {
        let grid = LightSet::stress_grid(4, 4, 5.0);
        assert_eq!(grid.len(), 16);
        assert!(grid.iter().all(|l| l.kind == LightKind::Point));
        // Grid is centered on the origin.
        let sum: Vec3 = grid.iter().map(|l| l.position).sum();
        assert!(sum.x.abs() < 1e-4 && sum.z.abs() < 1e-4);
    }

    #[test]
    fn replace_all_swaps_contents() {
        let mut set = LightSet::default_rig();
        set.replace_all(vec![Light::point("solo", Vec3::ONE, Vec3::ZERO)]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.iter().next().unwrap().name, "solo");
    }
}
