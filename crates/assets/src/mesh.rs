use serde::{Deserialize, Serialize};

/// One vertex attribute inside an interleaved buffer.
///
/// `location` matches the shader input location; `components` is the number
/// of f32 components; `offset` is in bytes from the start of a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexAttribute {
    pub location: u32,
    pub components: u32,
    pub offset: u32,
}

/// Layout descriptor for an interleaved vertex buffer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VertexLayout {
    pub attributes: Vec<VertexAttribute>,
    /// Bytes per vertex.
    pub stride: u32,
}

impl VertexLayout {
    /// Find the attribute bound to a shader location, if the mesh provides it.
    pub fn attribute(&self, location: u32) -> Option<&VertexAttribute> {
        self.attributes.iter().find(|a| a.location == location)
    }
}

/// A drawable range of a mesh with its own layout and material slot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Submesh {
    pub layout: VertexLayout,
    /// Interleaved vertex data matching `layout`.
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl Submesh {
    pub fn vertex_count(&self) -> u32 {
        let floats_per_vertex = (self.layout.stride / 4).max(1);
        (self.vertices.len() as u32) / floats_per_vertex
    }
}

/// A named mesh: an ordered list of submeshes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mesh {
    pub name: String,
    pub submeshes: Vec<Submesh>,
}

/// Shader input locations every lantern mesh must provide.
pub const ATTR_POSITION: u32 = 0;
pub const ATTR_NORMAL: u32 = 1;
pub const ATTR_UV: u32 = 2;

/// Procedural unit cube with position, normal, and uv per vertex.
///
/// 24 vertices (4 per face, so normals stay flat) and 36 indices.
pub fn unit_cube() -> Mesh {
    let layout = VertexLayout {
        attributes: vec![
            VertexAttribute { location: ATTR_POSITION, components: 3, offset: 0 },
            VertexAttribute { location: ATTR_NORMAL, components: 3, offset: 12 },
            VertexAttribute { location: ATTR_UV, components: 2, offset: 24 },
        ],
        stride: 32,
    };

    let p = 0.5_f32;
    // Each face: 4 corners in CCW order when viewed from outside.
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        // (normal, tangent u, tangent v)
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),   // +Z
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]), // -Z
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),  // +X
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),  // -X
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),  // +Y
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),  // -Y
    ];

    let mut vertices = Vec::with_capacity(24 * 8);
    let mut indices = Vec::with_capacity(36);
    for (face, (n, u, v)) in faces.iter().enumerate() {
        let base = (face * 4) as u32;
        for (corner, (su, sv)) in [(-p, -p), (p, -p), (p, p), (-p, p)].iter().enumerate() {
            let pos = [
                n[0] * p + u[0] * su + v[0] * sv,
                n[1] * p + u[1] * su + v[1] * sv,
                n[2] * p + u[2] * su + v[2] * sv,
            ];
            let uv = [
                if corner == 1 || corner == 2 { 1.0 } else { 0.0 },
                if corner >= 2 { 1.0 } else { 0.0 },
            ];
            vertices.extend_from_slice(&pos);
            vertices.extend_from_slice(n);
            vertices.extend_from_slice(&uv);
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    Mesh {
        name: "unit_cube".into(),
        submeshes: vec![Submesh { layout, vertices, indices }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_one_submesh() {
        let cube = unit_cube();
        assert_eq!(cube.submeshes.len(), 1);
        let sub = &cube.submeshes[0];
        assert_eq!(sub.vertex_count(), 24);
        assert_eq!(sub.indices.len(), 36);
    }

    #[test]
    fn cube_layout_provides_required_attributes() {
        let cube = unit_cube();
        let layout = &cube.submeshes[0].layout;
        assert_eq!(layout.stride, 32);
        assert_eq!(layout.attribute(ATTR_POSITION).unwrap().components, 3);
        assert_eq!(layout.attribute(ATTR_NORMAL).unwrap().components, 3);
        assert_eq!(layout.attribute(ATTR_UV).unwrap().components, 2);
        assert!(layout.attribute(9).is_none());
    }

    #[test]
    fn cube_positions_stay_on_the_unit_cube() {
        let cube = unit_cube();
        let sub = &cube.submeshes[0];
        let stride = (sub.layout.stride / 4) as usize;
        for v in sub.vertices.chunks(stride) {
            for c in &v[..3] {
                assert!((c.abs() - 0.5).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn cube_indices_in_range() {
        let cube = unit_cube();
        let sub = &cube.submeshes[0];
        assert!(sub.indices.iter().all(|&i| i < sub.vertex_count()));
    }
}
