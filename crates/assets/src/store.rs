use crate::mesh::{Mesh, unit_cube};
use lantern_common::{MaterialHandle, MeshHandle, ModelHandle, TextureHandle};
use serde::{Deserialize, Serialize};

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("mesh handle {0:?} out of range")]
    MeshNotFound(MeshHandle),
    #[error("model handle {0:?} out of range")]
    ModelNotFound(ModelHandle),
    #[error("material handle {0:?} out of range")]
    MaterialNotFound(MaterialHandle),
    #[error("texture handle {0:?} out of range")]
    TextureNotFound(TextureHandle),
    #[error("model references {materials} materials but mesh has {submeshes} submeshes")]
    MaterialCountMismatch { materials: usize, submeshes: usize },
}

/// A placed model: a mesh plus one material per submesh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub mesh: MeshHandle,
    /// Parallel to the mesh's submesh list.
    pub materials: Vec<MaterialHandle>,
}

/// Surface description consumed by the forward shader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub albedo: [f32; 3],
    pub smoothness: f32,
    pub albedo_texture: Option<TextureHandle>,
    pub emissive_texture: Option<TextureHandle>,
    pub specular_texture: Option<TextureHandle>,
    pub normals_texture: Option<TextureHandle>,
    pub bump_texture: Option<TextureHandle>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "default".into(),
            albedo: [0.8, 0.8, 0.8],
            smoothness: 0.5,
            albedo_texture: None,
            emissive_texture: None,
            specular_texture: None,
            normals_texture: None,
            bump_texture: None,
        }
    }
}

/// A texture table entry.
///
/// Image decoding belongs to an external collaborator; entries here are
/// single flat RGBA colors, enough for the renderer to build 1x1 textures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextureDesc {
    pub name: String,
    pub rgba: [u8; 4],
}

/// Ordered asset tables addressed by index handles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetStore {
    meshes: Vec<Mesh>,
    models: Vec<Model>,
    materials: Vec<Material>,
    textures: Vec<TextureDesc>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_mesh(&mut self, mesh: Mesh) -> MeshHandle {
        self.meshes.push(mesh);
        MeshHandle(self.meshes.len() as u32 - 1)
    }

    /// Register a model, checking the material list matches the mesh.
    pub fn register_model(&mut self, model: Model) -> Result<ModelHandle, AssetError> {
        let mesh = self.mesh(model.mesh)?;
        if model.materials.len() != mesh.submeshes.len() {
            return Err(AssetError::MaterialCountMismatch {
                materials: model.materials.len(),
                submeshes: mesh.submeshes.len(),
            });
        }
        self.models.push(model);
        Ok(ModelHandle(self.models.len() as u32 - 1))
    }

    pub fn register_material(&mut self, material: Material) -> MaterialHandle {
        self.materials.push(material);
        MaterialHandle(self.materials.len() as u32 - 1)
    }

    pub fn register_texture(&mut self, texture: TextureDesc) -> TextureHandle {
        self.textures.push(texture);
        TextureHandle(self.textures.len() as u32 - 1)
    }

    pub fn mesh(&self, h: MeshHandle) -> Result<&Mesh, AssetError> {
        self.meshes.get(h.0 as usize).ok_or(AssetError::MeshNotFound(h))
    }

    pub fn model(&self, h: ModelHandle) -> Result<&Model, AssetError> {
        self.models.get(h.0 as usize).ok_or(AssetError::ModelNotFound(h))
    }

    pub fn material(&self, h: MaterialHandle) -> Result<&Material, AssetError> {
        self.materials.get(h.0 as usize).ok_or(AssetError::MaterialNotFound(h))
    }

    pub fn texture(&self, h: TextureHandle) -> Result<&TextureDesc, AssetError> {
        self.textures.get(h.0 as usize).ok_or(AssetError::TextureNotFound(h))
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn textures(&self) -> &[TextureDesc] {
        &self.textures
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Register the stock white/magenta/flat-normal textures.
    ///
    /// Returns the white texture, the usual fallback.
    pub fn register_default_textures(&mut self) -> TextureHandle {
        let white = self.register_texture(TextureDesc {
            name: "color_white".into(),
            rgba: [255, 255, 255, 255],
        });
        self.register_texture(TextureDesc {
            name: "color_magenta".into(),
            rgba: [255, 0, 255, 255],
        });
        self.register_texture(TextureDesc {
            name: "color_normal".into(),
            rgba: [128, 128, 255, 255],
        });
        white
    }

    /// Register a unit cube mesh wrapped in a model with a default material.
    pub fn register_default_cube(&mut self) -> ModelHandle {
        let mesh = self.register_mesh(unit_cube());
        let material = self.register_material(Material::default());
        self.register_model(Model {
            mesh,
            materials: vec![material],
        })
        .expect("cube model material list matches submesh count")
    }
}
