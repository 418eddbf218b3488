use lantern_assets::AssetError;
use lantern_common::LimitsError;

/// Renderer construction and upload failures.
///
/// These abort only the affected resource's construction; frame-time sizing
/// violations panic in the uniform layer instead.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("mesh '{mesh}' provides no vertex attribute for shader location {location}")]
    MissingVertexAttribute { mesh: String, location: u32 },
    #[error("mesh '{mesh}' attribute at location {location} has {got} components, shader needs {want}")]
    AttributeComponentMismatch {
        mesh: String,
        location: u32,
        got: u32,
        want: u32,
    },
    #[error("mesh '{mesh}' vertex layout does not match the forward pipeline (stride {stride})")]
    UnsupportedVertexLayout { mesh: String, stride: u32 },
    #[error("device limits unusable: {0}")]
    Limits(#[from] LimitsError),
    #[error("asset table lookup failed: {0}")]
    Asset(#[from] AssetError),
}
