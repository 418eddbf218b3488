/// WGSL forward shader.
///
/// The `Globals` and `EntityUniforms` layouts must stay byte-compatible with
/// the CPU-side serialization: camera position in the first 16-byte slot,
/// light count at offset 16, the light array 16-aligned at offset 32 with a
/// 64-byte stride, and the entity record as two 64-byte matrices.
pub const FORWARD_SHADER: &str = r#"
struct Light {
    kind: u32,
    color: vec3<f32>,
    direction: vec3<f32>,
    position: vec3<f32>,
};

struct Globals {
    camera_position: vec3<f32>,
    _pad0: u32,
    light_count: u32,
    lights: array<Light, 16>,
};

struct EntityUniforms {
    world: mat4x4<f32>,
    world_view_proj: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

@group(1) @binding(0)
var<uniform> entity: EntityUniforms;

@group(2) @binding(0)
var albedo_texture: texture_2d<f32>;
@group(2) @binding(1)
var albedo_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.world_position = (entity.world * vec4<f32>(vertex.position, 1.0)).xyz;
    out.world_normal = normalize((entity.world * vec4<f32>(vertex.normal, 0.0)).xyz);
    out.uv = vertex.uv;
    out.clip_position = entity.world_view_proj * vec4<f32>(vertex.position, 1.0);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let albedo = textureSample(albedo_texture, albedo_sampler, in.uv).rgb;
    let n = normalize(in.world_normal);
    let view_dir = normalize(globals.camera_position - in.world_position);

    var lit = albedo * 0.08; // ambient floor
    for (var i = 0u; i < globals.light_count; i = i + 1u) {
        let light = globals.lights[i];
        var light_dir: vec3<f32>;
        var radiance = light.color;
        if (light.kind == 0u) {
            light_dir = normalize(-light.direction);
        } else {
            let to_light = light.position - in.world_position;
            let dist = length(to_light);
            light_dir = to_light / dist;
            radiance = radiance / (1.0 + dist * dist * 0.1);
        }
        let diffuse = max(dot(n, light_dir), 0.0);
        let half_dir = normalize(light_dir + view_dir);
        let specular = pow(max(dot(n, half_dir), 0.0), 32.0) * 0.25;
        lit = lit + radiance * (albedo * diffuse + vec3<f32>(specular));
    }
    return vec4<f32>(lit, 1.0);
}
"#;
