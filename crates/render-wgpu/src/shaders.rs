/// WGSL shader for lit shape meshes.
///
/// Lighting follows the toon model: the half-Lambert term is stepped to 0.7
/// below 0.7 and 1.0 above, then scaled by the Lambert BRDF like every other
/// shading mode.
pub const SHAPE_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    ambient: vec4<f32>,
    sun_dir: vec4<f32>,
    sun_color: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) color: vec4<f32>,
    @location(7) params: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_normal: vec3<f32>,
    @location(1) color: vec4<f32>,
    @location(2) shading: f32,
};

const PI: f32 = 3.14159265;
const SHADING_TOON: f32 = 0.0;

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let world_pos = model * vec4<f32>(vertex.position, 1.0);
    let world_normal = (model * vec4<f32>(vertex.normal, 0.0)).xyz;

    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * world_pos;
    out.world_normal = normalize(world_normal);
    out.color = instance.color;
    out.shading = instance.params.x;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let n = normalize(in.world_normal);
    let ndl = dot(n, normalize(uniforms.sun_dir.xyz));
    var direct = max(ndl, 0.0);
    if in.shading == SHADING_TOON {
        direct = select(1.0, 0.7, ndl * 0.5 + 0.5 < 0.7);
    }
    let irradiance = uniforms.ambient.rgb + uniforms.sun_color.rgb * direct;
    return vec4<f32>(in.color.rgb * irradiance / PI, in.color.a);
}
"#;
