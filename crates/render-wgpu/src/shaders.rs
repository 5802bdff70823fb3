/// WGSL shader for the fur shells.
///
/// Every shell draws the same mesh; `shell_index` (per instance) picks the
/// layer height. Scalars are packed four to a vector, see `ShellUniforms`.
pub const SHELL_SHADER: &str = r#"
struct ShellUniforms {
    view_proj: mat4x4<f32>,
    shell_color: vec4<f32>,
    // xyz: lean vector
    direction: vec4<f32>,
    // xy: wind direction change speed
    wind: vec4<f32>,
    // shell_length, distance_attenuation, density, thickness
    shape: vec4<f32>,
    // curvature, displacement_strength, occlusion_attenuation, occlusion_bias
    shading: vec4<f32>,
    // noise_min, noise_max, shell_count, time
    misc: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> u: ShellUniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct InstanceInput {
    @location(3) model_0: vec4<f32>,
    @location(4) model_1: vec4<f32>,
    @location(5) model_2: vec4<f32>,
    @location(6) model_3: vec4<f32>,
    @location(7) shell_index: u32,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_normal: vec3<f32>,
    @location(1) uv: vec2<f32>,
    @location(2) @interpolate(flat) shell_index: u32,
};

fn shell_height(index: u32) -> f32 {
    return f32(index) / max(u.misc.z, 1.0);
}

fn lattice_hash(seed: u32) -> f32 {
    var n = (seed << 13u) ^ seed;
    n = n * (n * n * 15731u + 789221u) + 1376312589u;
    return f32(n & 2147483647u) / 2147483647.0;
}

@vertex
fn vs_shell(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let world_normal = normalize((model * vec4<f32>(vertex.normal, 0.0)).xyz);
    var world_pos = (model * vec4<f32>(vertex.position, 1.0)).xyz;

    let height = pow(shell_height(instance.shell_index), u.shape.y);
    world_pos = world_pos + world_normal * u.shape.x * height;

    let bend = pow(height, u.shading.x) * u.shading.y;
    let sway = sin(u.wind.xy * u.misc.w);
    world_pos = world_pos + u.direction.xyz * bend;
    world_pos = world_pos + vec3<f32>(sway.x, 0.0, sway.y) * bend;

    var out: VertexOutput;
    out.clip_position = u.view_proj * vec4<f32>(world_pos, 1.0);
    out.world_normal = world_normal;
    out.uv = vertex.uv;
    out.shell_index = instance.shell_index;
    return out;
}

@fragment
fn fs_shell(in: VertexOutput) -> @location(0) vec4<f32> {
    let cell_uv = in.uv * u.shape.z;
    let local_uv = fract(cell_uv) * 2.0 - 1.0;
    let local_distance = length(local_uv);
    let cell = vec2<u32>(cell_uv);
    let seed = cell.x + 100u * cell.y + 100u * 10u;
    let strand = mix(u.misc.x, u.misc.y, lattice_hash(seed));

    let height = shell_height(in.shell_index);
    if (in.shell_index > 0u && local_distance > u.shape.w * (strand - height)) {
        discard;
    }

    let light_dir = normalize(vec3<f32>(0.3, 1.0, 0.5));
    var ndotl = clamp(dot(in.world_normal, light_dir), 0.0, 1.0) * 0.5 + 0.5;
    ndotl = ndotl * ndotl;
    let occlusion = clamp(pow(height, u.shading.z) + u.shading.w, 0.0, 1.0);
    return vec4<f32>(u.shell_color.rgb * ndotl * occlusion, 1.0);
}
"#;

/// WGSL shader for the authoring preview: the bare base mesh, flat lit.
pub const PREVIEW_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    shell_color: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct InstanceInput {
    @location(3) model_0: vec4<f32>,
    @location(4) model_1: vec4<f32>,
    @location(5) model_2: vec4<f32>,
    @location(6) model_3: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_normal: vec3<f32>,
};

@vertex
fn vs_preview(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * model * vec4<f32>(vertex.position, 1.0);
    out.world_normal = normalize((model * vec4<f32>(vertex.normal, 0.0)).xyz);
    return out;
}

@fragment
fn fs_preview(in: VertexOutput) -> @location(0) vec4<f32> {
    let light_dir = normalize(vec3<f32>(0.3, 1.0, 0.5));
    let lighting = 0.3 + max(dot(in.world_normal, light_dir), 0.0) * 0.7;
    return vec4<f32>(vec3<f32>(0.7, 0.7, 0.7) * lighting, 1.0);
}
"#;

/// WGSL shader for the grid floor.
pub const GRID_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct GridVertex {
    @location(0) position: vec3<f32>,
    @location(1) color: vec4<f32>,
};

struct GridOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_grid(vertex: GridVertex) -> GridOutput {
    var out: GridOutput;
    out.clip_position = uniforms.view_proj * vec4<f32>(vertex.position, 1.0);
    out.color = vertex.color;
    return out;
}

@fragment
fn fs_grid(in: GridOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(source: &str) -> naga::Module {
        let module = naga::front::wgsl::parse_str(source).expect("WGSL parses");
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(&module)
        .expect("WGSL validates");
        module
    }

    fn entry_points(module: &naga::Module) -> Vec<&str> {
        module.entry_points.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn shell_shader_is_valid() {
        let module = validate(SHELL_SHADER);
        assert_eq!(entry_points(&module), vec!["vs_shell", "fs_shell"]);
    }

    #[test]
    fn preview_shader_is_valid() {
        let module = validate(PREVIEW_SHADER);
        assert_eq!(entry_points(&module), vec!["vs_preview", "fs_preview"]);
    }

    #[test]
    fn grid_shader_is_valid() {
        validate(GRID_SHADER);
    }
}
