//! GPU shaders for the liquid glass pass
//!
//! The glass shader renders:
//! - A full-viewport quad generated from the vertex index (no vertex buffers)
//! - A rounded-box SDF mask with an anti-aliased edge
//! - Edge refraction with a slow time-based wobble
//! - A small blur of the refracted backdrop plus a rim highlight
//!
//! Bindings (group 0): `0` uniforms, `1` backdrop texture, `2` sampler.
//! Output is premultiplied alpha, fully transparent outside the box.

/// WGSL shader for the liquid glass refraction pass
pub const GLASS_SHADER: &str = r#"
struct Uniforms {
    resolution: vec2<f32>,
    time: f32,
    _pad0: f32,
    box_size: vec2<f32>,
    corner_radius: f32,
    _pad1: f32,
}

@group(0) @binding(0) var<uniform> uniforms: Uniforms;
@group(0) @binding(1) var backdrop: texture_2d<f32>;
@group(0) @binding(2) var backdrop_sampler: sampler;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(0.0, 0.0),
        vec2<f32>(1.0, 0.0),
        vec2<f32>(0.0, 1.0),
        vec2<f32>(0.0, 1.0),
        vec2<f32>(1.0, 0.0),
        vec2<f32>(1.0, 1.0),
    );
    let uv = corners[vertex_index];

    var out: VertexOutput;
    out.position = vec4<f32>(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0, 0.0, 1.0);
    out.uv = uv;
    return out;
}

fn rounded_box_sdf(p: vec2<f32>, half_size: vec2<f32>, radius: f32) -> f32 {
    let r = clamp(radius, 0.0, min(half_size.x, half_size.y));
    let q = abs(p) - half_size + vec2<f32>(r, r);
    return length(max(q, vec2<f32>(0.0, 0.0))) + min(max(q.x, q.y), 0.0) - r;
}

// Width of the refracting rim, logical units
const RIM_WIDTH: f32 = 24.0;
// Maximum uv displacement at the very edge
const REFRACTION: f32 = 0.06;
const WOBBLE: f32 = 0.003;

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let box_size = max(uniforms.box_size, vec2<f32>(1.0, 1.0));
    let half_size = box_size * 0.5;
    let radius = uniforms.corner_radius;

    // logical position relative to the box center
    let p = (input.uv - vec2<f32>(0.5, 0.5)) * box_size;
    let d = rounded_box_sdf(p, half_size, radius);
    if (d > 0.5) {
        return vec4<f32>(0.0);
    }
    let coverage = clamp(0.5 - d, 0.0, 1.0);

    // outward normal from the SDF gradient
    let e = vec2<f32>(1.0, 0.0);
    let grad = vec2<f32>(
        rounded_box_sdf(p + e.xy, half_size, radius) - rounded_box_sdf(p - e.xy, half_size, radius),
        rounded_box_sdf(p + e.yx, half_size, radius) - rounded_box_sdf(p - e.yx, half_size, radius),
    );
    let normal = grad / max(length(grad), 1e-4);

    // bend toward the center, strongest at the rim
    let edge = clamp(1.0 + d / RIM_WIDTH, 0.0, 1.0);
    let bend = edge * edge * REFRACTION;
    let t = uniforms.time;
    let wobble = vec2<f32>(
        sin(t * 1.3 + p.y * 0.045),
        cos(t * 1.1 + p.x * 0.045),
    ) * WOBBLE;
    let uv = input.uv - normal * bend + wobble;

    // 3x3 tent blur in texture space
    let texel = 1.0 / max(vec2<f32>(textureDimensions(backdrop)), vec2<f32>(1.0, 1.0));
    var color = vec4<f32>(0.0);
    var weight = 0.0;
    for (var x: i32 = -1; x <= 1; x = x + 1) {
        for (var y: i32 = -1; y <= 1; y = y + 1) {
            let offset = vec2<f32>(f32(x), f32(y)) * texel * 1.5;
            let w = 1.0 / (1.0 + f32(x * x + y * y));
            let sample_uv = clamp(uv + offset, vec2<f32>(0.0, 0.0), vec2<f32>(1.0, 1.0));
            color = color + textureSampleLevel(backdrop, backdrop_sampler, sample_uv, 0.0) * w;
            weight = weight + w;
        }
    }
    color = color / weight;

    // rim highlight composited over the refracted backdrop
    let highlight = 0.05 + smoothstep(-3.0, 0.0, d) * 0.25 * edge;
    let lit = vec4<f32>(vec3<f32>(highlight), highlight) + color * (1.0 - highlight);
    return lit * coverage;
}
"#;
