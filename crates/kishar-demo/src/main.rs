//! Triangle demo: fixed 640×480 window, one pipeline, red clear, blue
//! triangle, flat scene ticking alongside the frame loop.

use anyhow::Result;

use kishar_engine::logging::{self, LoggingConfig};
use kishar_engine::render::{Geometry, VertexInput};
use kishar_engine::window::{Runtime, RuntimeConfig};

/// Triangle with positions baked into the vertex stage.
const TRIANGLE_SHADER: &str = r#"
@vertex
fn vs_main(@builtin(vertex_index) in_vertex_index: u32) -> @builtin(position) vec4<f32> {
    var p = vec2f(0.0, 0.0);
    if (in_vertex_index == 0u) {
        p = vec2f(-0.5, -0.5);
    } else if (in_vertex_index == 1u) {
        p = vec2f(0.5, -0.5);
    } else {
        p = vec2f(0.0, 0.5);
    }
    return vec4f(p, 0.0, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4f {
    return vec4f(0.0, 0.4, 1.0, 1.0);
}
"#;

/// Same triangle, positions streamed through a vertex buffer instead.
const TRIANGLE_BUFFER_SHADER: &str = r#"
@vertex
fn vs_main(@location(0) position: vec2f) -> @builtin(position) vec4<f32> {
    return vec4f(position, 0.0, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4f {
    return vec4f(0.0, 0.4, 1.0, 1.0);
}
"#;

const TRIANGLE_POSITIONS: [f32; 6] = [-0.5, -0.5, 0.5, -0.5, 0.0, 0.5];

/// Flip to drive the pipeline from a vertex buffer. Both shader variants are
/// plain data; no CLI flags exist.
const USE_VERTEX_BUFFER: bool = false;

/// Flip to spawn one fresh entity per tick (unbounded scene growth, useful
/// only as a stress test).
const SPAWN_PER_TICK: bool = false;

fn main() -> Result<()> {
    logging::init_logging(LoggingConfig::default());

    let mut config = RuntimeConfig::new("kishar demo", TRIANGLE_SHADER);
    config.clear_color = wgpu::Color {
        r: 0.9,
        g: 0.2,
        b: 0.2,
        a: 1.0,
    };
    config.scene.spawn_per_tick = SPAWN_PER_TICK;

    if USE_VERTEX_BUFFER {
        config.shader_source = TRIANGLE_BUFFER_SHADER.to_string();
        config.vertex_input = VertexInput::Position2D;
        config.geometry = Geometry::Buffer(TRIANGLE_POSITIONS.to_vec());
    }

    log::info!("starting {}", config.title);
    Runtime::run(config)
}
