use std::fmt;

use wgpu::util::DeviceExt;

use crate::device::{AcquireError, ContextError, GraphicsContext, PresentationChain};

use super::pipeline::RenderPipeline;

/// Where the vertices of the one drawn primitive batch come from.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Positions are baked into the vertex stage; the draw covers exactly
    /// three vertices.
    ShaderDefined,
    /// Interleaved `x, y` pairs uploaded as a vertex buffer sized exactly to
    /// the data. Length must be even.
    Buffer(Vec<f32>),
}

impl Geometry {
    /// Number of vertices the frame's single draw call covers.
    pub fn vertex_count(&self) -> u32 {
        match self {
            Geometry::ShaderDefined => 3,
            Geometry::Buffer(data) => {
                debug_assert!(data.len() % 2 == 0, "vertex data must be x,y pairs");
                (data.len() / 2) as u32
            }
        }
    }
}

/// What one frame did, for logging and tests.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FrameReport {
    pub draw_calls: u32,
    pub vertices: u32,
}

/// Per-frame failure.
#[derive(Debug)]
pub enum FrameError {
    Acquire(AcquireError),
    Context(ContextError),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Acquire(err) => write!(f, "frame aborted: {err}"),
            FrameError::Context(err) => write!(f, "frame aborted: {err}"),
        }
    }
}

impl std::error::Error for FrameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FrameError::Acquire(err) => Some(err),
            FrameError::Context(err) => Some(err),
        }
    }
}

impl From<AcquireError> for FrameError {
    fn from(err: AcquireError) -> Self {
        FrameError::Acquire(err)
    }
}

impl From<ContextError> for FrameError {
    fn from(err: ContextError) -> Self {
        FrameError::Context(err)
    }
}

/// Renders one frame to the presentation chain.
///
/// The sequence is strictly ordered and completes or aborts as a unit:
/// acquire an image, record a single clear-and-draw pass, finish one command
/// buffer, submit it alone, present. Everything is synchronous from the
/// caller's perspective; FIFO presentation provides the backpressure.
pub fn render_frame(
    ctx: &GraphicsContext<'_>,
    chain: &PresentationChain,
    pipeline: &RenderPipeline,
    clear: wgpu::Color,
    geometry: &Geometry,
) -> Result<FrameReport, FrameError> {
    let image = chain.acquire(ctx)?;
    let report = record_and_submit(ctx, &image.view, pipeline, clear, geometry)?;
    chain.present(image);
    Ok(report)
}

/// Records and submits the same clear-and-draw pass against a caller-owned
/// color view. Offscreen counterpart of [`render_frame`]; nothing is
/// presented.
pub fn render_to_texture(
    ctx: &GraphicsContext<'_>,
    view: &wgpu::TextureView,
    pipeline: &RenderPipeline,
    clear: wgpu::Color,
    geometry: &Geometry,
) -> Result<FrameReport, FrameError> {
    record_and_submit(ctx, view, pipeline, clear, geometry)
}

fn record_and_submit(
    ctx: &GraphicsContext<'_>,
    view: &wgpu::TextureView,
    pipeline: &RenderPipeline,
    clear: wgpu::Color,
    geometry: &Geometry,
) -> Result<FrameReport, FrameError> {
    let handles = ctx.handles()?;

    let mut encoder = handles
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("kishar frame encoder"),
        });

    // Buffer-driven geometry uploads a buffer sized exactly to the data;
    // shader-defined geometry binds nothing.
    let vertex_buffer = match geometry {
        Geometry::Buffer(data) => Some(handles.device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("kishar vertex buffer"),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::VERTEX,
            },
        )),
        Geometry::ShaderDefined => None,
    };

    let vertices = geometry.vertex_count();

    // Pass scope: ends the render pass before the encoder is finished.
    {
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("kishar clear+draw"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline.raw());
        if let Some(buffer) = &vertex_buffer {
            rpass.set_vertex_buffer(0, buffer.slice(..));
        }
        rpass.draw(0..vertices, 0..1);
    }

    let command = encoder.finish();
    handles.queue.submit(std::iter::once(command));

    Ok(FrameReport {
        draw_calls: 1,
        vertices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{ContextInit, InitStage};
    use crate::render::pipeline::{PipelineBuildError, ShaderDesc, VertexInput};

    // ── vertex counts ─────────────────────────────────────────────────────

    #[test]
    fn shader_defined_geometry_draws_three_vertices() {
        assert_eq!(Geometry::ShaderDefined.vertex_count(), 3);
    }

    #[test]
    fn buffer_geometry_draws_half_its_float_count() {
        assert_eq!(Geometry::Buffer(vec![0.0; 6]).vertex_count(), 3);
        assert_eq!(Geometry::Buffer(vec![0.0; 8]).vertex_count(), 4);
        assert_eq!(Geometry::Buffer(vec![0.0; 64]).vertex_count(), 32);
    }

    // ── offscreen end-to-end ──────────────────────────────────────────────

    const TEST_SHADER: &str = r#"
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

    const TEST_BUFFER_SHADER: &str = r#"
@vertex
fn vs_main(@location(0) position: vec2f) -> @builtin(position) vec4<f32> {
    return vec4f(position, 0.0, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4f {
    return vec4f(0.0, 0.4, 1.0, 1.0);
}
"#;

    const CLEAR: wgpu::Color = wgpu::Color {
        r: 0.9,
        g: 0.2,
        b: 0.2,
        a: 1.0,
    };

    fn headless() -> Option<GraphicsContext<'static>> {
        match pollster::block_on(GraphicsContext::headless(ContextInit::default())) {
            Ok(ctx) => Some(ctx),
            Err(err) => {
                eprintln!("skipping: no usable gpu adapter ({err})");
                None
            }
        }
    }

    fn offscreen_target(ctx: &GraphicsContext<'_>) -> (wgpu::Texture, wgpu::TextureView) {
        let handles = ctx.handles().unwrap();
        let texture = handles.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("test target"),
            size: wgpu::Extent3d {
                width: 64,
                height: 64,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }

    #[test]
    fn five_frames_submit_and_release_everything_once() {
        let Some(mut ctx) = headless() else { return };

        {
            let pipeline = RenderPipeline::build(
                &ctx,
                &ShaderDesc::wgsl(TEST_SHADER),
                wgpu::TextureFormat::Rgba8Unorm,
                VertexInput::ShaderDefined,
            )
            .unwrap();
            let (_texture, view) = offscreen_target(&ctx);

            for _ in 0..5 {
                let report =
                    render_to_texture(&ctx, &view, &pipeline, CLEAR, &Geometry::ShaderDefined)
                        .unwrap();
                assert_eq!(report, FrameReport { draw_calls: 1, vertices: 3 });
            }

            ctx.flush_callbacks();
        }

        ctx.release();
        assert_eq!(
            ctx.release_log(),
            InitStage::teardown_sequence(ctx.creation_log()).as_slice()
        );

        // Second release must not release anything twice.
        let releases = ctx.release_log().len();
        ctx.release();
        assert_eq!(ctx.release_log().len(), releases);
    }

    #[test]
    fn buffer_driven_frame_draws_len_over_two_vertices() {
        let Some(ctx) = headless() else { return };

        let pipeline = RenderPipeline::build(
            &ctx,
            &ShaderDesc::wgsl(TEST_BUFFER_SHADER),
            wgpu::TextureFormat::Rgba8Unorm,
            VertexInput::Position2D,
        )
        .unwrap();
        let (_texture, view) = offscreen_target(&ctx);

        let geometry = Geometry::Buffer(vec![-0.5, -0.5, 0.5, -0.5, 0.0, 0.5, 0.5, 0.5]);
        let report = render_to_texture(&ctx, &view, &pipeline, CLEAR, &geometry).unwrap();

        assert_eq!(report.draw_calls, 1);
        assert_eq!(report.vertices, 4);
    }

    #[test]
    fn building_twice_yields_identical_configuration() {
        let Some(ctx) = headless() else { return };

        let desc = ShaderDesc::wgsl(TEST_SHADER);
        let a = RenderPipeline::build(
            &ctx,
            &desc,
            wgpu::TextureFormat::Rgba8Unorm,
            VertexInput::ShaderDefined,
        )
        .unwrap();
        let b = RenderPipeline::build(
            &ctx,
            &desc,
            wgpu::TextureFormat::Rgba8Unorm,
            VertexInput::ShaderDefined,
        )
        .unwrap();

        assert_eq!(a.config(), b.config());
    }

    #[test]
    fn bad_shader_text_fails_the_build() {
        let Some(ctx) = headless() else { return };

        let result = RenderPipeline::build(
            &ctx,
            &ShaderDesc::wgsl("this is not wgsl"),
            wgpu::TextureFormat::Rgba8Unorm,
            VertexInput::ShaderDefined,
        );

        assert!(matches!(result, Err(PipelineBuildError::Validation(_))));
    }

    #[test]
    fn released_context_rejects_frame_rendering() {
        let Some(mut ctx) = headless() else { return };

        let pipeline = RenderPipeline::build(
            &ctx,
            &ShaderDesc::wgsl(TEST_SHADER),
            wgpu::TextureFormat::Rgba8Unorm,
            VertexInput::ShaderDefined,
        )
        .unwrap();
        let (_texture, view) = offscreen_target(&ctx);

        ctx.release();

        let result = render_to_texture(&ctx, &view, &pipeline, CLEAR, &Geometry::ShaderDefined);
        assert!(matches!(
            result,
            Err(FrameError::Context(ContextError::Released))
        ));
    }
}
