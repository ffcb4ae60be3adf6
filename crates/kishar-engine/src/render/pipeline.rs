use std::fmt;

use crate::device::{ContextError, GraphicsContext};

/// WGSL source plus the fixed stage entry-point names.
#[derive(Debug, Copy, Clone)]
pub struct ShaderDesc<'a> {
    pub source: &'a str,
    pub vs_entry: &'a str,
    pub fs_entry: &'a str,
}

impl<'a> ShaderDesc<'a> {
    /// Wraps a WGSL blob using the conventional `vs_main` / `fs_main`
    /// entry points.
    pub const fn wgsl(source: &'a str) -> Self {
        Self {
            source,
            vs_entry: "vs_main",
            fs_entry: "fs_main",
        }
    }
}

/// Vertex fetch configuration.
///
/// Both variants are data, not code paths: the same pipeline builder and
/// frame recorder serve either one.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum VertexInput {
    /// No vertex buffers; the vertex stage derives positions from
    /// `@builtin(vertex_index)`.
    ShaderDefined,
    /// One two-float position attribute at shader location 0, stride 8,
    /// stepped per vertex.
    Position2D,
}

const POSITION_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

const POSITION_LAYOUT: [wgpu::VertexBufferLayout<'static>; 1] = [wgpu::VertexBufferLayout {
    array_stride: (2 * std::mem::size_of::<f32>()) as wgpu::BufferAddress,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &POSITION_ATTRS,
}];

impl VertexInput {
    pub fn buffer_layouts(self) -> &'static [wgpu::VertexBufferLayout<'static>] {
        match self {
            VertexInput::ShaderDefined => &[],
            VertexInput::Position2D => &POSITION_LAYOUT,
        }
    }
}

/// The fixed-function state the pipeline is built with.
///
/// Deterministic: building twice from the same inputs yields two pipelines
/// with equal configuration.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PipelineConfig {
    pub topology: wgpu::PrimitiveTopology,
    pub front_face: wgpu::FrontFace,
    pub cull_mode: Option<wgpu::Face>,
    pub blend: wgpu::BlendState,
    pub sample_count: u32,
    pub target_format: wgpu::TextureFormat,
    pub vertex_input: VertexInput,
}

impl PipelineConfig {
    /// The one fixed-function setup this renderer uses: triangle list, CCW
    /// front faces, no culling, no depth/stencil, single-sample, one color
    /// target with alpha-over blending.
    pub fn fixed_function(target_format: wgpu::TextureFormat, vertex_input: VertexInput) -> Self {
        Self {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            blend: alpha_over_blend(),
            sample_count: 1,
            target_format,
            vertex_input,
        }
    }
}

/// Standard alpha-over blending: `src·srcAlpha + dst·(1−srcAlpha)` for
/// color, destination alpha left unchanged.
pub const fn alpha_over_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::Zero,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

/// Render pipeline build failure. Fatal to startup; no partial or degraded
/// pipeline exists.
#[derive(Debug)]
pub enum PipelineBuildError {
    Context(ContextError),
    /// Shader compilation or pipeline validation failed.
    Validation(String),
}

impl fmt::Display for PipelineBuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineBuildError::Context(err) => write!(f, "cannot build pipeline: {err}"),
            PipelineBuildError::Validation(msg) => write!(f, "pipeline validation failed: {msg}"),
        }
    }
}

impl std::error::Error for PipelineBuildError {}

/// Compiled shader stages + fixed-function state. Immutable once built; one
/// pipeline exists for the life of the loop.
pub struct RenderPipeline {
    raw: wgpu::RenderPipeline,
    config: PipelineConfig,
}

impl RenderPipeline {
    /// Compiles `shader` and builds the pipeline against `target_format`.
    ///
    /// Compilation and creation run under a validation error scope, so bad
    /// shader text or an incompatible target format surfaces here as
    /// [`PipelineBuildError::Validation`] instead of a deferred device
    /// error.
    pub fn build(
        ctx: &GraphicsContext<'_>,
        shader: &ShaderDesc<'_>,
        target_format: wgpu::TextureFormat,
        vertex_input: VertexInput,
    ) -> Result<Self, PipelineBuildError> {
        let handles = ctx.handles().map_err(PipelineBuildError::Context)?;
        let config = PipelineConfig::fixed_function(target_format, vertex_input);

        log::info!("creating shader module...");
        let error_scope = handles.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let module = handles
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("kishar shader"),
                source: wgpu::ShaderSource::Wgsl(shader.source.into()),
            });

        // No bindings anywhere in this renderer; the layout is empty.
        let layout = handles
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("kishar pipeline layout"),
                bind_group_layouts: &[],
                immediate_size: 0,
            });

        log::info!("creating render pipeline...");
        let raw = handles
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("kishar pipeline"),
                layout: Some(&layout),

                vertex: wgpu::VertexState {
                    module: &module,
                    entry_point: Some(shader.vs_entry),
                    compilation_options: Default::default(),
                    buffers: config.vertex_input.buffer_layouts(),
                },

                fragment: Some(wgpu::FragmentState {
                    module: &module,
                    entry_point: Some(shader.fs_entry),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: config.target_format,
                        blend: Some(config.blend),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),

                primitive: wgpu::PrimitiveState {
                    topology: config.topology,
                    strip_index_format: None,
                    front_face: config.front_face,
                    cull_mode: config.cull_mode,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },

                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),

                multiview_mask: None,
                cache: None,
            });

        if let Some(err) = pollster::block_on(error_scope.pop()) {
            return Err(PipelineBuildError::Validation(err.to_string()));
        }

        log::info!("render pipeline ready");
        Ok(Self { raw, config })
    }

    pub fn raw(&self) -> &wgpu::RenderPipeline {
        &self.raw
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── fixed function ────────────────────────────────────────────────────

    #[test]
    fn fixed_function_config_is_deterministic() {
        let a = PipelineConfig::fixed_function(
            wgpu::TextureFormat::Bgra8Unorm,
            VertexInput::ShaderDefined,
        );
        let b = PipelineConfig::fixed_function(
            wgpu::TextureFormat::Bgra8Unorm,
            VertexInput::ShaderDefined,
        );
        assert_eq!(a, b);
    }

    #[test]
    fn fixed_function_matches_contract() {
        let c = PipelineConfig::fixed_function(wgpu::TextureFormat::Bgra8Unorm, VertexInput::Position2D);

        assert_eq!(c.topology, wgpu::PrimitiveTopology::TriangleList);
        assert_eq!(c.front_face, wgpu::FrontFace::Ccw);
        assert_eq!(c.cull_mode, None);
        assert_eq!(c.sample_count, 1);
        assert_eq!(c.blend.color.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(c.blend.color.dst_factor, wgpu::BlendFactor::OneMinusSrcAlpha);
        assert_eq!(c.blend.alpha.src_factor, wgpu::BlendFactor::Zero);
        assert_eq!(c.blend.alpha.dst_factor, wgpu::BlendFactor::One);
    }

    // ── vertex input ──────────────────────────────────────────────────────

    #[test]
    fn shader_defined_input_has_no_buffers() {
        assert!(VertexInput::ShaderDefined.buffer_layouts().is_empty());
    }

    #[test]
    fn position_input_is_one_vec2_attribute_at_location_zero() {
        let layouts = VertexInput::Position2D.buffer_layouts();
        assert_eq!(layouts.len(), 1);

        let layout = &layouts[0];
        assert_eq!(layout.array_stride, 8);
        assert_eq!(layout.step_mode, wgpu::VertexStepMode::Vertex);
        assert_eq!(layout.attributes.len(), 1);
        assert_eq!(layout.attributes[0].shader_location, 0);
        assert_eq!(layout.attributes[0].format, wgpu::VertexFormat::Float32x2);
        assert_eq!(layout.attributes[0].offset, 0);
    }

    // ── shader desc ───────────────────────────────────────────────────────

    #[test]
    fn wgsl_desc_uses_conventional_entry_points() {
        let desc = ShaderDesc::wgsl("@vertex fn vs_main() {}");
        assert_eq!(desc.vs_entry, "vs_main");
        assert_eq!(desc.fs_entry, "fs_main");
    }
}
