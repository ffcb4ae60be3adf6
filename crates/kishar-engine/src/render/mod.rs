//! GPU rendering subsystem.
//!
//! One immutable pipeline, built once against the presentation chain's
//! format, and a per-frame sequence that clears, draws a single primitive
//! batch, submits one command buffer and presents.

mod frame;
mod pipeline;

pub use frame::{FrameError, FrameReport, Geometry, render_frame, render_to_texture};
pub use pipeline::{
    PipelineBuildError, PipelineConfig, RenderPipeline, ShaderDesc, VertexInput, alpha_over_blend,
};
