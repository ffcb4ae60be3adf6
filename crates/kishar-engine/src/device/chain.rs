use std::fmt;

use super::context::GraphicsContext;
use super::error::{AcquireError, ContextError};

/// A single acquired presentable image.
///
/// Short-lived: holding it blocks acquisition of subsequent images, so it
/// must be presented (or dropped) promptly after submission.
pub struct AcquiredImage {
    pub texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
}

/// Presentation chain creation failure.
#[derive(Debug)]
pub enum ChainCreateError {
    Context(ContextError),
    /// The device rejected the configuration (e.g. unsupported format).
    Rejected(String),
}

impl fmt::Display for ChainCreateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainCreateError::Context(err) => write!(f, "cannot create presentation chain: {err}"),
            ChainCreateError::Rejected(msg) => {
                write!(f, "presentation chain configuration rejected: {msg}")
            }
        }
    }
}

impl std::error::Error for ChainCreateError {}

/// Presentation chain over the context's window surface.
///
/// Fixed at creation: image format (no capability negotiation), render
/// attachment usage, FIFO presentation (frames presented in submission
/// order, backpressure when full, never dropped or reordered), and size.
///
/// There is no resize operation. A window size change would require
/// recreating the chain; the fixed-size window makes that unreachable here.
pub struct PresentationChain {
    config: wgpu::SurfaceConfiguration,
}

impl PresentationChain {
    /// Configures the context's surface once and returns the chain.
    pub fn new(
        ctx: &GraphicsContext<'_>,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> Result<Self, ChainCreateError> {
        let handles = ctx.handles().map_err(ChainCreateError::Context)?;
        let surface = ctx.surface().map_err(ChainCreateError::Context)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let error_scope = handles.device.push_error_scope(wgpu::ErrorFilter::Validation);
        surface.configure(handles.device, &config);
        if let Some(err) = pollster::block_on(error_scope.pop()) {
            return Err(ChainCreateError::Rejected(err.to_string()));
        }

        log::info!("presentation chain ready: {width}x{height} {format:?}, fifo");
        Ok(Self { config })
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Acquires the next presentable image and a default view of it.
    ///
    /// Any failure is non-recoverable for this loop; the caller terminates
    /// and proceeds to teardown.
    pub fn acquire(&self, ctx: &GraphicsContext<'_>) -> Result<AcquiredImage, AcquireError> {
        let surface = ctx.surface()?;
        let texture = surface.get_current_texture()?;
        let view = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        Ok(AcquiredImage { texture, view })
    }

    /// Presents an acquired image. FIFO order: this blocks submission-side
    /// when the chain is full rather than dropping frames.
    pub fn present(&self, image: AcquiredImage) {
        let AcquiredImage { texture, view } = image;
        drop(view);
        texture.present();
    }
}
