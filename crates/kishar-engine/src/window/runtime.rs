use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::device::{ContextInit, GraphicsContext, PresentationChain};
use crate::render::{Geometry, RenderPipeline, ShaderDesc, VertexInput, render_frame};
use crate::scene::{Scene, SceneConfig};
use crate::time::FrameClock;

use super::state::LoopState;

/// Everything the loop needs to run, fixed before startup.
///
/// No CLI parsing exists; binaries fill this in code.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,

    /// Fixed window size; the window is not resizable and the presentation
    /// chain is configured once against this size.
    pub size: PhysicalSize<u32>,

    /// Per-frame clear color.
    pub clear_color: wgpu::Color,

    /// Presentation chain image format, chosen up front.
    pub surface_format: wgpu::TextureFormat,

    /// WGSL with `vs_main` / `fs_main` entry points.
    pub shader_source: String,

    /// Vertex fetch mode; must agree with `geometry`.
    pub vertex_input: VertexInput,

    /// Vertex source for the one draw per frame.
    pub geometry: Geometry,

    pub scene: SceneConfig,
}

impl RuntimeConfig {
    /// A 640×480 fixed-size loop drawing shader-defined geometry.
    pub fn new(title: impl Into<String>, shader_source: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            size: PhysicalSize::new(640, 480),
            clear_color: wgpu::Color {
                r: 0.9,
                g: 0.2,
                b: 0.2,
                a: 1.0,
            },
            surface_format: wgpu::TextureFormat::Bgra8Unorm,
            shader_source: shader_source.into(),
            vertex_input: VertexInput::ShaderDefined,
            geometry: Geometry::ShaderDefined,
            scene: SceneConfig::default(),
        }
    }
}

/// Entry point for the application loop.
pub struct Runtime;

impl Runtime {
    /// Runs the loop to completion.
    ///
    /// Returns `Err` when startup fails or a frame fails fatally; teardown
    /// has already completed in both cases.
    pub fn run(config: RuntimeConfig) -> Result<()> {
        anyhow::ensure!(
            matches!(
                (config.vertex_input, &config.geometry),
                (VertexInput::ShaderDefined, Geometry::ShaderDefined)
                    | (VertexInput::Position2D, Geometry::Buffer(_))
            ),
            "vertex input mode and geometry source disagree"
        );

        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut driver = LoopDriver::new(config);

        event_loop
            .run_app(&mut driver)
            .context("winit event loop terminated with error")?;

        driver.into_result()
    }
}

/// The GPU-side objects whose lifetime is bound to one window.
struct GfxBundle<'w> {
    context: GraphicsContext<'w>,
    chain: Option<PresentationChain>,
    pipeline: Option<RenderPipeline>,
}

impl GfxBundle<'_> {
    /// Releases pipeline, chain, then context: the reverse of construction.
    fn release(&mut self) {
        if self.pipeline.take().is_some() {
            log::debug!("released render pipeline");
        }
        if self.chain.take().is_some() {
            log::debug!("released presentation chain");
        }
        self.context.release();
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    gfx: GfxBundle<'this>,
}

struct LoopDriver {
    config: RuntimeConfig,
    state: LoopState,
    entry: Option<WindowEntry>,
    clock: FrameClock,
    scene: Scene,
    fatal: Option<anyhow::Error>,
}

impl LoopDriver {
    fn new(config: RuntimeConfig) -> Self {
        let scene = Scene::new(config.scene.clone());
        Self {
            config,
            state: LoopState::Uninitialized,
            entry: None,
            clock: FrameClock::new(),
            scene,
            fatal: None,
        }
    }

    fn transition(&mut self, to: LoopState) {
        match self.state.try_transition(to) {
            Some(next) => {
                log::debug!("loop state: {:?} -> {:?}", self.state, next);
                self.state = next;
            }
            None => log::warn!("ignoring invalid loop transition {:?} -> {:?}", self.state, to),
        }
    }

    /// Builds window, context, chain and pipeline. Any failure propagates;
    /// whatever was already constructed is dropped in reverse order on the
    /// way out.
    fn initialize(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.size)
            .with_resizable(false);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let surface_format = self.config.surface_format;
        let shader_source = self.config.shader_source.clone();
        let vertex_input = self.config.vertex_input;

        let entry = WindowEntryTryBuilder {
            window,
            gfx_builder: |window: &Window| -> Result<GfxBundle<'_>> {
                let context =
                    pollster::block_on(GraphicsContext::new(window, ContextInit::default()))
                        .context("graphics context initialization failed")?;

                let size = window.inner_size();
                let chain = PresentationChain::new(
                    &context,
                    size.width.max(1),
                    size.height.max(1),
                    surface_format,
                )
                .context("presentation chain creation failed")?;

                let pipeline = RenderPipeline::build(
                    &context,
                    &ShaderDesc::wgsl(&shader_source),
                    chain.format(),
                    vertex_input,
                )
                .context("render pipeline build failed")?;

                Ok(GfxBundle {
                    context,
                    chain: Some(chain),
                    pipeline: Some(pipeline),
                })
            },
        }
        .try_build()?;

        self.entry = Some(entry);
        Ok(())
    }

    /// Releases the graphics bundle in reverse construction order, then the
    /// window.
    fn teardown(&mut self) {
        if let Some(mut entry) = self.entry.take() {
            entry.with_gfx_mut(|gfx| gfx.release());
            drop(entry);
            log::info!("window destroyed");
        }
    }

    fn stop_with(&mut self, event_loop: &ActiveEventLoop, err: Option<anyhow::Error>) {
        if let Some(err) = err {
            log::error!("{err:#}");
            self.fatal = Some(err);
        }
        self.transition(LoopState::Terminating);
        self.teardown();
        self.transition(LoopState::Stopped);
        event_loop.exit();
    }

    /// One loop iteration: advance the clock, tick the scene, flush device
    /// callbacks, render.
    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        if self.state != LoopState::Running {
            return;
        }

        let ft = self.clock.tick();
        self.scene.update(&ft);

        let render_result = {
            let Some(entry) = self.entry.as_mut() else {
                return;
            };
            let clear = self.config.clear_color;
            let geometry = &self.config.geometry;

            let mut out = Ok(());
            entry.with_gfx_mut(|gfx| {
                gfx.context.flush_callbacks();

                let (Some(chain), Some(pipeline)) = (gfx.chain.as_ref(), gfx.pipeline.as_ref())
                else {
                    return;
                };
                out = render_frame(&gfx.context, chain, pipeline, clear, geometry).map(|_| ());
            });
            out
        };

        match render_result {
            Ok(()) => {
                if let Some(entry) = self.entry.as_ref() {
                    entry.with_window(|w| w.request_redraw());
                }
            }
            Err(err) => {
                self.stop_with(
                    event_loop,
                    Some(anyhow::Error::new(err).context("frame rendering failed")),
                );
            }
        }
    }

    fn into_result(self) -> Result<()> {
        match self.fatal {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl ApplicationHandler for LoopDriver {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() {
            return;
        }

        match self.initialize(event_loop) {
            Ok(()) => {
                self.transition(LoopState::Running);
                log::info!("entering main loop");
            }
            Err(err) => {
                log::error!("startup failed: {err:#}");
                self.fatal = Some(err);
                self.transition(LoopState::Stopped);
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.state == LoopState::Stopped {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Poll);

        if let Some(entry) = self.entry.as_ref() {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("close requested");
                self.stop_with(event_loop, None);
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            _ => {}
        }
    }
}
