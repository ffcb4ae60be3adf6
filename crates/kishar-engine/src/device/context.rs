use winit::window::Window;

use super::error::{ContextError, ContextInitError, InitStage};

/// Initialization parameters for the graphics context.
///
/// Keep this structure stable and minimal. Add configuration flags only when
/// a concrete platform or backend requirement exists.
#[derive(Debug, Clone)]
pub struct ContextInit {
    /// Backends the instance may pick from.
    pub backends: wgpu::Backends,

    /// Adapter selection preference. The first/best adapter the platform
    /// reports for this preference wins; there is no fallback policy.
    pub power_preference: wgpu::PowerPreference,

    /// Required wgpu features.
    ///
    /// Favor an empty set for portability unless a feature is strictly
    /// necessary.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,
}

impl Default for ContextInit {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
        }
    }
}

/// Borrowed device + queue pair, only obtainable while the context is live.
#[derive(Copy, Clone, Debug)]
pub struct Handles<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
}

/// Owns the five wgpu core handles.
///
/// Construction follows the strict ladder instance → surface → adapter →
/// device → queue; a failure at any step aborts the whole construction and
/// drops the handles created so far in reverse order, so a partial context
/// is never observable.
///
/// [`release`](Self::release) tears the handles down in exact reverse
/// creation order and flips a released flag; every later handle access is
/// rejected with [`ContextError::Released`]. Dropping an unreleased context
/// releases it, so teardown happens on every exit path.
pub struct GraphicsContext<'w> {
    instance: Option<wgpu::Instance>,
    surface: Option<wgpu::Surface<'w>>,
    adapter: Option<wgpu::Adapter>,
    device: Option<wgpu::Device>,
    queue: Option<wgpu::Queue>,

    created: Vec<InitStage>,
    release_log: Vec<InitStage>,
    released: bool,
}

impl<'w> GraphicsContext<'w> {
    /// Creates a context whose surface is bound to `window`.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu; callers block
    /// with `pollster::block_on` (the loop does).
    pub async fn new(window: &'w Window, init: ContextInit) -> Result<Self, ContextInitError> {
        Self::request(Some(window), init).await
    }

    /// Creates a context with no surface, for offscreen rendering and tests.
    pub async fn headless(init: ContextInit) -> Result<GraphicsContext<'static>, ContextInitError> {
        GraphicsContext::<'static>::request(None, init).await
    }

    async fn request(
        window: Option<&'w Window>,
        init: ContextInit,
    ) -> Result<Self, ContextInitError> {
        let mut created = Vec::with_capacity(5);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: init.backends,
            ..Default::default()
        });
        created.push(InitStage::Instance);
        log::debug!("wgpu instance ready");

        // Surface lifetime is tied to `window` via `'w`. On any later failure
        // the handles created so far drop in reverse order on the way out.
        let surface = match window {
            Some(window) => {
                let surface = instance
                    .create_surface(window)
                    .map_err(|e| ContextInitError::new(InitStage::Surface, e.to_string()))?;
                created.push(InitStage::Surface);
                Some(surface)
            }
            None => None,
        };

        log::info!("requesting adapter...");
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: surface.as_ref(),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| ContextInitError::new(InitStage::Adapter, e.to_string()))?;
        created.push(InitStage::Adapter);
        log::info!("got adapter: {}", adapter.get_info().name);

        log::info!("requesting device...");
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("kishar device"),
                required_features: init.required_features,
                required_limits: init.required_limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| ContextInitError::new(InitStage::Device, e.to_string()))?;
        created.push(InitStage::Device);
        log::info!("got device");

        // Device-reported errors (out-of-memory, validation) arrive out of
        // band after submission. They are logged, never propagated.
        device.on_uncaptured_error(std::sync::Arc::new(report_device_error));

        created.push(InitStage::Queue);
        queue.on_submitted_work_done(|| log::debug!("queued work finished"));

        Ok(Self {
            instance: Some(instance),
            surface,
            adapter: Some(adapter),
            device: Some(device),
            queue: Some(queue),
            created,
            release_log: Vec::new(),
            released: false,
        })
    }

    /// Returns the device/queue pair, or an error once released.
    pub fn handles(&self) -> Result<Handles<'_>, ContextError> {
        if self.released {
            return Err(ContextError::Released);
        }
        match (&self.device, &self.queue) {
            (Some(device), Some(queue)) => Ok(Handles { device, queue }),
            _ => Err(ContextError::Released),
        }
    }

    /// Returns the window surface, or an error once released or if headless.
    pub fn surface(&self) -> Result<&wgpu::Surface<'w>, ContextError> {
        if self.released {
            return Err(ContextError::Released);
        }
        self.surface.as_ref().ok_or(ContextError::Headless)
    }

    /// Drives wgpu's internal event processing once.
    ///
    /// Completion and error callbacks fire from here, not from submission;
    /// their ordering relative to a submission is only "non-earlier".
    pub fn flush_callbacks(&self) {
        if let Ok(handles) = self.handles() {
            _ = handles.device.poll(wgpu::PollType::Poll);
        }
    }

    /// Releases the owned handles in exact reverse creation order.
    ///
    /// Idempotent: a second call is a no-op, so no handle is ever released
    /// twice.
    pub fn release(&mut self) {
        if self.released {
            return;
        }

        for stage in InitStage::teardown_sequence(&self.created) {
            match stage {
                InitStage::Queue => drop(self.queue.take()),
                InitStage::Device => drop(self.device.take()),
                InitStage::Adapter => drop(self.adapter.take()),
                InitStage::Surface => drop(self.surface.take()),
                InitStage::Instance => drop(self.instance.take()),
            }
            log::debug!("released {stage}");
            self.release_log.push(stage);
        }

        self.released = true;
        log::info!("graphics context released");
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Stages that completed during construction, in creation order.
    pub fn creation_log(&self) -> &[InitStage] {
        &self.created
    }

    /// Stages released so far, in release order. Empty until [`release`].
    ///
    /// [`release`]: Self::release
    pub fn release_log(&self) -> &[InitStage] {
        &self.release_log
    }
}

impl Drop for GraphicsContext<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

fn report_device_error(error: wgpu::Error) {
    let kind = match &error {
        wgpu::Error::OutOfMemory { .. } => "out-of-memory",
        wgpu::Error::Validation { .. } => "validation",
        wgpu::Error::Internal { .. } => "internal",
    };
    log::error!("uncaptured device error ({kind}): {error}");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headless() -> Option<GraphicsContext<'static>> {
        match pollster::block_on(GraphicsContext::headless(ContextInit::default())) {
            Ok(ctx) => Some(ctx),
            Err(err) => {
                eprintln!("skipping: no usable gpu adapter ({err})");
                None
            }
        }
    }

    // ── construction ──────────────────────────────────────────────────────

    #[test]
    fn headless_ladder_skips_the_surface_stage() {
        let Some(ctx) = headless() else { return };

        assert_eq!(
            ctx.creation_log(),
            &[
                InitStage::Instance,
                InitStage::Adapter,
                InitStage::Device,
                InitStage::Queue,
            ]
        );
        assert!(ctx.handles().is_ok());
        assert_eq!(ctx.surface().unwrap_err(), ContextError::Headless);
    }

    // ── release ───────────────────────────────────────────────────────────

    #[test]
    fn release_reverses_creation_and_guards_access() {
        let Some(mut ctx) = headless() else { return };

        ctx.release();

        assert!(ctx.is_released());
        assert_eq!(
            ctx.release_log(),
            InitStage::teardown_sequence(ctx.creation_log()).as_slice()
        );
        assert_eq!(ctx.handles().unwrap_err(), ContextError::Released);
        assert_eq!(ctx.surface().unwrap_err(), ContextError::Released);
    }

    #[test]
    fn release_is_idempotent() {
        let Some(mut ctx) = headless() else { return };

        ctx.release();
        let first = ctx.release_log().to_vec();
        ctx.release();

        assert_eq!(ctx.release_log(), first.as_slice());
    }
}
