use std::fmt;

/// One step of the graphics context construction ladder.
///
/// Construction always proceeds instance → surface → adapter → device →
/// queue; teardown is the exact reverse of the steps that completed.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum InitStage {
    Instance,
    Surface,
    Adapter,
    Device,
    Queue,
}

impl InitStage {
    pub fn as_str(self) -> &'static str {
        match self {
            InitStage::Instance => "instance",
            InitStage::Surface => "surface",
            InitStage::Adapter => "adapter",
            InitStage::Device => "device",
            InitStage::Queue => "queue",
        }
    }

    /// Release order for a (possibly partial) construction sequence.
    pub fn teardown_sequence(created: &[InitStage]) -> Vec<InitStage> {
        created.iter().rev().copied().collect()
    }
}

impl fmt::Display for InitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Graphics context construction failure.
///
/// Carries the ladder step that failed; everything created before it has
/// already been dropped by the time this error reaches the caller.
#[derive(Debug, Clone)]
pub struct ContextInitError {
    pub stage: InitStage,
    message: String,
}

impl ContextInitError {
    pub(crate) fn new(stage: InitStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

impl fmt::Display for ContextInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "graphics context init failed at {} step: {}",
            self.stage, self.message
        )
    }
}

impl std::error::Error for ContextInitError {}

/// Capability errors on an existing context.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ContextError {
    /// The context was released; no operation is valid anymore.
    Released,
    /// The context was created without a window surface.
    Headless,
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextError::Released => f.write_str("graphics context already released"),
            ContextError::Headless => f.write_str("graphics context has no surface"),
        }
    }
}

impl std::error::Error for ContextError {}

/// Failure to acquire the next presentable image.
///
/// Treated as fatal by the loop: the presentation chain or device is in a
/// non-recoverable state and the process proceeds to teardown.
#[derive(Debug)]
pub enum AcquireError {
    Context(ContextError),
    Surface(wgpu::SurfaceError),
}

impl fmt::Display for AcquireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcquireError::Context(err) => write!(f, "cannot acquire image: {err}"),
            AcquireError::Surface(err) => write!(f, "cannot acquire image: {err}"),
        }
    }
}

impl std::error::Error for AcquireError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AcquireError::Context(err) => Some(err),
            AcquireError::Surface(err) => Some(err),
        }
    }
}

impl From<ContextError> for AcquireError {
    fn from(err: ContextError) -> Self {
        AcquireError::Context(err)
    }
}

impl From<wgpu::SurfaceError> for AcquireError {
    fn from(err: wgpu::SurfaceError) -> Self {
        AcquireError::Surface(err)
    }
}
