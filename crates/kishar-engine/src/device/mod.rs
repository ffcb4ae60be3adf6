//! GPU device + presentation management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Surface/Adapter/Device/Queue ladder
//! - configuring the presentation chain against a window surface
//! - acquiring presentable images and presenting them in FIFO order
//! - releasing every handle in strict reverse creation order

mod chain;
mod context;
mod error;

pub use chain::{AcquiredImage, ChainCreateError, PresentationChain};
pub use context::{ContextInit, GraphicsContext, Handles};
pub use error::{AcquireError, ContextError, ContextInitError, InitStage};
