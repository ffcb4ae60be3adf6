//! Window + application loop runtime.
//!
//! Wraps the winit event loop behind a small driver that owns the frame
//! clock, the scene, and the per-window graphics bundle, and walks the
//! lifecycle Uninitialized → Running → Terminating → Stopped.

mod runtime;
mod state;

pub use runtime::{Runtime, RuntimeConfig};
pub use state::LoopState;
