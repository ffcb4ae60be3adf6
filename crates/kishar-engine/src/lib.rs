//! Kishar engine crate.
//!
//! A small real-time rendering scaffold: a fixed-size window, a wgpu
//! device/surface context, one compiled triangle pipeline, and a per-frame
//! loop driving a flat scene of transform-carrying entities.

pub mod device;
pub mod render;
pub mod scene;
pub mod time;
pub mod window;

pub mod logging;
