//! Logger bootstrap.
//!
//! The engine logs through the `log` facade everywhere; binaries call
//! [`init_logging`] once at startup to install an `env_logger` backend.

mod init;

pub use init::{LoggingConfig, init_logging};
