//! Tracing initialization for chainboard binaries and tests.
pub mod logging;

pub use logging::{init, LogConfig, LogFormat, LogOutput};
