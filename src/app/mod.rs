//! Application glue module
//!
//! Configuration loading and resolution into build parameters.

mod config;

pub use config::{BuildParams, Config, ConfigError, CursorConfig};
