//! Configuration for the perch runtime.
//!
//! [`PerchConfig`] is loaded with figment from defaults, optional TOML/YAML
//! files and `PERCH_*` environment variables, then checked by
//! [`validate_config`] before the runtime is built.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, PerchConfig, SpanEventConfig,
};
pub use validation::validate_config;
