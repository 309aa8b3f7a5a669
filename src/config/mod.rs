//! Configuration module
//!
//! This module handles router configuration: defaults, loading from a JSON
//! file and environment variables, and validation.

mod defaults;
mod error;
mod loader;
mod types;
mod validator;

pub use self::defaults::{DEFAULT_CONFIG_FILE, ENV_PREFIX};
pub use self::error::ConfigError;
pub use self::loader::ConfigLoader;
pub use self::types::{log_config, RouteConfig, RouterConfig};
pub use self::validator::ConfigValidator;
