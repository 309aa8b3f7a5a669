//! Configuration loading functionality
//!
//! Layers, lowest priority first: built-in defaults, a JSON file, then
//! `PROTOCOL_ROUTER_*` environment variables. Command-line overrides are
//! applied on top by the binary.

use ::config::{Config, Environment, File, FileFormat};
use log::{debug, info};
use std::path::Path;

use super::defaults::ENV_PREFIX;
use super::error::{ConfigError, Result};
use super::types::RouterConfig;

/// Trait for loading configuration from different sources
pub trait ConfigLoader: Sized {
    /// Load configuration from a JSON file, defaults filling the gaps
    fn from_file<P: AsRef<Path>>(path: P) -> Result<Self>;

    /// Load configuration from environment variables, defaults filling the gaps
    fn from_env() -> Result<Self>;

    /// Load defaults, then the file if given, then environment variables
    fn load(path: Option<&Path>) -> Result<Self>;
}

/// Environment source: `PROTOCOL_ROUTER_LOG_LEVEL`, `PROTOCOL_ROUTER_PROTOCOLS=tls,http`, ...
fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("protocols")
}

fn file_source(path: &Path) -> Result<File<::config::FileSourceFile, FileFormat>> {
    if !path.is_file() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }
    Ok(File::from(path).format(FileFormat::Json).required(true))
}

impl ConfigLoader for RouterConfig {
    fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config = Config::builder()
            .add_source(file_source(path)?)
            .build()?;

        debug!("Configuration loaded from {}", path.display());
        Ok(config.try_deserialize()?)
    }

    fn from_env() -> Result<Self> {
        let config = Config::builder()
            .add_source(environment())
            .build()?;

        Ok(config.try_deserialize()?)
    }

    fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            info!("Loading configuration from {}", path.display());
            builder = builder.add_source(file_source(path)?);
        } else {
            debug!("No configuration file given, using defaults and environment");
        }

        let config = builder.add_source(environment()).build()?;
        Ok(config.try_deserialize()?)
    }
}
