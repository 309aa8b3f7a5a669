//! Protocol Router Command Line Tool
//!
//! This binary is the command-line interface for Protocol Router.

use clap::Parser;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use protocol_router::{Router, APP_NAME, VERSION};
use protocol_router::common::{Result, init_logger, parse_socket_addr};
use protocol_router::config::{
    log_config, ConfigLoader, ConfigValidator, RouterConfig, DEFAULT_CONFIG_FILE,
};

/// Protocol Router: route TLS and HTTP connections by hostname
#[derive(Parser, Debug)]
#[command(author, version = VERSION, about, long_about = None)]
struct Args {
    /// Configuration file (JSON); defaults to ./config.json when present
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides the configuration file
    #[arg(short, long)]
    listen: Option<String>,

    /// Protocols to try in order (tls, http, any), comma separated
    #[arg(short, long, value_delimiter = ',')]
    protocols: Option<Vec<String>>,

    /// Backend for requests without a hostname or matching route
    #[arg(long)]
    fallback: Option<String>,

    /// Log level
    #[arg(long)]
    log_level: Option<String>,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,
}

/// Load the configuration file and environment, then apply command line overrides
fn load_config(args: &Args) -> Result<RouterConfig> {
    let default_path = Path::new(DEFAULT_CONFIG_FILE);
    let path = match args.config.as_deref() {
        Some(path) => Some(path),
        None if default_path.is_file() => Some(default_path),
        None => None,
    };

    let mut config = RouterConfig::load(path)?;

    if let Some(ref listen) = args.listen {
        config.listen = parse_socket_addr(listen)?;
    }
    if let Some(ref protocols) = args.protocols {
        config.protocols = protocols.clone();
    }
    if let Some(ref fallback) = args.fallback {
        config.fallback = Some(fallback.clone());
    }
    if let Some(ref log_level) = args.log_level {
        config.log_level = log_level.clone();
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    let config = load_config(&args)?;

    // Initialize logger
    init_logger(&config.log_level);

    info!("Starting {} v{}", APP_NAME, VERSION);
    log_config(&config);

    for warning in config.check_warnings() {
        warn!("{}", warning);
    }

    if args.check {
        info!("Configuration is valid");
        return Ok(());
    }

    let router = Router::new(Arc::new(config))?;

    info!("Router ready, press Ctrl+C to stop");

    tokio::select! {
        result = router.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
            Ok(())
        }
    }
}
