//! Backend routing table
//!
//! Maps a routing hostname to the backend address a connection is forwarded
//! to. Entries are tried in configuration order and the first match wins.

use log::trace;

use crate::config::RouterConfig;

/// Where a matched route sends the connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// Fixed `host:port`
    Address(String),
    /// The requested hostname itself, on the protocol's default port
    Requested,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pattern {
    /// Lower-cased exact hostname
    Exact(String),
    /// Lower-cased suffix including the leading dot, from `*.example.com`
    Wildcard(String),
}

impl Pattern {
    fn parse(pattern: &str) -> Self {
        let pattern = pattern.trim_end_matches('.').to_ascii_lowercase();
        match pattern.strip_prefix('*') {
            Some(suffix) if suffix.starts_with('.') => Self::Wildcard(suffix.to_string()),
            _ => Self::Exact(pattern),
        }
    }

    fn matches(&self, hostname: &str) -> bool {
        match self {
            Self::Exact(name) => name == hostname,
            Self::Wildcard(suffix) => {
                hostname.len() > suffix.len() && hostname.ends_with(suffix.as_str())
            }
        }
    }
}

#[derive(Debug, Clone)]
struct Route {
    pattern: Pattern,
    backend: Backend,
}

/// Ordered hostname → backend table with an optional fallback
#[derive(Debug, Clone, Default)]
pub struct BackendTable {
    routes: Vec<Route>,
    fallback: Option<String>,
}

impl BackendTable {
    /// Build the table from the configured routes and fallback
    pub fn from_config(config: &RouterConfig) -> Self {
        let routes = config
            .routes
            .iter()
            .map(|route| Route {
                pattern: Pattern::parse(&route.hostname),
                backend: if route.backend == "*" {
                    Backend::Requested
                } else {
                    Backend::Address(route.backend.clone())
                },
            })
            .collect();

        Self {
            routes,
            fallback: config.fallback.clone(),
        }
    }

    /// First route matching `hostname` (case-insensitive, trailing dot ignored)
    pub fn lookup(&self, hostname: &str) -> Option<&Backend> {
        let hostname = hostname.trim_end_matches('.').to_ascii_lowercase();
        self.routes
            .iter()
            .find(|route| route.pattern.matches(&hostname))
            .map(|route| &route.backend)
    }

    /// Backend used when there is no hostname or no matching route
    pub fn fallback(&self) -> Option<&str> {
        self.fallback.as_deref()
    }

    /// Address to connect to for `hostname`, falling back when nothing matches
    pub fn resolve(&self, hostname: &str, default_port: u16) -> Option<String> {
        match self.lookup(hostname) {
            Some(Backend::Address(address)) => Some(address.clone()),
            Some(Backend::Requested) => Some(format!("{}:{}", hostname, default_port)),
            None => {
                trace!("No route for {}, fallback: {:?}", hostname, self.fallback);
                self.fallback.clone()
            }
        }
    }
}
