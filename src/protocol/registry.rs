//! Protocol registry
//!
//! An ordered, immutable list of descriptors. Order is the trial order the
//! dispatcher uses; the first acceptance in list order wins.

use log::debug;
use std::collections::HashSet;
use std::sync::Arc;

use crate::common::{Result, RouterError};
use super::descriptor::ProtocolDescriptor;
use super::{http, tls};

/// Name that expands to every built-in protocol in trial order
pub const ANY_PROTOCOL: &str = "any";

/// Ordered set of protocol descriptors
#[derive(Debug, Clone)]
pub struct ProtocolRegistry {
    descriptors: Vec<Arc<ProtocolDescriptor>>,
}

impl ProtocolRegistry {
    /// Build a registry from descriptors in trial order
    ///
    /// # Errors
    ///
    /// Fails if `descriptors` is empty or two descriptors share a name.
    pub fn new(descriptors: Vec<Arc<ProtocolDescriptor>>) -> Result<Self> {
        if descriptors.is_empty() {
            return Err(RouterError::Registry(
                "registry must contain at least one protocol".to_string(),
            ));
        }

        {
            let mut seen = HashSet::with_capacity(descriptors.len());
            for descriptor in &descriptors {
                if !seen.insert(descriptor.name()) {
                    return Err(RouterError::Registry(format!(
                        "duplicate protocol: {}",
                        descriptor.name()
                    )));
                }
            }
        }

        Ok(Self { descriptors })
    }

    /// The built-in protocols, TLS first then HTTP
    pub fn standard() -> Self {
        Self {
            descriptors: vec![tls::descriptor(), http::descriptor()],
        }
    }

    /// Build a registry from configured protocol names
    ///
    /// Accepts `tls`, `http` and `any` (case-insensitive). `any` expands to
    /// the standard list; expanded duplicates are an error like any other.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let mut descriptors = Vec::with_capacity(names.len());

        for name in names {
            match name.as_ref().to_ascii_lowercase().as_str() {
                tls::NAME => descriptors.push(tls::descriptor()),
                http::NAME => descriptors.push(http::descriptor()),
                ANY_PROTOCOL => {
                    descriptors.push(tls::descriptor());
                    descriptors.push(http::descriptor());
                }
                other => {
                    return Err(RouterError::Registry(format!(
                        "unknown protocol: {}. Valid values are: tls, http, any",
                        other
                    )));
                }
            }
        }

        let registry = Self::new(descriptors)?;
        debug!("Protocol registry: [{}]", registry.names().collect::<Vec<_>>().join(", "));
        Ok(registry)
    }

    /// Descriptors in trial order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ProtocolDescriptor>> {
        self.descriptors.iter()
    }

    /// Protocol names in trial order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.iter().map(|d| d.name())
    }

    /// Look up a descriptor by name
    pub fn get(&self, name: &str) -> Option<&Arc<ProtocolDescriptor>> {
        self.descriptors.iter().find(|d| d.name() == name)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Always false for a constructed registry
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
