//! Recognition results
//!
//! The tagged outcome a single recognizer reports for one buffer, and the
//! owned hostname it hands over on success.

use std::collections::TryReserveError;
use std::fmt;

/// Routing key extracted from a client's first bytes (SNI or `Host`)
///
/// Always non-empty UTF-8. Ownership belongs to whoever received it from a
/// recognizer; nothing in the protocol layer keeps a copy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hostname(String);

impl Hostname {
    /// Wrap an owned name; `None` if it is empty
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        if name.is_empty() {
            None
        } else {
            Some(Self(name))
        }
    }

    /// Copy a hostname out of a borrowed buffer
    ///
    /// Storage is reserved fallibly so that exhaustion surfaces as
    /// [`RecognitionResult::AllocationFailure`] instead of aborting.
    /// Returns `Ok(None)` when the bytes are empty or not UTF-8.
    pub fn try_from_bytes(raw: &[u8]) -> Result<Option<Self>, TryReserveError> {
        let name = match std::str::from_utf8(raw) {
            Ok(name) if !name.is_empty() => name,
            _ => return Ok(None),
        };

        let mut owned = String::new();
        owned.try_reserve_exact(name.len())?;
        owned.push_str(name);
        Ok(Some(Self(owned)))
    }

    /// Byte length of the hostname
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Hostnames are never empty; provided for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Hostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Hostname {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Outcome of one recognizer run against one buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionResult {
    /// The protocol accepted the data and yielded a routing key
    Accepted(Hostname),
    /// Not enough bytes to decide yet
    Incomplete,
    /// Protocol recognized, but it carries no routing key
    NoRoutingKey,
    /// The data definitely does not belong to this protocol
    Unrecognized,
    /// The hostname output slot supplied by the caller was unusable
    InvalidOutputSlot,
    /// Hostname storage could not be allocated
    AllocationFailure,
    /// Protocol-specific failure, opaque to the dispatcher
    OtherError(i32),
}

impl RecognitionResult {
    /// Whether this result ends the trial loop immediately
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Accepted(_)
                | Self::InvalidOutputSlot
                | Self::AllocationFailure
                | Self::OtherError(_)
        )
    }
}

impl From<TryReserveError> for RecognitionResult {
    fn from(_: TryReserveError) -> Self {
        Self::AllocationFailure
    }
}
