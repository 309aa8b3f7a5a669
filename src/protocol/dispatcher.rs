//! Protocol dispatcher
//!
//! Tries every registered recognizer against one buffer and folds their
//! results into a single decision.
//!
//! Priority, highest first:
//!
//! 1. `Accepted`, `InvalidOutputSlot`, `AllocationFailure`, `OtherError` stop
//!    the trial loop at once; the first one in registry order wins.
//! 2. `NoRoutingKey`, the last descriptor reporting it is blamed.
//! 3. `Incomplete`, the last descriptor reporting it is blamed.
//! 4. `Unrecognized` when no recognizer gave any of the above.
//!
//! The selected rejection payload travels inside the returned
//! [`DispatchOutcome`]; registry and descriptors are never written to, so one
//! dispatcher can serve any number of connections concurrently.

use bytes::Bytes;
use log::{error, trace};
use std::sync::Arc;

use super::descriptor::ProtocolDescriptor;
use super::registry::ProtocolRegistry;
use super::result::{Hostname, RecognitionResult};

/// Unified classification of a dispatch call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A protocol accepted the data; `len` is the hostname's byte length
    Accepted { len: usize },
    /// Buffer more bytes and dispatch again
    Incomplete,
    /// Protocol understood, but no hostname to route on
    NoRoutingKey,
    /// The caller passed no hostname slot
    InvalidOutputSlot,
    /// Hostname storage could not be allocated
    AllocationFailure,
    /// Opaque recognizer failure code
    OtherError(i32),
    /// No recognizer claimed the data
    Unrecognized,
}

impl Outcome {
    /// Short label for logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted { .. } => "accepted",
            Self::Incomplete => "incomplete",
            Self::NoRoutingKey => "no_routing_key",
            Self::InvalidOutputSlot => "invalid_output_slot",
            Self::AllocationFailure => "allocation_failure",
            Self::OtherError(_) => "other_error",
            Self::Unrecognized => "unrecognized",
        }
    }
}

/// Result of one dispatch call
///
/// Owns everything the caller needs: the hostname on success, the blamed (or
/// accepting) descriptor and that descriptor's rejection payload. On
/// `Accepted` the payload is kept too, so a caller that later refuses the
/// connection for its own reasons (e.g. no backend) can still answer in the
/// client's protocol.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    outcome: Outcome,
    hostname: Option<Hostname>,
    protocol: Option<Arc<ProtocolDescriptor>>,
    rejection_payload: Bytes,
}

impl DispatchOutcome {
    fn accepted(hostname: Hostname, descriptor: &Arc<ProtocolDescriptor>) -> Self {
        Self {
            outcome: Outcome::Accepted { len: hostname.len() },
            hostname: Some(hostname),
            protocol: Some(Arc::clone(descriptor)),
            rejection_payload: descriptor.rejection_payload().clone(),
        }
    }

    fn blamed(outcome: Outcome, descriptor: &Arc<ProtocolDescriptor>) -> Self {
        Self {
            outcome,
            hostname: None,
            protocol: Some(Arc::clone(descriptor)),
            rejection_payload: descriptor.rejection_payload().clone(),
        }
    }

    fn unblamed(outcome: Outcome) -> Self {
        Self {
            outcome,
            hostname: None,
            protocol: None,
            rejection_payload: Bytes::new(),
        }
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Hostname on the `Accepted` path, unless already moved out
    pub fn hostname(&self) -> Option<&Hostname> {
        self.hostname.as_ref()
    }

    /// Move the hostname out of the outcome
    pub fn take_hostname(&mut self) -> Option<Hostname> {
        self.hostname.take()
    }

    /// The accepting or blamed descriptor, if any
    pub fn protocol(&self) -> Option<&Arc<ProtocolDescriptor>> {
        self.protocol.as_ref()
    }

    pub fn protocol_name(&self) -> Option<&str> {
        self.protocol.as_deref().map(ProtocolDescriptor::name)
    }

    /// Bytes to send the client if the connection is refused
    pub fn rejection_payload(&self) -> &Bytes {
        &self.rejection_payload
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self.outcome, Outcome::Accepted { .. })
    }

    pub fn is_incomplete(&self) -> bool {
        self.outcome == Outcome::Incomplete
    }
}

impl PartialEq for DispatchOutcome {
    fn eq(&self, other: &Self) -> bool {
        self.outcome == other.outcome
            && self.hostname == other.hostname
            && self.protocol_name() == other.protocol_name()
            && self.rejection_payload == other.rejection_payload
    }
}

impl Eq for DispatchOutcome {}

/// Run every recognizer in `registry` against `data` and aggregate
///
/// Never mutates `data` or `registry`, and invokes each recognizer at most
/// once.
pub fn dispatch(data: &[u8], registry: &ProtocolRegistry) -> DispatchOutcome {
    let mut no_routing_key: Option<&Arc<ProtocolDescriptor>> = None;
    let mut incomplete: Option<&Arc<ProtocolDescriptor>> = None;

    for descriptor in registry.iter() {
        let result = descriptor.recognize(data);
        trace!("{} recognizer on {} bytes: {:?}", descriptor.name(), data.len(), result);

        match result {
            RecognitionResult::Accepted(hostname) => {
                return DispatchOutcome::accepted(hostname, descriptor);
            }
            RecognitionResult::InvalidOutputSlot => {
                return DispatchOutcome::blamed(Outcome::InvalidOutputSlot, descriptor);
            }
            RecognitionResult::AllocationFailure => {
                return DispatchOutcome::blamed(Outcome::AllocationFailure, descriptor);
            }
            RecognitionResult::OtherError(code) => {
                return DispatchOutcome::blamed(Outcome::OtherError(code), descriptor);
            }
            RecognitionResult::NoRoutingKey => no_routing_key = Some(descriptor),
            RecognitionResult::Incomplete => incomplete = Some(descriptor),
            RecognitionResult::Unrecognized => {}
        }
    }

    if let Some(descriptor) = no_routing_key {
        return DispatchOutcome::blamed(Outcome::NoRoutingKey, descriptor);
    }

    if let Some(descriptor) = incomplete {
        return DispatchOutcome::blamed(Outcome::Incomplete, descriptor);
    }

    DispatchOutcome::unblamed(Outcome::Unrecognized)
}

/// Protocol dispatcher
///
/// Cheap to clone; clones share the same registry.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ProtocolRegistry>,
}

impl Dispatcher {
    /// Create a dispatcher over `registry`
    pub fn new(registry: impl Into<Arc<ProtocolRegistry>>) -> Self {
        Self {
            registry: registry.into(),
        }
    }

    pub fn registry(&self) -> &ProtocolRegistry {
        &self.registry
    }

    /// Classify `data`; the hostname, if any, stays in the outcome
    pub fn dispatch(&self, data: &[u8]) -> DispatchOutcome {
        dispatch(data, &self.registry)
    }

    /// Classify `data`, moving an accepted hostname into `slot`
    ///
    /// A missing slot is a caller bug: it is reported as
    /// `InvalidOutputSlot` before any recognizer runs. The slot is only
    /// written on `Accepted`.
    pub fn dispatch_into(
        &self,
        data: &[u8],
        slot: Option<&mut Option<Hostname>>,
    ) -> DispatchOutcome {
        let Some(slot) = slot else {
            error!("dispatch called without a hostname slot");
            return DispatchOutcome::unblamed(Outcome::InvalidOutputSlot);
        };

        let mut outcome = self.dispatch(data);
        if outcome.is_accepted() {
            *slot = outcome.take_hostname();
        }
        outcome
    }
}
