//! Protocol detection module
//!
//! This module decides which wire protocol a freshly accepted connection is
//! speaking from its first bytes, and extracts the hostname used to route it.
//!
//! Each supported protocol is a [`ProtocolDescriptor`] wrapping a
//! [`Recognizer`]. Descriptors are collected, in trial order, in a
//! [`ProtocolRegistry`], and the [`Dispatcher`] runs them against a buffer and
//! folds their results into one [`DispatchOutcome`].

mod descriptor;
mod dispatcher;
pub mod http;
mod registry;
mod result;
pub mod tls;

pub use descriptor::{ProtocolDescriptor, Recognizer};
pub use dispatcher::{dispatch, DispatchOutcome, Dispatcher, Outcome};
pub use http::HttpRecognizer;
pub use registry::{ProtocolRegistry, ANY_PROTOCOL};
pub use result::{Hostname, RecognitionResult};
pub use tls::TlsRecognizer;
