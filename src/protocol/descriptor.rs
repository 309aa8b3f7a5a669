//! Protocol descriptors
//!
//! A descriptor is the read-only capability record for one supported
//! protocol: a name, an informational default port, a recognizer and the
//! canned bytes to send back when this protocol is blamed for a rejection.

use bytes::Bytes;
use std::fmt;
use std::sync::Arc;

use super::result::RecognitionResult;

/// Recognizer trait
///
/// Inspects the bytes received so far on a connection and classifies them.
/// Implementations are shared by every connection, so they must be pure with
/// respect to shared state and must not keep the buffer after returning.
pub trait Recognizer: Send + Sync {
    /// Classify `data`, extracting the routing hostname if present
    fn recognize(&self, data: &[u8]) -> RecognitionResult;
}

#[cfg(test)]
mockall::mock! {
    pub Recognizer {}
    impl Recognizer for Recognizer {
        fn recognize(&self, data: &[u8]) -> RecognitionResult;
    }
}

impl<F> Recognizer for F
where
    F: Fn(&[u8]) -> RecognitionResult + Send + Sync,
{
    fn recognize(&self, data: &[u8]) -> RecognitionResult {
        self(data)
    }
}

/// Protocol descriptor
///
/// Constructed once, then shared behind an `Arc` for the life of the
/// process. There are no setters: per-connection state never lives here.
#[derive(Clone)]
pub struct ProtocolDescriptor {
    name: Arc<str>,
    default_port: u16,
    recognizer: Arc<dyn Recognizer>,
    rejection_payload: Bytes,
}

impl ProtocolDescriptor {
    /// Create a new descriptor
    ///
    /// # Parameters
    ///
    /// * `name` - Identifier, unique within a registry
    /// * `default_port` - Conventional port of the protocol
    /// * `recognizer` - Recognition function
    /// * `rejection_payload` - Bytes sent to a client refused under this protocol
    pub fn new(
        name: impl Into<Arc<str>>,
        default_port: u16,
        recognizer: impl Recognizer + 'static,
        rejection_payload: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            default_port,
            recognizer: Arc::new(recognizer),
            rejection_payload: rejection_payload.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_port(&self) -> u16 {
        self.default_port
    }

    pub fn rejection_payload(&self) -> &Bytes {
        &self.rejection_payload
    }

    /// Run this protocol's recognizer on `data`
    #[inline]
    pub fn recognize(&self, data: &[u8]) -> RecognitionResult {
        self.recognizer.recognize(data)
    }
}

impl fmt::Debug for ProtocolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolDescriptor")
            .field("name", &self.name)
            .field("default_port", &self.default_port)
            .field("rejection_payload_len", &self.rejection_payload.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_recognizer() {
        let descriptor = ProtocolDescriptor::new(
            "echo",
            7,
            |data: &[u8]| {
                if data.is_empty() {
                    RecognitionResult::Incomplete
                } else {
                    RecognitionResult::NoRoutingKey
                }
            },
            Bytes::from_static(b"nope"),
        );

        assert_eq!(descriptor.name(), "echo");
        assert_eq!(descriptor.default_port(), 7);
        assert_eq!(descriptor.rejection_payload().as_ref(), b"nope");
        assert_eq!(descriptor.recognize(b""), RecognitionResult::Incomplete);
        assert_eq!(descriptor.recognize(b"x"), RecognitionResult::NoRoutingKey);
    }

    #[test]
    fn test_mock_recognizer() {
        let mut mock = MockRecognizer::new();
        mock.expect_recognize()
            .times(1)
            .returning(|_| RecognitionResult::OtherError(-7));

        let descriptor = ProtocolDescriptor::new("mock", 0, mock, Bytes::new());
        assert_eq!(descriptor.recognize(b"abc"), RecognitionResult::OtherError(-7));
    }

    #[test]
    fn test_debug_omits_payload_bytes() {
        let descriptor = ProtocolDescriptor::new(
            "x",
            1,
            |_: &[u8]| RecognitionResult::Unrecognized,
            Bytes::from_static(b"secret"),
        );
        let debug = format!("{:?}", descriptor);
        assert!(debug.contains("rejection_payload_len: 6"));
        assert!(!debug.contains("secret"));
    }
}
