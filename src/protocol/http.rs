//! HTTP recognizer
//!
//! Recognizes an HTTP/1.x request by its method token and pulls the routing
//! key out of the `Host` header. The header block does not need to be
//! complete once `Host` has been seen.

use bytes::Bytes;
use log::trace;
use once_cell::sync::Lazy;
use std::sync::Arc;

use super::descriptor::{ProtocolDescriptor, Recognizer};
use super::result::{Hostname, RecognitionResult};

/// Registry name of the HTTP protocol
pub const NAME: &str = "http";

/// Conventional HTTP port
pub const DEFAULT_PORT: u16 = 80;

/// `OtherError` code for a `Host` header that is not valid UTF-8
pub const MALFORMED_HOST: i32 = -5;

/// Response sent when an HTTP client cannot be routed
pub const SERVICE_UNAVAILABLE: &[u8] = b"HTTP/1.1 503 Service Temporarily Unavailable\r\n\
Content-Type: text/html\r\n\
Content-Length: 114\r\n\
Connection: close\r\n\
\r\n\
<html><head></head><body><h1>Service Temporarily Unavailable</h1>\
<p>No backend for this request.</p></body></html>";

/// Longest method token we accept before deciding this is not HTTP
const MAX_METHOD_LEN: usize = 16;

static DESCRIPTOR: Lazy<Arc<ProtocolDescriptor>> = Lazy::new(|| {
    Arc::new(ProtocolDescriptor::new(
        NAME,
        DEFAULT_PORT,
        HttpRecognizer,
        Bytes::from_static(SERVICE_UNAVAILABLE),
    ))
});

/// Shared HTTP descriptor
pub fn descriptor() -> Arc<ProtocolDescriptor> {
    Arc::clone(&DESCRIPTOR)
}

/// HTTP/1.x request recognizer
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpRecognizer;

impl Recognizer for HttpRecognizer {
    fn recognize(&self, data: &[u8]) -> RecognitionResult {
        match check_method(data) {
            MethodCheck::Complete => {}
            MethodCheck::Partial => return RecognitionResult::Incomplete,
            MethodCheck::Invalid => return RecognitionResult::Unrecognized,
        }

        let mut lines = Lines::new(data);

        // Request line
        if lines.next().is_none() {
            return RecognitionResult::Incomplete;
        }

        for line in lines {
            if line.is_empty() {
                trace!("HTTP request headers ended without Host");
                return RecognitionResult::NoRoutingKey;
            }

            if let Some(value) = header_value(line, b"host") {
                return host_result(value);
            }
        }

        RecognitionResult::Incomplete
    }
}

enum MethodCheck {
    Complete,
    Partial,
    Invalid,
}

/// Check for `METHOD SP` at the start of the buffer
fn check_method(data: &[u8]) -> MethodCheck {
    for (i, &b) in data.iter().enumerate().take(MAX_METHOD_LEN + 1) {
        match b {
            b' ' if i > 0 => return MethodCheck::Complete,
            b'A'..=b'Z' | b'-' | b'_' if i < MAX_METHOD_LEN => {}
            _ => return MethodCheck::Invalid,
        }
    }
    MethodCheck::Partial
}

/// CRLF-terminated lines; a trailing unterminated line is not yielded
struct Lines<'a> {
    rest: &'a [u8],
}

impl<'a> Lines<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { rest: data }
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        let end = self.rest.windows(2).position(|w| w == b"\r\n")?;
        let line = &self.rest[..end];
        self.rest = &self.rest[end + 2..];
        Some(line)
    }
}

/// Value of header `name` (lower-case) if `line` is that header
fn header_value<'a>(line: &'a [u8], name: &[u8]) -> Option<&'a [u8]> {
    let colon = line.iter().position(|&b| b == b':')?;
    let (field, value) = (&line[..colon], &line[colon + 1..]);
    if field.eq_ignore_ascii_case(name) {
        Some(trim(value))
    } else {
        None
    }
}

fn trim(mut value: &[u8]) -> &[u8] {
    while let [b' ' | b'\t', rest @ ..] = value {
        value = rest;
    }
    while let [rest @ .., b' ' | b'\t'] = value {
        value = rest;
    }
    value
}

/// Drop a trailing `:port`, keeping bracketed IPv6 literals intact
fn strip_port(host: &[u8]) -> &[u8] {
    if host.first() == Some(&b'[') {
        return match host.iter().position(|&b| b == b']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }

    match host.iter().position(|&b| b == b':') {
        Some(colon) => &host[..colon],
        None => host,
    }
}

fn host_result(value: &[u8]) -> RecognitionResult {
    let host = strip_port(value);
    if host.is_empty() {
        return RecognitionResult::NoRoutingKey;
    }

    match Hostname::try_from_bytes(host) {
        Ok(Some(hostname)) => RecognitionResult::Accepted(hostname),
        Ok(None) => RecognitionResult::OtherError(MALFORMED_HOST),
        Err(e) => e.into(),
    }
}
