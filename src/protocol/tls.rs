//! TLS recognizer
//!
//! Finds the SNI `host_name` in a TLS ClientHello without any TLS library.
//!
//! ```text
//! record:       type(1)=0x16 | version(2) | length(2) | fragment
//! handshake:    type(1)=0x01 | length(3) | ClientHello
//! ClientHello:  version(2) | random(32) | session_id<1> | cipher_suites<2>
//!               | compression_methods<1> | extensions<2>
//! extension:    type(2) | length(2) | data
//! server_name:  list_len(2) | { name_type(1) | name_len(2) | name }*
//! ```

use bytes::Bytes;
use log::{debug, trace};
use once_cell::sync::Lazy;
use std::sync::Arc;

use super::descriptor::{ProtocolDescriptor, Recognizer};
use super::result::{Hostname, RecognitionResult};

/// Registry name of the TLS protocol
pub const NAME: &str = "tls";

/// Conventional TLS port
pub const DEFAULT_PORT: u16 = 443;

/// `OtherError` code for a ClientHello that is TLS but malformed
pub const MALFORMED_CLIENT_HELLO: i32 = -5;

/// Fatal `handshake_failure` alert
pub const ALERT_HANDSHAKE_FAILURE: &[u8] = &[
    0x15, // alert record
    0x03, 0x01, // TLS 1.0 record version
    0x00, 0x02, // length
    0x02, 0x28, // fatal, handshake_failure
];

const RECORD_HEADER_LEN: usize = 5;
const HANDSHAKE_CONTENT_TYPE: u8 = 0x16;
const CLIENT_HELLO: u8 = 0x01;
const SERVER_NAME_EXTENSION: u16 = 0x0000;
const HOST_NAME_TYPE: u8 = 0x00;

static DESCRIPTOR: Lazy<Arc<ProtocolDescriptor>> = Lazy::new(|| {
    Arc::new(ProtocolDescriptor::new(
        NAME,
        DEFAULT_PORT,
        TlsRecognizer,
        Bytes::from_static(ALERT_HANDSHAKE_FAILURE),
    ))
});

/// Shared TLS descriptor
pub fn descriptor() -> Arc<ProtocolDescriptor> {
    Arc::clone(&DESCRIPTOR)
}

/// TLS ClientHello recognizer
#[derive(Debug, Clone, Copy, Default)]
pub struct TlsRecognizer;

impl Recognizer for TlsRecognizer {
    fn recognize(&self, data: &[u8]) -> RecognitionResult {
        if data.len() < RECORD_HEADER_LEN {
            return RecognitionResult::Incomplete;
        }

        // SSLv2-compatible hello: valid, but it has no room for SNI
        if data[0] & 0x80 != 0 && data[2] == 1 {
            debug!("Received SSLv2 compatible ClientHello, no SNI possible");
            return RecognitionResult::NoRoutingKey;
        }

        if data[0] != HANDSHAKE_CONTENT_TYPE {
            return RecognitionResult::Unrecognized;
        }

        let (major, minor) = (data[1], data[2]);
        if major < 3 {
            debug!("Received SSL {}.{} handshake which cannot carry SNI", major, minor);
            return RecognitionResult::NoRoutingKey;
        }
        if major > 3 {
            return RecognitionResult::Unrecognized;
        }

        let record_len = u16::from_be_bytes([data[3], data[4]]) as usize;
        if data.len() < RECORD_HEADER_LEN + record_len {
            trace!(
                "TLS record needs {} bytes, have {}",
                RECORD_HEADER_LEN + record_len,
                data.len()
            );
            return RecognitionResult::Incomplete;
        }

        let record = &data[RECORD_HEADER_LEN..RECORD_HEADER_LEN + record_len];
        match parse_client_hello(record, (major, minor)) {
            Ok(result) => result,
            Err(Malformed(reason)) => {
                debug!("Malformed TLS ClientHello: {}", reason);
                RecognitionResult::OtherError(MALFORMED_CLIENT_HELLO)
            }
        }
    }
}

struct Malformed(&'static str);

/// Bounds-checked big-endian reader over one record
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn take(&mut self, n: usize, what: &'static str) -> Result<&'a [u8], Malformed> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.buf.len())
            .ok_or(Malformed(what))?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self, what: &'static str) -> Result<u8, Malformed> {
        Ok(self.take(1, what)?[0])
    }

    fn u16(&mut self, what: &'static str) -> Result<u16, Malformed> {
        let b = self.take(2, what)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u24(&mut self, what: &'static str) -> Result<usize, Malformed> {
        let b = self.take(3, what)?;
        Ok(((b[0] as usize) << 16) | ((b[1] as usize) << 8) | b[2] as usize)
    }

    /// Read a length-prefixed vector with a 1-byte length
    fn vec8(&mut self, what: &'static str) -> Result<&'a [u8], Malformed> {
        let len = self.u8(what)? as usize;
        self.take(len, what)
    }

    /// Read a length-prefixed vector with a 2-byte length
    fn vec16(&mut self, what: &'static str) -> Result<&'a [u8], Malformed> {
        let len = self.u16(what)? as usize;
        self.take(len, what)
    }
}

fn parse_client_hello(record: &[u8], version: (u8, u8)) -> Result<RecognitionResult, Malformed> {
    let mut reader = Reader::new(record);

    if reader.u8("handshake type")? != CLIENT_HELLO {
        return Err(Malformed("handshake is not a ClientHello"));
    }

    // Handshake length is not checked against the record: a ClientHello
    // split over several records still carries what we need in the first.
    reader.u24("handshake length")?;
    reader.take(2 + 32, "client version and random")?;
    reader.vec8("session id")?;
    reader.vec16("cipher suites")?;
    reader.vec8("compression methods")?;

    if reader.is_empty() {
        if version == (3, 0) {
            debug!("Received SSL 3.0 ClientHello without extensions");
        }
        return Ok(RecognitionResult::NoRoutingKey);
    }

    let mut extensions = Reader::new(reader.vec16("extensions")?);
    while !extensions.is_empty() {
        let ext_type = extensions.u16("extension type")?;
        let ext_data = extensions.vec16("extension data")?;

        if ext_type == SERVER_NAME_EXTENSION {
            return parse_server_name(ext_data);
        }
    }

    Ok(RecognitionResult::NoRoutingKey)
}

fn parse_server_name(ext_data: &[u8]) -> Result<RecognitionResult, Malformed> {
    let mut names = Reader::new(Reader::new(ext_data).vec16("server name list")?);

    while !names.is_empty() {
        let name_type = names.u8("server name type")?;
        let name = names.vec16("server name")?;

        if name_type == HOST_NAME_TYPE {
            return match Hostname::try_from_bytes(name) {
                Ok(Some(hostname)) => Ok(RecognitionResult::Accepted(hostname)),
                Ok(None) => Err(Malformed("host name is empty or not UTF-8")),
                Err(e) => Ok(e.into()),
            };
        }

        trace!("Skipping server name of unknown type {}", name_type);
    }

    Ok(RecognitionResult::NoRoutingKey)
}
