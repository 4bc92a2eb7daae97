//! gzip + base64 transport encoding for embedded file content.
//!
//! The output alphabet is `[A-Za-z0-9+/=]`, so a payload can sit inside a
//! single-quoted shell literal without escaping. `base64 -d | gunzip` on the
//! target reverses it.

use std::io::{Read, Write};

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

/// Compresses `bytes` into a standalone gzip member and base64-encodes it.
///
/// The gzip header carries no timestamp or file name, so equal input always
/// yields an equal payload.
pub fn encode(bytes: &[u8]) -> std::io::Result<String> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    let compressed = encoder.finish()?;
    Ok(BASE64.encode(compressed))
}

/// Inverse of [`encode`].
pub fn decode(payload: &str) -> Result<Vec<u8>, DecodeError> {
    let compressed = BASE64.decode(payload.trim_end())?;
    let mut decoder = GzDecoder::new(compressed.as_slice());
    let mut bytes = Vec::new();
    decoder
        .read_to_end(&mut bytes)
        .map_err(DecodeError::Gzip)?;
    Ok(bytes)
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("payload is not valid base64")]
    Base64(#[from] base64::DecodeError),
    #[error("payload is not a valid gzip stream")]
    Gzip(#[source] std::io::Error),
}
