//! Embedded OpenAPI document: JSON, gzip, then base64 split into lines.

use std::io::{Read, Write};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde_json::Value;

use crate::error::SpecError;

/// Width of each base64 line in generated source.
pub const CHUNK_WIDTH: usize = 80;

/// Compress and encode `document` into source-friendly chunks.
///
/// The gzip header carries no timestamp, so the same input always yields the
/// same chunks.
pub fn encode_document(document: &[u8]) -> Result<Vec<String>, SpecError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(document)?;
    let compressed = encoder.finish()?;
    let encoded = STANDARD.encode(compressed);
    Ok(encoded
        .as_bytes()
        .chunks(CHUNK_WIDTH)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect())
}

/// Reverse of [`encode_document`].
pub fn decode_document(chunks: &[&str]) -> Result<Value, SpecError> {
    let compressed = STANDARD.decode(chunks.concat())?;
    let mut json = Vec::new();
    GzDecoder::new(compressed.as_slice()).read_to_end(&mut json)?;
    Ok(serde_json::from_slice(&json)?)
}
