use serde::de::DeserializeOwned;

use crate::error::DecodeError;
use crate::http::find_header;

/// A response as the transport received it, before any decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// The `Content-Type` header, or `""` when it is missing.
    pub fn content_type(&self) -> &str {
        self.header("content-type").unwrap_or_default()
    }
}

/// Decode a JSON body. On failure the raw body stays available on the error.
pub fn decode_json<T: DeserializeOwned>(response: &RawResponse) -> Result<T, DecodeError> {
    serde_json::from_slice(&response.body).map_err(|source| DecodeError::Json {
        status: response.status,
        content_type: response.content_type().to_string(),
        body: response.body.clone(),
        source,
    })
}

pub fn decode_text(response: &RawResponse) -> Result<String, DecodeError> {
    String::from_utf8(response.body.clone()).map_err(|err| DecodeError::Text {
        status: response.status,
        body: err.into_bytes(),
    })
}
