//! Request assembly and dispatch for generated clients.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{BuildError, ClientError, TransportError};
use crate::http::{Method, find_header};
use crate::query::{build_cookie_header, build_query};
use crate::response::RawResponse;
use crate::style::{Style, encode_query};

/// A request that has been built but not yet sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl PendingRequest {
    /// `path` must already have its parameters substituted and encoded.
    pub fn new(method: Method, server: &str, path: &str) -> Self {
        Self {
            method,
            url: join_url(server, path),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Append already-styled pairs to the query string.
    pub fn append_query(&mut self, pairs: &[(String, String)]) {
        if pairs.is_empty() {
            return;
        }
        let separator = if self.url.contains('?') { '&' } else { '?' };
        self.url.push(separator);
        self.url.push_str(&build_query(pairs));
    }

    /// Set a header, replacing any earlier value with the same name.
    pub fn insert_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|(key, _)| !key.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
    }

    /// Add cookie pairs, merging with a `Cookie` header that is already set.
    pub fn append_cookies(&mut self, pairs: &[(String, String)]) {
        if pairs.is_empty() {
            return;
        }
        let rendered = build_cookie_header(pairs);
        let value = match self.header("cookie") {
            Some(existing) if !existing.is_empty() => format!("{existing}; {rendered}"),
            _ => rendered,
        };
        self.insert_header("Cookie", value);
    }

    pub fn set_body(&mut self, content_type: &str, body: Vec<u8>) {
        self.insert_header("Content-Type", content_type);
        self.body = Some(body);
    }

    pub fn set_json_body<T: Serialize + ?Sized>(
        &mut self,
        content_type: &str,
        body: &T,
    ) -> Result<(), BuildError> {
        let encoded = serde_json::to_vec(body)?;
        self.set_body(content_type, encoded);
        Ok(())
    }

    /// Encode `body` as `application/x-www-form-urlencoded`, one exploded form
    /// pair per property.
    pub fn set_form_body<T: Serialize + ?Sized>(
        &mut self,
        content_type: &str,
        body: &T,
    ) -> Result<(), BuildError> {
        let value = serde_json::to_value(body)?;
        let pairs = encode_query("", Style::Form, true, &value).map_err(BuildError::Form)?;
        self.set_body(content_type, build_query(&pairs).into_bytes());
        Ok(())
    }

    pub fn set_text_body(&mut self, content_type: &str, body: &str) {
        self.set_body(content_type, body.as_bytes().to_vec());
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// Join a server URL and a path without doubling or dropping the slash.
pub fn join_url(server: &str, path: &str) -> String {
    let server = server.trim_end_matches('/');
    if path.is_empty() {
        return server.to_string();
    }
    if path.starts_with('/') {
        format!("{server}{path}")
    } else {
        format!("{server}/{path}")
    }
}

/// Hook run on every request after it is built and before it is sent.
pub type RequestEditor =
    Arc<dyn Fn(&mut PendingRequest) -> Result<(), BuildError> + Send + Sync>;

/// Sends requests for a generated client.
///
/// The generated code never depends on an HTTP library; callers plug one in
/// by implementing this trait.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: PendingRequest,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send;
}

/// Run the editors in order, then send.
pub async fn dispatch<T: Transport>(
    transport: &T,
    editors: &[RequestEditor],
    mut request: PendingRequest,
) -> Result<RawResponse, ClientError> {
    for editor in editors {
        editor(&mut request)?;
    }
    log::debug!("{} {}", request.method, request.url);
    let response = transport.send(request).await?;
    log::debug!("received status {}", response.status);
    Ok(response)
}
