//! Request binding and route registration for generated servers.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::{BindingError, StyleError};
use crate::http::{Method, find_header};
use crate::query::{FormPairs, decode_component};
use crate::style::{ParamShape, Style, decode_query, decode_simple, from_wire};

/// A request as the HTTP framework hands it to a generated handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncomingRequest {
    pub method: Method,
    pub path: String,
    /// Raw segments captured by the router, still percent-encoded.
    pub path_params: BTreeMap<String, String>,
    /// Raw query string without the leading `?`.
    pub query: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl IncomingRequest {
    /// Build a request from a method and a `path?query` target.
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        Self {
            method,
            path: path.to_string(),
            query: query.to_string(),
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        self.headers
            .push(("Content-Type".to_string(), content_type.to_string()));
        self.body = body.into();
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn content_type(&self) -> &str {
        self.header("content-type").unwrap_or_default()
    }

    /// Query pairs, with the operation's parameter names reserved.
    pub fn query_pairs(&self, reserved: &[&str]) -> FormPairs {
        FormPairs::parse_query(&self.query).reserve(reserved)
    }

    /// Cookie pairs, with the operation's cookie names reserved.
    pub fn cookies(&self, reserved: &[&str]) -> FormPairs {
        FormPairs::parse_cookies(self.header("cookie").unwrap_or_default()).reserve(reserved)
    }
}

/// A response produced by a generated handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn bytes(status: u16, content_type: &str, body: Vec<u8>) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), content_type.to_string())],
            body,
        }
    }

    pub fn json<T: Serialize + ?Sized>(status: u16, content_type: &str, body: &T) -> Self {
        match serde_json::to_vec(body) {
            Ok(encoded) => Self::bytes(status, content_type, encoded),
            Err(err) => HandlerError::Internal(format!("cannot encode response: {err}")).into_reply(),
        }
    }

    pub fn text(status: u16, content_type: &str, body: impl Into<String>) -> Self {
        Self::bytes(status, content_type, body.into().into_bytes())
    }

    pub fn empty(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// Failure of a generated handler, mapped to a status code.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error("operation is not implemented")]
    NotImplemented,

    #[error("{0}")]
    Internal(String),
}

impl HandlerError {
    pub fn status(&self) -> u16 {
        match self {
            HandlerError::Binding(BindingError::UnsupportedContentType(_)) => 415,
            HandlerError::Binding(_) => 400,
            HandlerError::NotImplemented => 501,
            HandlerError::Internal(_) => 500,
        }
    }

    pub fn into_reply(self) -> Reply {
        let status = self.status();
        if status >= 500 {
            log::error!("handler failed: {self}");
        } else {
            log::debug!("rejected request: {self}");
        }
        Reply::text(status, "text/plain", self.to_string())
    }
}

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// A registered route handler.
pub type Handler = Arc<dyn Fn(IncomingRequest) -> BoxFuture<Reply> + Send + Sync>;

/// Anything generated handlers can be registered on.
///
/// Paths use OpenAPI templates (`/pets/{id}`); implementations fill
/// [`IncomingRequest::path_params`] with the captured segments.
pub trait Router {
    fn route(&mut self, method: Method, path: &str, handler: Handler);
}

/// Prefix a route path with a base URL path.
pub fn join_route(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        return path.to_string();
    }
    format!("{base}{path}")
}

/// A minimal template-matching [`Router`].
#[derive(Default, Clone)]
pub struct RouteTable {
    routes: Vec<(Method, String, Handler)>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// `(method, template)` of every registered route, in registration order.
    pub fn routes(&self) -> impl Iterator<Item = (Method, &str)> {
        self.routes
            .iter()
            .map(|(method, template, _)| (*method, template.as_str()))
    }

    /// Dispatch a request: 404 when no template matches, 405 when only the
    /// method differs.
    pub async fn call(&self, mut request: IncomingRequest) -> Reply {
        let mut path_matched = false;
        for (method, template, handler) in &self.routes {
            let Some(captures) = match_template(template, &request.path) else {
                continue;
            };
            path_matched = true;
            if *method != request.method {
                continue;
            }
            request.path_params = captures;
            return handler(request).await;
        }
        if path_matched {
            Reply::empty(405)
        } else {
            Reply::empty(404)
        }
    }
}

impl Router for RouteTable {
    fn route(&mut self, method: Method, path: &str, handler: Handler) {
        log::debug!("route {method} {path}");
        self.routes.push((method, path.to_string(), handler));
    }
}

fn match_template(template: &str, path: &str) -> Option<BTreeMap<String, String>> {
    let expected: Vec<&str> = template.split('/').collect();
    let actual: Vec<&str> = path.split('/').collect();
    if expected.len() != actual.len() {
        return None;
    }
    let mut captures = BTreeMap::new();
    for (pattern, segment) in expected.iter().zip(&actual) {
        match pattern.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
            Some(name) if !segment.is_empty() => {
                captures.insert(name.to_string(), (*segment).to_string());
            }
            Some(_) => return None,
            None if pattern == segment => {}
            None => return None,
        }
    }
    Some(captures)
}

fn invalid(parameter: &str) -> impl FnOnce(StyleError) -> BindingError + '_ {
    move |source| BindingError::Invalid {
        parameter: parameter.to_string(),
        source,
    }
}

fn typed<T: DeserializeOwned>(name: &str, value: Option<Value>) -> Result<Option<T>, BindingError> {
    value.map(from_wire).transpose().map_err(invalid(name))
}

/// Turn an absent required parameter into [`BindingError::Missing`].
pub fn required<T>(name: &str, value: Option<T>) -> Result<T, BindingError> {
    value.ok_or_else(|| BindingError::Missing(name.to_string()))
}

pub fn bind_query_param<T: DeserializeOwned>(
    pairs: &FormPairs,
    name: &str,
    style: Style,
    explode: bool,
    shape: ParamShape,
) -> Result<Option<T>, BindingError> {
    let value = decode_query(pairs, name, style, explode, shape).map_err(invalid(name))?;
    typed(name, value)
}

/// Cookies only support the `form` style.
pub fn bind_cookie_param<T: DeserializeOwned>(
    cookies: &FormPairs,
    name: &str,
    explode: bool,
    shape: ParamShape,
) -> Result<Option<T>, BindingError> {
    bind_query_param(cookies, name, Style::Form, explode, shape)
}

pub fn bind_header_param<T: DeserializeOwned>(
    request: &IncomingRequest,
    name: &str,
    explode: bool,
    shape: ParamShape,
) -> Result<Option<T>, BindingError> {
    let value = request
        .header(name)
        .map(|raw| decode_simple(raw.trim(), explode, shape))
        .transpose()
        .map_err(invalid(name))?;
    typed(name, value)
}

/// Path parameters are always required.
pub fn bind_path_param<T: DeserializeOwned>(
    request: &IncomingRequest,
    name: &str,
    explode: bool,
    shape: ParamShape,
) -> Result<T, BindingError> {
    let raw = required(name, request.path_params.get(name))?;
    let value = decode_simple(&decode_component(raw), explode, shape).map_err(invalid(name))?;
    required(name, typed(name, Some(value))?)
}

pub fn decode_json_body<T: DeserializeOwned>(request: &IncomingRequest) -> Result<T, BindingError> {
    if request.body.is_empty() {
        return Err(BindingError::MissingBody);
    }
    serde_json::from_slice(&request.body).map_err(|err| BindingError::Body(StyleError::Json(err)))
}

/// Decode an `application/x-www-form-urlencoded` body into an object of `shape`.
pub fn decode_form_body<T: DeserializeOwned>(
    request: &IncomingRequest,
    shape: ParamShape,
) -> Result<T, BindingError> {
    let pairs = FormPairs::parse_query(&String::from_utf8_lossy(&request.body));
    let value = decode_query(&pairs, "", Style::Form, true, shape)
        .map_err(BindingError::Body)?
        .unwrap_or_else(|| Value::Object(Map::new()));
    from_wire(value).map_err(BindingError::Body)
}

pub fn decode_text_body(request: &IncomingRequest) -> Result<String, BindingError> {
    String::from_utf8(request.body.clone()).map_err(|err| {
        BindingError::Body(StyleError::InvalidValue {
            value: String::from_utf8_lossy(err.as_bytes()).into_owned(),
            expected: "UTF-8 text",
        })
    })
}
