use thiserror::Error;

/// A value could not be rendered in, or read back from, a parameter style.
#[derive(Debug, Error)]
pub enum StyleError {
    #[error("style {style} cannot carry a {kind}")]
    Unsupported {
        style: &'static str,
        kind: &'static str,
    },

    #[error("'{value}' is not a valid {expected}")]
    InvalidValue {
        value: String,
        expected: &'static str,
    },

    #[error("malformed {style} value '{value}'")]
    Malformed { style: &'static str, value: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// An incoming request could not be bound to operation inputs.
#[derive(Debug, Error)]
pub enum BindingError {
    #[error("missing required parameter '{0}'")]
    Missing(String),

    #[error("invalid value for parameter '{parameter}': {source}")]
    Invalid {
        parameter: String,
        #[source]
        source: StyleError,
    },

    #[error("missing request body")]
    MissingBody,

    #[error("invalid request body: {0}")]
    Body(#[source] StyleError),

    #[error("unsupported content type '{0}'")]
    UnsupportedContentType(String),
}

/// A client request could not be built.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("cannot encode parameter '{parameter}': {source}")]
    Parameter {
        parameter: String,
        #[source]
        source: StyleError,
    },

    #[error("cannot encode request body: {0}")]
    Body(#[from] serde_json::Error),

    #[error("cannot encode form body: {0}")]
    Form(#[source] StyleError),

    #[error("request editor failed: {0}")]
    Editor(String),
}

/// The transport failed to deliver a request or read its response.
#[derive(Debug, Error)]
#[error("transport failed: {message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// A response body did not decode. The raw body is kept.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("cannot decode {content_type} body of status {status}: {source}")]
    Json {
        status: u16,
        content_type: String,
        body: Vec<u8>,
        #[source]
        source: serde_json::Error,
    },

    #[error("body of status {status} is not valid UTF-8")]
    Text { status: u16, body: Vec<u8> },
}

impl DecodeError {
    pub fn body(&self) -> &[u8] {
        match self {
            DecodeError::Json { body, .. } | DecodeError::Text { body, .. } => body,
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            DecodeError::Json { status, .. } | DecodeError::Text { status, .. } => *status,
        }
    }
}

/// Everything a generated client call can fail with.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Reading a field of an open object failed.
#[derive(Debug, Error)]
pub enum FieldError {
    #[error("missing field '{0}'")]
    Missing(String),

    #[error("error reading '{key}': {source}")]
    Invalid {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("additional property '{0}' shadows a declared field")]
    Shadowed(String),
}

/// The embedded document could not be restored.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("embedded document is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("embedded document is not valid gzip: {0}")]
    Io(#[from] std::io::Error),

    #[error("embedded document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
