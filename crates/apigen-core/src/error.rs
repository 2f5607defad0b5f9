use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported OpenAPI version: {0}")]
    UnsupportedVersion(String),
}

/// Fatal problems with the shape of the schema document.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("dangling reference {reference} at {site}")]
    DanglingReference { reference: String, site: String },

    #[error("invalid reference format {reference} at {site}")]
    InvalidReference { reference: String, site: String },

    #[error("circular reference chain: {chain}")]
    CircularReference { chain: String },

    #[error("allOf members of {owner} declare field '{field}' with incompatible types")]
    CompositionConflict { owner: String, field: String },

    #[error("unsupported schema shape at {site}: {detail}")]
    UnsupportedShape { site: String, detail: String },

    #[error("unsupported style '{style}' for {location} parameter '{name}' at {site}")]
    UnsupportedStyle {
        style: String,
        location: String,
        name: String,
        site: String,
    },

    #[error("{location} parameter '{name}' at {site} cannot use {style} style: {detail}")]
    UnsupportedParameterShape {
        style: String,
        location: String,
        name: String,
        detail: String,
        site: String,
    },

    #[error("duplicate {location} parameter '{name}' at {site}")]
    DuplicateParameter {
        location: String,
        name: String,
        site: String,
    },
}

/// Name allocation failures. Both declaration sites are reported.
#[derive(Debug, Error)]
pub enum NamingError {
    #[error("type name '{name}' is declared by {first} and {second} with different shapes")]
    Collision {
        name: String,
        first: String,
        second: String,
    },

    #[error("operation name '{name}' is used by both {first} and {second}")]
    DuplicateOperation {
        name: String,
        first: String,
        second: String,
    },
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("naming error: {0}")]
    Naming(#[from] NamingError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml_ng::Error,
    },
}
