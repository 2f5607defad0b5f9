pub mod operations;
pub mod types;

pub use operations::*;
pub use types::*;

pub use crate::parse::operation::ParameterLocation;

/// Everything the emission engine consumes: the closed type graph, the
/// operation descriptors, and the raw root document for embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSpec {
    pub info: ApiInfo,
    pub servers: Vec<ServerUrl>,
    pub types: TypeArena,
    pub operations: Vec<OperationDescriptor>,
    pub document: serde_json::Value,
}

/// API metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiInfo {
    pub title: String,
    pub description: Option<String>,
    pub version: String,
}

/// A server URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerUrl {
    pub url: String,
    pub description: Option<String>,
}
