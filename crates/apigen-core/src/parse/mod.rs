pub mod operation;
pub mod reference;
pub mod schema;
pub mod spec;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ParseError;
use reference::{RefTarget, normalize_location};
use spec::OpenApiSpec;

/// One parsed document, kept as a raw JSON tree so any JSON pointer can be
/// looked up and the original can be embedded verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    raw: Value,
}

impl Document {
    pub fn from_value(raw: Value) -> Self {
        Self { raw }
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Interpret the document as a complete OpenAPI 3.x description.
    pub fn spec(&self) -> Result<OpenApiSpec, ParseError> {
        let spec: OpenApiSpec = serde_json::from_value(self.raw.clone())?;
        validate_version(&spec)?;
        Ok(spec)
    }
}

/// Parse a document from YAML.
pub fn from_yaml(input: &str) -> Result<Document, ParseError> {
    let raw: Value = serde_yaml_ng::from_str(input)?;
    Ok(Document::from_value(raw))
}

/// Parse a document from JSON.
pub fn from_json(input: &str) -> Result<Document, ParseError> {
    let raw: Value = serde_json::from_str(input)?;
    Ok(Document::from_value(raw))
}

fn validate_version(spec: &OpenApiSpec) -> Result<(), ParseError> {
    if !spec.openapi.starts_with("3.") {
        return Err(ParseError::UnsupportedVersion(spec.openapi.clone()));
    }
    Ok(())
}

/// The root document plus every externally referenced document of one run.
///
/// External documents are keyed by the location used in `$ref` strings,
/// relative to the root.
#[derive(Debug, Clone)]
pub struct DocumentSet {
    root: Document,
    spec: OpenApiSpec,
    root_location: Option<String>,
    externals: IndexMap<String, Document>,
}

impl DocumentSet {
    pub fn new(root: Document) -> Result<Self, ParseError> {
        let spec = root.spec()?;
        Ok(Self {
            root,
            spec,
            root_location: None,
            externals: IndexMap::new(),
        })
    }

    /// Parse a YAML root document with no external documents.
    pub fn from_yaml(input: &str) -> Result<Self, ParseError> {
        Self::new(from_yaml(input)?)
    }

    /// Name under which external documents refer back to the root.
    pub fn with_root_location(mut self, location: &str) -> Self {
        self.root_location = Some(normalize_location(location));
        self
    }

    pub fn with_external(mut self, location: &str, document: Document) -> Self {
        self.externals
            .insert(normalize_location(location), document);
        self
    }

    pub fn spec(&self) -> &OpenApiSpec {
        &self.spec
    }

    pub fn root(&self) -> &Document {
        &self.root
    }

    pub fn external_locations(&self) -> impl Iterator<Item = &str> {
        self.externals.keys().map(String::as_str)
    }

    /// Canonical target of `reference` as written inside `from_document`.
    pub fn target(&self, reference: &str, from_document: &str) -> Option<RefTarget> {
        let mut target = RefTarget::parse(reference, from_document)?;
        if self.root_location.as_deref() == Some(target.document.as_str()) {
            target.document.clear();
        }
        Some(target)
    }

    /// The raw node a target points at, if both document and pointer exist.
    pub fn value(&self, target: &RefTarget) -> Option<&Value> {
        let document = if target.document.is_empty() {
            &self.root
        } else {
            self.externals.get(&target.document)?
        };
        document.raw.pointer(&target.pointer)
    }

    /// Deserialize the node a target points at. `Ok(None)` means dangling.
    pub fn lookup<T: DeserializeOwned>(
        &self,
        target: &RefTarget,
    ) -> Result<Option<T>, serde_json::Error> {
        self.value(target)
            .map(|value| serde_json::from_value(value.clone()))
            .transpose()
    }
}
