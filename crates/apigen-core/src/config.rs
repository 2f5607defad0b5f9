use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::ConfigError;

/// Top-level project configuration loaded from `.apigen.yaml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApigenConfig {
    pub input: String,
    pub output: String,
    /// Externally referenced documents, keyed by the location used in `$ref`.
    pub external: IndexMap<String, String>,
    pub naming: NamingConfig,
    pub generate: GenerateOptions,
}

impl Default for ApigenConfig {
    fn default() -> Self {
        Self {
            input: "openapi.yaml".to_string(),
            output: "src/api".to_string(),
            external: IndexMap::new(),
            naming: NamingConfig::default(),
            generate: GenerateOptions::default(),
        }
    }
}

/// Naming strategy and aliases.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    pub strategy: NamingStrategy,
    /// Map from resolved operation name (operationId or route-derived) to custom alias.
    pub aliases: IndexMap<String, String>,
}

/// How operation names are derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingStrategy {
    #[default]
    UseOperationId,
    UseRouteBased,
}

/// Which artifacts to render.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerateOptions {
    pub client: bool,
    pub server: bool,
    pub skeleton: bool,
    pub embed_spec: bool,
    /// Crate path the emitted code imports codec helpers from.
    pub runtime_crate: String,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            client: true,
            server: true,
            skeleton: true,
            embed_spec: true,
            runtime_crate: "apigen_runtime".to_string(),
        }
    }
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".apigen.yaml";

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<ApigenConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: ApigenConfig =
        serde_yaml_ng::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    log::debug!("loaded config from {}", path.display());
    Ok(Some(config))
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# apigen configuration
input: openapi.yaml
output: src/api

# Documents referenced from the input, keyed by the name used in $ref.
external: {}
  # common.yaml: schemas/common.yaml

naming:
  strategy: use_operation_id  # use_operation_id | use_route_based
  aliases: {}
    # findPetsByStatus: find_pets

generate:
  client: true
  server: true
  skeleton: true       # stub ServerInterface implementation
  embed_spec: true     # gzip + base64 copy of the input document
  runtime_crate: apigen_runtime
"#
}
