pub mod composition;
pub mod cycles;
pub mod name_normalizer;
pub mod namer;
pub mod operation_extractor;
pub mod type_resolver;

use indexmap::IndexMap;
use log::info;

use crate::config::{ApigenConfig, NamingStrategy};
use crate::error::TransformError;
use crate::ir::{ApiInfo, ResolvedSpec, ServerUrl};
use crate::parse::DocumentSet;

pub use operation_extractor::extract_operations;
pub use type_resolver::{OperationKey, ResolvedTypes, SchemaSite, resolve_types};

/// Options controlling how the transform phase resolves operation names.
#[derive(Debug, Clone, Default)]
pub struct TransformOptions {
    pub naming_strategy: NamingStrategy,
    pub aliases: IndexMap<String, String>,
}

impl From<&ApigenConfig> for TransformOptions {
    fn from(config: &ApigenConfig) -> Self {
        Self {
            naming_strategy: config.naming.strategy,
            aliases: config.naming.aliases.clone(),
        }
    }
}

/// Transform a document set into the fully resolved IR.
pub fn transform(docs: &DocumentSet) -> Result<ResolvedSpec, TransformError> {
    transform_with_options(docs, &TransformOptions::default())
}

/// Transform with explicit naming options.
pub fn transform_with_options(
    docs: &DocumentSet,
    options: &TransformOptions,
) -> Result<ResolvedSpec, TransformError> {
    // Phase 1: operation names must be unique before they seed type names
    operation_extractor::check_operation_names(docs, options)?;

    // Phase 2: build the closed type graph
    let types = resolve_types(docs, options)?;

    // Phase 3: operation descriptors over the resolved sites
    let operations = extract_operations(docs, &types, options)?;

    let spec = docs.spec();
    info!(
        "resolved {} types and {} operations for {}",
        types.arena.len(),
        operations.len(),
        spec.info.title
    );

    Ok(ResolvedSpec {
        info: ApiInfo {
            title: spec.info.title.clone(),
            description: spec.info.description.clone(),
            version: spec.info.version.clone(),
        },
        servers: spec
            .servers
            .iter()
            .map(|s| ServerUrl {
                url: s.url.clone(),
                description: s.description.clone(),
            })
            .collect(),
        types: types.arena,
        operations,
        document: docs.root().raw().clone(),
    })
}
