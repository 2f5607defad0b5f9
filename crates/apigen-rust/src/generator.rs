use std::collections::HashMap;

use apigen_core::config::GenerateOptions;
use apigen_core::error::NamingError;
use apigen_core::ir::ResolvedSpec;
use apigen_core::{ArtifactRole, CodeGenerator, GeneratedFile};
use log::info;

use crate::emitters::operation::{OperationCtx, build_operation, synthesized_names};
use crate::emitters::{self, Header};
use crate::error::EmitError;
use crate::naming::{IdentScope, type_ident};

/// Which artifacts to render and where the runtime lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RustGeneratorConfig {
    /// Path generated code imports the runtime helpers from.
    pub runtime_crate: String,
    pub client: bool,
    pub server: bool,
    /// Stub `ServerInterface` implementation; requires `server`.
    pub skeleton: bool,
    pub embed_spec: bool,
}

impl Default for RustGeneratorConfig {
    fn default() -> Self {
        Self::from_config(&GenerateOptions::default())
    }
}

impl RustGeneratorConfig {
    pub fn from_config(options: &GenerateOptions) -> Self {
        Self {
            runtime_crate: options.runtime_crate.clone(),
            client: options.client,
            server: options.server,
            skeleton: options.skeleton,
            embed_spec: options.embed_spec,
        }
    }
}

/// Rust code generator.
pub struct RustGenerator;

impl RustGenerator {
    /// Emitted type names must be unique: resolved types after renaming
    /// reserved names, plus the types added per operation.
    fn check_type_names(spec: &ResolvedSpec) -> Result<(), NamingError> {
        let mut taken: HashMap<String, String> = HashMap::new();
        let mut claim = |name: String, origin: String| match taken.get(&name) {
            Some(first) => Err(NamingError::Collision {
                name,
                first: first.clone(),
                second: origin,
            }),
            None => {
                taken.insert(name, origin);
                Ok(())
            }
        };
        for ty in spec.types.iter() {
            claim(type_ident(&ty.name), ty.origin.clone())?;
        }
        for op in &spec.operations {
            let origin = format!("operation {} ({} {})", op.name.original, op.method.as_str(), op.path);
            for name in synthesized_names(op) {
                claim(name, origin.clone())?;
            }
        }
        Ok(())
    }
}

impl CodeGenerator for RustGenerator {
    type Config = RustGeneratorConfig;
    type Error = EmitError;

    fn generate(
        &self,
        spec: &ResolvedSpec,
        config: &RustGeneratorConfig,
    ) -> Result<Vec<GeneratedFile>, EmitError> {
        Self::check_type_names(spec)?;

        let env = emitters::environment()?;
        let header = Header::new(&config.runtime_crate, &spec.info.title);
        let mut consts = IdentScope::default();
        let operations: Vec<OperationCtx> = spec
            .operations
            .iter()
            .map(|op| build_operation(&spec.types, op, &mut consts))
            .collect();

        let mut files = vec![GeneratedFile {
            path: "types.rs".to_string(),
            role: ArtifactRole::Types,
            content: emitters::types::emit_types(&env, &spec.types, &operations, &header)?,
        }];

        if config.client {
            let default_server = spec.servers.first().map(|s| s.url.as_str());
            files.push(GeneratedFile {
                path: "client.rs".to_string(),
                role: ArtifactRole::Client,
                content: emitters::client::emit_client(&env, &operations, default_server, &header)?,
            });
        }

        if config.server {
            files.push(GeneratedFile {
                path: "server.rs".to_string(),
                role: ArtifactRole::ServerInterface,
                content: emitters::server::emit_server(&env, &operations, &header)?,
            });
            files.push(GeneratedFile {
                path: "router.rs".to_string(),
                role: ArtifactRole::Router,
                content: emitters::server::emit_router(&env, &operations, &header)?,
            });
            if config.skeleton {
                files.push(GeneratedFile {
                    path: "skeleton.rs".to_string(),
                    role: ArtifactRole::MainSkeleton,
                    content: emitters::server::emit_skeleton(&env, &operations, &header)?,
                });
            }
        }

        if config.embed_spec {
            files.push(GeneratedFile {
                path: "spec.rs".to_string(),
                role: ArtifactRole::EmbeddedSpec,
                content: emitters::spec::emit_spec(&env, &spec.document, &header)?,
            });
        }

        let modules: Vec<&str> = files
            .iter()
            .filter_map(|f| f.path.strip_suffix(".rs"))
            .collect();
        let module = emitters::emit_module(&env, &modules)?;
        files.push(GeneratedFile {
            path: "mod.rs".to_string(),
            role: ArtifactRole::Module,
            content: module,
        });

        info!(
            "generated {} files for {} types and {} operations",
            files.len(),
            spec.types.len(),
            spec.operations.len()
        );
        Ok(files)
    }
}
