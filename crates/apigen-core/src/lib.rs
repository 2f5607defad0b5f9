pub mod config;
pub mod error;
pub mod ir;
pub mod parse;
pub mod transform;

/// The logical role of an emitted artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactRole {
    Types,
    Client,
    ServerInterface,
    Router,
    MainSkeleton,
    EmbeddedSpec,
    Module,
}

impl ArtifactRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactRole::Types => "type-definitions",
            ArtifactRole::Client => "client",
            ArtifactRole::ServerInterface => "server-interface",
            ArtifactRole::Router => "router",
            ArtifactRole::MainSkeleton => "main-skeleton",
            ArtifactRole::EmbeddedSpec => "embedded-spec",
            ArtifactRole::Module => "module",
        }
    }
}

/// A generated file with path, role, and content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: String,
    pub role: ArtifactRole,
    pub content: String,
}

/// Trait for code generators that render files from a resolved spec.
///
/// Implementations are all-or-nothing: an error means no files.
pub trait CodeGenerator {
    type Config;
    type Error: std::error::Error;
    fn generate(
        &self,
        spec: &ir::ResolvedSpec,
        config: &Self::Config,
    ) -> Result<Vec<GeneratedFile>, Self::Error>;
}
