use apigen_core::error::NamingError;
use apigen_runtime::SpecError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("template error: {0}")]
    Render(#[from] minijinja::Error),

    #[error("naming error: {0}")]
    Naming(#[from] NamingError),

    #[error("cannot embed document: {0}")]
    Spec(#[from] SpecError),

    #[error("cannot serialize document: {0}")]
    Document(#[from] serde_json::Error),
}
