use apigen_runtime::spec::encode_document;
use minijinja::{Environment, context};

use super::Header;
use crate::error::EmitError;

/// Emit `spec.rs` holding the source document as compressed, encoded chunks.
///
/// The document is serialized as compact JSON in its original key order, so
/// the chunks only change when the document does.
pub fn emit_spec(
    env: &Environment<'_>,
    document: &serde_json::Value,
    header: &Header,
) -> Result<String, EmitError> {
    let json = serde_json::to_vec(document)?;
    let chunks = encode_document(&json)?;
    log::debug!("embedding {} bytes of JSON as {} chunks", json.len(), chunks.len());
    let tmpl = env.get_template("spec.rs.j2")?;
    Ok(tmpl.render(context! {
        header => header,
        chunks => chunks,
    })?)
}
