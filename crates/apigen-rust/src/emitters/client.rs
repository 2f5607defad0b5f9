use minijinja::{Environment, context};

use super::Header;
use super::operation::OperationCtx;
use crate::error::EmitError;
use crate::naming::literal;

/// Emit `client.rs`: request builders, response parsers, and `Client`.
pub fn emit_client(
    env: &Environment<'_>,
    operations: &[OperationCtx],
    default_server: Option<&str>,
    header: &Header,
) -> Result<String, EmitError> {
    let tmpl = env.get_template("client.rs.j2")?;
    Ok(tmpl.render(context! {
        header => header,
        operations => operations,
        default_server => default_server.map(literal),
    })?)
}
