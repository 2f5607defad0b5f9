use minijinja::{Environment, context};

use super::Header;
use super::operation::OperationCtx;
use crate::error::EmitError;

/// Emit `server.rs`: the `ServerInterface` trait, parameter and body binders,
/// and `ServerInterfaceWrapper`.
pub fn emit_server(
    env: &Environment<'_>,
    operations: &[OperationCtx],
    header: &Header,
) -> Result<String, EmitError> {
    render(env, "server.rs.j2", operations, header)
}

/// Emit `router.rs`: `register_handlers` and `register_handlers_with_base_url`.
pub fn emit_router(
    env: &Environment<'_>,
    operations: &[OperationCtx],
    header: &Header,
) -> Result<String, EmitError> {
    render(env, "router.rs.j2", operations, header)
}

/// Emit `skeleton.rs`: a stub `ServerInterface` and `build_router`.
pub fn emit_skeleton(
    env: &Environment<'_>,
    operations: &[OperationCtx],
    header: &Header,
) -> Result<String, EmitError> {
    render(env, "skeleton.rs.j2", operations, header)
}

fn render(
    env: &Environment<'_>,
    name: &str,
    operations: &[OperationCtx],
    header: &Header,
) -> Result<String, EmitError> {
    let tmpl = env.get_template(name)?;
    Ok(tmpl.render(context! {
        header => header,
        operations => operations,
    })?)
}
