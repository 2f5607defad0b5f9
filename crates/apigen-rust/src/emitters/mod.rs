pub mod client;
pub mod operation;
pub mod server;
pub mod spec;
pub mod types;

use minijinja::Environment;
use serde::Serialize;

use crate::error::EmitError;

/// Values every emitted file header needs.
#[derive(Debug, Clone, Serialize)]
pub struct Header {
    /// Path the generated code imports the runtime from, e.g. `apigen_runtime`.
    pub runtime: String,
    /// API title, flattened to one line.
    pub title: String,
}

impl Header {
    pub fn new(runtime: &str, title: &str) -> Self {
        Self {
            runtime: runtime.to_string(),
            title: title.split_whitespace().collect::<Vec<_>>().join(" "),
        }
    }
}

/// Template environment holding every artifact template.
pub fn environment() -> Result<Environment<'static>, EmitError> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_keep_trailing_newline(true);
    env.add_template("header.rs.j2", include_str!("../../templates/header.rs.j2"))?;
    env.add_template("types.rs.j2", include_str!("../../templates/types.rs.j2"))?;
    env.add_template("client.rs.j2", include_str!("../../templates/client.rs.j2"))?;
    env.add_template("server.rs.j2", include_str!("../../templates/server.rs.j2"))?;
    env.add_template("router.rs.j2", include_str!("../../templates/router.rs.j2"))?;
    env.add_template("skeleton.rs.j2", include_str!("../../templates/skeleton.rs.j2"))?;
    env.add_template("spec.rs.j2", include_str!("../../templates/spec.rs.j2"))?;
    env.add_template("mod.rs.j2", include_str!("../../templates/mod.rs.j2"))?;
    Ok(env)
}

/// Emit `mod.rs` declaring the generated modules in emission order.
pub fn emit_module(env: &Environment<'_>, modules: &[&str]) -> Result<String, EmitError> {
    let tmpl = env.get_template("mod.rs.j2")?;
    Ok(tmpl.render(minijinja::context! { modules => modules })?)
}
