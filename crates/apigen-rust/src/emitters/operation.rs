//! Per-operation names and render context shared by every emitter.

use apigen_core::ir::{
    BodyCodec, HttpMethod, OperationDescriptor, ParamStyle, ParameterDescriptor,
    ParameterLocation, RequestBodyDescriptor, ResponseGroup, StatusMatch, TypeArena, TypeRef,
};
use heck::{ToPascalCase, ToSnakeCase};
use serde::Serialize;

use crate::naming::{IdentScope, const_ident, doc_lines, literal, value_ident, variant_ident};
use crate::type_mapper::{param_shape, rust_type};

/// Local names used by generated function bodies; arguments must avoid them.
const RESERVED_LOCALS: &[&str] = &[
    "server", "request", "response", "params", "body", "query", "cookies", "path", "handler",
    "parsed", "content_type",
];

#[derive(Debug, Clone, Serialize)]
pub struct ParamCtx {
    pub ident: String,
    pub wire: String,
    pub location: &'static str,
    pub style: String,
    /// Rust literal, `true` or `false`.
    pub explode: &'static str,
    pub required: bool,
    pub ty: String,
    pub field_ty: String,
    pub shape_const: String,
    pub docs: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShapeCtx {
    pub name: String,
    pub expr: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BodyVariantCtx {
    pub ident: String,
    pub content_type: String,
    pub content_type_text: String,
    pub codec: &'static str,
    pub ty: String,
    pub shape_const: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BodyCtx {
    pub type_name: String,
    pub bind_fn: String,
    pub required: bool,
    /// Argument type in client and handler signatures.
    pub arg_ty: String,
    pub variants: Vec<BodyVariantCtx>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseFieldCtx {
    pub ident: String,
    pub ty: String,
    pub docs: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BranchCtx {
    pub condition: String,
    pub field: Option<String>,
    pub codec: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseCtx {
    pub type_name: String,
    pub parse_fn: String,
    pub fields: Vec<ResponseFieldCtx>,
    pub branches: Vec<BranchCtx>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OperationCtx {
    pub ident: String,
    /// `rt::Method` variant.
    pub method: String,
    pub method_upper: &'static str,
    pub path: String,
    pub path_text: String,
    pub path_format: String,
    pub docs: Vec<String>,
    pub deprecated: bool,
    pub build_fn: String,
    pub handle_fn: String,
    pub path_args: Vec<ParamCtx>,
    pub params_type: Option<String>,
    pub bind_params_fn: String,
    pub params: Vec<ParamCtx>,
    pub query: Vec<ParamCtx>,
    pub headers: Vec<ParamCtx>,
    pub cookies: Vec<ParamCtx>,
    pub query_names: String,
    pub cookie_names: String,
    pub body: Option<BodyCtx>,
    pub response: ResponseCtx,
    pub shapes: Vec<ShapeCtx>,
    pub handler_params: String,
    pub handler_args: String,
    pub skeleton_params: String,
}

/// Type names the generator adds next to the resolved types.
pub fn params_type_name(op: &OperationDescriptor) -> String {
    format!("{}Params", op.name.pascal_case)
}

pub fn body_type_name(op: &OperationDescriptor) -> String {
    format!("{}RequestBody", op.name.pascal_case)
}

pub fn response_type_name(op: &OperationDescriptor) -> String {
    format!("{}Response", op.name.pascal_case)
}

/// Every type name an operation synthesizes, in emission order.
pub fn synthesized_names(op: &OperationDescriptor) -> Vec<String> {
    let mut names = Vec::new();
    if op.parameters.iter().any(|p| p.location != ParameterLocation::Path) {
        names.push(params_type_name(op));
    }
    if op.request_body.is_some() {
        names.push(body_type_name(op));
    }
    names.push(response_type_name(op));
    names
}

/// Build the render context of one operation. `consts` is shared by all
/// operations of a run because shape constants live in one module.
pub fn build_operation(
    arena: &TypeArena,
    op: &OperationDescriptor,
    consts: &mut IdentScope,
) -> OperationCtx {
    let ident = value_ident(&op.name.snake_case);
    let bare = ident.trim_start_matches("r#").to_string();
    let mut shapes = ShapeTable {
        prefix: &op.name.original,
        scope: consts,
        entries: Vec::new(),
    };

    let mut arg_scope = IdentScope::with_reserved(RESERVED_LOCALS);
    let path_args: Vec<ParamCtx> = op
        .path_parameters()
        .into_iter()
        .map(|p| param_ctx(arena, p, &mut arg_scope, &mut shapes))
        .collect();

    let mut field_scope = IdentScope::default();
    let params: Vec<ParamCtx> = op
        .parameters
        .iter()
        .filter(|p| p.location != ParameterLocation::Path)
        .map(|p| param_ctx(arena, p, &mut field_scope, &mut shapes))
        .collect();
    let by_location = |location: &str| -> Vec<ParamCtx> {
        params
            .iter()
            .filter(|p| p.location == location)
            .cloned()
            .collect()
    };
    let query = by_location("query");
    let headers = by_location("header");
    let cookies = by_location("cookie");
    let wire_list = |list: &[ParamCtx]| {
        list.iter()
            .map(|p| p.wire.clone())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let query_names = wire_list(&query);
    let cookie_names = wire_list(&cookies);

    let params_type = (!params.is_empty()).then(|| params_type_name(op));
    let body = op
        .request_body
        .as_ref()
        .map(|body| body_ctx(arena, op, &bare, body, &mut shapes));

    let mut handler_params = Vec::new();
    let mut handler_args = Vec::new();
    let mut skeleton_params = Vec::new();
    let mut push_arg = |name: &str, ty: &str| {
        handler_params.push(format!("{name}: {ty}"));
        handler_args.push(name.to_string());
        skeleton_params.push(format!("_{}: {ty}", name.trim_start_matches("r#")));
    };
    for arg in &path_args {
        push_arg(&arg.ident, &arg.ty);
    }
    if let Some(name) = &params_type {
        push_arg("params", name);
    }
    if let Some(body) = &body {
        push_arg("body", &body.arg_ty);
    }
    let prefixed = |parts: Vec<String>| -> String {
        parts.iter().map(|part| format!(", {part}")).collect()
    };

    let mut docs = doc_lines(op.summary.as_deref());
    let description = doc_lines(op.description.as_deref());
    if !docs.is_empty() && !description.is_empty() {
        docs.push(String::new());
    }
    docs.extend(description);

    OperationCtx {
        method: method_variant(op.method),
        method_upper: op.method.as_str(),
        path: literal(&op.path),
        path_text: op.path.clone(),
        path_format: literal(&path_format(&op.path)),
        docs,
        deprecated: op.deprecated,
        build_fn: format!("build_{bare}_request"),
        handle_fn: format!("handle_{bare}"),
        bind_params_fn: format!("bind_{bare}_params"),
        path_args,
        params_type,
        params,
        query,
        headers,
        cookies,
        query_names,
        cookie_names,
        body,
        response: response_ctx(arena, op, &bare),
        shapes: shapes.into_entries(),
        handler_params: prefixed(handler_params),
        handler_args: handler_args.join(", "),
        skeleton_params: prefixed(skeleton_params),
        ident,
    }
}

fn method_variant(method: HttpMethod) -> String {
    method.key().to_pascal_case()
}

/// `/pets/{id}/tags/{tag}` → `/pets/{}/tags/{}`.
fn path_format(path: &str) -> String {
    let mut format = String::with_capacity(path.len());
    let mut in_var = false;
    for ch in path.chars() {
        match ch {
            '{' => {
                in_var = true;
                format.push_str("{}");
            }
            '}' => in_var = false,
            _ if in_var => {}
            _ => format.push(ch),
        }
    }
    format
}

fn style_expr(style: ParamStyle) -> String {
    let variant = match style {
        ParamStyle::Simple => "Simple",
        ParamStyle::Form => "Form",
        ParamStyle::DeepObject => "DeepObject",
    };
    format!("rt::Style::{variant}")
}

/// Shape constants of one operation, named after operation and input.
struct ShapeTable<'a> {
    prefix: &'a str,
    scope: &'a mut IdentScope,
    entries: Vec<ShapeCtx>,
}

impl ShapeTable<'_> {
    fn add(&mut self, input: &str, expr: String) -> String {
        let name = self
            .scope
            .claim(const_ident(&[self.prefix, input, "shape"]));
        self.entries.push(ShapeCtx {
            name: name.clone(),
            expr,
        });
        name
    }

    fn into_entries(self) -> Vec<ShapeCtx> {
        self.entries
    }
}

fn param_ctx(
    arena: &TypeArena,
    param: &ParameterDescriptor,
    scope: &mut IdentScope,
    shapes: &mut ShapeTable<'_>,
) -> ParamCtx {
    let ty = rust_type(arena, &param.ty);
    let field_ty = if param.required {
        ty.clone()
    } else {
        format!("Option<{ty}>")
    };
    ParamCtx {
        ident: scope.claim(value_ident(&param.name.snake_case)),
        wire: literal(&param.wire_name),
        location: param.location.as_str(),
        style: style_expr(param.style),
        explode: if param.explode { "true" } else { "false" },
        required: param.required,
        shape_const: shapes.add(&param.wire_name, param_shape(arena, &param.ty)),
        ty,
        field_ty,
        docs: doc_lines(param.description.as_deref()),
    }
}

fn codec_name(codec: BodyCodec) -> &'static str {
    match codec {
        BodyCodec::Json => "json",
        BodyCodec::Form => "form",
        BodyCodec::Text => "text",
        BodyCodec::Raw => "raw",
    }
}

fn payload_type(arena: &TypeArena, codec: BodyCodec, ty: Option<&TypeRef>) -> String {
    match codec {
        BodyCodec::Json | BodyCodec::Form => rust_type(arena, ty.unwrap_or(&TypeRef::Any)),
        BodyCodec::Text => "String".to_string(),
        BodyCodec::Raw => "Vec<u8>".to_string(),
    }
}

fn body_ctx(
    arena: &TypeArena,
    op: &OperationDescriptor,
    bare: &str,
    body: &RequestBodyDescriptor,
    shapes: &mut ShapeTable<'_>,
) -> BodyCtx {
    let type_name = body_type_name(op);
    let mut scope = IdentScope::with_reserved(&["Other"]);
    let variants = body
        .variants
        .iter()
        .map(|variant| {
            let shape_const = (variant.codec == BodyCodec::Form).then(|| {
                let ty = variant.ty.clone().unwrap_or(TypeRef::Any);
                shapes.add(&format!("{} body", variant.tag), param_shape(arena, &ty))
            });
            BodyVariantCtx {
                ident: scope.claim(variant_ident(&variant.tag)),
                content_type: literal(&variant.content_type),
                content_type_text: variant.content_type.clone(),
                codec: codec_name(variant.codec),
                ty: payload_type(arena, variant.codec, variant.ty.as_ref()),
                shape_const,
            }
        })
        .collect();
    let arg_ty = if body.required {
        type_name.clone()
    } else {
        format!("Option<{type_name}>")
    };
    BodyCtx {
        bind_fn: format!("bind_{bare}_body"),
        required: body.required,
        arg_ty,
        type_name,
        variants,
    }
}

fn status_key(status: StatusMatch) -> String {
    match status {
        StatusMatch::Code(code) => code.to_string(),
        StatusMatch::Range(digit) => format!("{digit}xx"),
        StatusMatch::Default => "default".to_string(),
    }
}

fn status_condition(status: StatusMatch) -> Option<String> {
    match status {
        StatusMatch::Code(code) => Some(format!("parsed.status == {code}")),
        StatusMatch::Range(digit) => Some(format!("parsed.status / 100 == {digit}")),
        StatusMatch::Default => None,
    }
}

fn response_ctx(arena: &TypeArena, op: &OperationDescriptor, bare: &str) -> ResponseCtx {
    let mut scope = IdentScope::with_reserved(&["status", "content_type", "body"]);
    let mut fields = Vec::new();
    let mut branches = Vec::new();
    for group in &op.responses {
        for variant in &group.variants {
            let mut condition: Vec<String> = status_condition(group.status).into_iter().collect();
            condition.push(format!(
                "rt::http::media_type_matches(&parsed.content_type, {})",
                literal(&variant.content_type)
            ));
            let typed = match variant.codec {
                BodyCodec::Json => Some(rust_type(arena, variant.ty.as_ref().unwrap_or(&TypeRef::Any))),
                BodyCodec::Text => Some("String".to_string()),
                BodyCodec::Form | BodyCodec::Raw => None,
            };
            let field = typed.map(|ty| {
                let ident = scope.claim(format!(
                    "{}_{}",
                    variant.tag.to_snake_case(),
                    status_key(group.status)
                ));
                fields.push(ResponseFieldCtx {
                    ident: ident.clone(),
                    ty,
                    docs: response_docs(group, &variant.content_type),
                });
                ident
            });
            branches.push(BranchCtx {
                condition: condition.join(" && "),
                field,
                codec: codec_name(variant.codec),
            });
        }
    }
    ResponseCtx {
        type_name: response_type_name(op),
        parse_fn: format!("parse_{bare}_response"),
        fields,
        branches,
    }
}

fn response_docs(group: &ResponseGroup, content_type: &str) -> Vec<String> {
    let status = match group.status {
        StatusMatch::Code(code) => code.to_string(),
        StatusMatch::Range(digit) => format!("{digit}XX"),
        StatusMatch::Default => "default".to_string(),
    };
    let mut docs = vec![format!("`{status}` `{content_type}`")];
    docs.extend(doc_lines(Some(&group.description)));
    docs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_format() {
        assert_eq!(path_format("/pets/{id}/status"), "/pets/{}/status");
        assert_eq!(path_format("/a/{x}.{y}"), "/a/{}.{}");
        assert_eq!(path_format("/pets"), "/pets");
    }

    #[test]
    fn test_status_keys() {
        assert_eq!(status_key(StatusMatch::Range(4)), "4xx");
        assert_eq!(status_condition(StatusMatch::Default), None);
        assert_eq!(
            status_condition(StatusMatch::Code(204)).as_deref(),
            Some("parsed.status == 204")
        );
    }
}
