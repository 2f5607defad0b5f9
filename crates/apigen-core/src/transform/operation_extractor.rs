use std::collections::HashMap;

use log::{debug, warn};
use serde::de::DeserializeOwned;

use crate::config::NamingStrategy;
use crate::error::{NamingError, SchemaError, TransformError};
use crate::ir::{
    BodyCodec, HttpMethod, NormalizedName, OperationDescriptor, ParamStyle, ParameterDescriptor,
    ParameterLocation, RequestBodyDescriptor, RequestBodyVariant, ResponseGroup, ResponseVariant,
    StatusMatch, TypeArena, TypeId, TypeKind, TypeRef, path_template_names,
};
use crate::parse::DocumentSet;
use crate::parse::operation::{
    Operation, Parameter, ParameterOrRef, PathItem, RequestBody, RequestBodyOrRef, Response,
    ResponseOrRef,
};
use crate::parse::reference::{RefTarget, escape_segment};

use super::TransformOptions;
use super::name_normalizer::{content_type_tag, normalize_name, route_to_name};
use super::type_resolver::{OperationKey, ResolvedTypes, SchemaSite};

/// A value found by following references, with the document it lives in so
/// nested references resolve relative to it.
#[derive(Debug, Clone)]
pub struct Located<T> {
    pub value: T,
    pub document: String,
}

/// Diagnostic location of an operation: `#/paths/~1pets/get`.
pub fn operation_site(method: HttpMethod, path: &str) -> String {
    format!("#/paths/{}/{}", escape_segment(path), method.key())
}

/// Resolve the operation name from operationId or route, then apply aliases.
pub fn operation_name(
    method: HttpMethod,
    path: &str,
    op: &Operation,
    options: &TransformOptions,
) -> NormalizedName {
    let raw = match options.naming_strategy {
        NamingStrategy::UseOperationId => op
            .operation_id
            .clone()
            .unwrap_or_else(|| route_to_name(method, path)),
        NamingStrategy::UseRouteBased => route_to_name(method, path),
    };
    let aliased = options.aliases.get(&raw).cloned().unwrap_or(raw);
    normalize_name(&aliased)
}

/// Reject two operations that normalize to the same name.
pub fn check_operation_names(
    docs: &DocumentSet,
    options: &TransformOptions,
) -> Result<(), NamingError> {
    let mut seen: HashMap<String, String> = HashMap::new();
    for (path, item) in &docs.spec().paths {
        for (method, op) in item.operations() {
            let name = operation_name(method, path, op, options);
            let site = operation_site(method, path);
            if let Some(first) = seen.get(&name.snake_case) {
                return Err(NamingError::DuplicateOperation {
                    name: name.original,
                    first: first.clone(),
                    second: site,
                });
            }
            seen.insert(name.snake_case, site);
        }
    }
    Ok(())
}

/// Follow a chain of references until a concrete value is reached.
fn follow<R, T>(
    docs: &DocumentSet,
    start: &R,
    site: &str,
    split: impl Fn(R) -> Result<T, String>,
) -> Result<Located<T>, SchemaError>
where
    R: DeserializeOwned + Clone,
{
    let mut current = start.clone();
    let mut document = String::new();
    let mut chain: Vec<RefTarget> = Vec::new();
    loop {
        let reference = match split(current) {
            Ok(value) => return Ok(Located { value, document }),
            Err(reference) => reference,
        };
        let target = docs
            .target(&reference, &document)
            .ok_or_else(|| SchemaError::InvalidReference {
                reference: reference.clone(),
                site: site.to_string(),
            })?;
        if chain.contains(&target) {
            chain.push(target);
            return Err(SchemaError::CircularReference {
                chain: chain
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" -> "),
            });
        }
        current = match docs.lookup::<R>(&target) {
            Ok(Some(value)) => value,
            Ok(None) => {
                return Err(SchemaError::DanglingReference {
                    reference,
                    site: site.to_string(),
                });
            }
            Err(err) => {
                return Err(SchemaError::UnsupportedShape {
                    site: target.to_string(),
                    detail: err.to_string(),
                });
            }
        };
        document = target.document.clone();
        chain.push(target);
    }
}

pub fn resolve_parameter(
    docs: &DocumentSet,
    param: &ParameterOrRef,
    site: &str,
) -> Result<Located<Parameter>, SchemaError> {
    follow(docs, param, site, |p| match p {
        ParameterOrRef::Ref { ref_path } => Err(ref_path),
        ParameterOrRef::Parameter(p) => Ok(p),
    })
}

pub fn resolve_request_body(
    docs: &DocumentSet,
    body: &RequestBodyOrRef,
    site: &str,
) -> Result<Located<RequestBody>, SchemaError> {
    follow(docs, body, site, |b| match b {
        RequestBodyOrRef::Ref { ref_path } => Err(ref_path),
        RequestBodyOrRef::RequestBody(b) => Ok(b),
    })
}

pub fn resolve_response(
    docs: &DocumentSet,
    response: &ResponseOrRef,
    site: &str,
) -> Result<Located<Response>, SchemaError> {
    follow(docs, response, site, |r| match r {
        ResponseOrRef::Ref { ref_path } => Err(ref_path),
        ResponseOrRef::Response(r) => Ok(r),
    })
}

fn resolve_parameter_list(
    docs: &DocumentSet,
    list: &[ParameterOrRef],
    site: &str,
) -> Result<Vec<Located<Parameter>>, SchemaError> {
    let mut resolved: Vec<Located<Parameter>> = Vec::new();
    for param in list {
        let param = resolve_parameter(docs, param, site)?;
        if resolved.iter().any(|p| same_parameter(&p.value, &param.value)) {
            return Err(SchemaError::DuplicateParameter {
                location: param.value.location.as_str().to_string(),
                name: param.value.name,
                site: site.to_string(),
            });
        }
        resolved.push(param);
    }
    Ok(resolved)
}

fn same_parameter(a: &Parameter, b: &Parameter) -> bool {
    a.location == b.location && a.name == b.name
}

/// Path-level parameters followed by the operation's own; an operation
/// parameter with the same name and location replaces the path-level one.
pub fn merged_parameters(
    docs: &DocumentSet,
    item: &PathItem,
    op: &Operation,
    site: &str,
) -> Result<Vec<Located<Parameter>>, SchemaError> {
    let mut merged = resolve_parameter_list(docs, &item.parameters, site)?;
    for param in resolve_parameter_list(docs, &op.parameters, site)? {
        match merged.iter_mut().find(|p| same_parameter(&p.value, &param.value)) {
            Some(slot) => *slot = param,
            None => merged.push(param),
        }
    }
    Ok(merged)
}

fn parameter_style(param: &Parameter, site: &str) -> Result<ParamStyle, SchemaError> {
    let unsupported = |style: &str| SchemaError::UnsupportedStyle {
        style: style.to_string(),
        location: param.location.as_str().to_string(),
        name: param.name.clone(),
        site: site.to_string(),
    };
    let style = match param.style.as_deref() {
        None => return Ok(ParamStyle::default_for(param.location)),
        Some("simple") => ParamStyle::Simple,
        Some("form") => ParamStyle::Form,
        Some("deepObject") => ParamStyle::DeepObject,
        Some(other) => return Err(unsupported(other)),
    };
    let allowed = match param.location {
        ParameterLocation::Path | ParameterLocation::Header => style == ParamStyle::Simple,
        ParameterLocation::Query => true,
        ParameterLocation::Cookie => style == ParamStyle::Form,
    };
    if allowed {
        Ok(style)
    } else {
        Err(unsupported(style.as_str()))
    }
}

/// Build one descriptor per operation, in path order then method order.
pub fn extract_operations(
    docs: &DocumentSet,
    types: &ResolvedTypes,
    options: &TransformOptions,
) -> Result<Vec<OperationDescriptor>, TransformError> {
    let mut operations = Vec::new();
    for (path, item) in &docs.spec().paths {
        for (method, op) in item.operations() {
            let name = operation_name(method, path, op, options);
            debug!("extracting {} {path} as {name}", method.as_str());
            let key = OperationKey::new(method, path);
            operations.push(extract_operation(docs, types, key, item, op, name)?);
        }
    }
    Ok(operations)
}

fn extract_operation(
    docs: &DocumentSet,
    types: &ResolvedTypes,
    key: OperationKey,
    item: &PathItem,
    op: &Operation,
    name: NormalizedName,
) -> Result<OperationDescriptor, TransformError> {
    let site = operation_site(key.method, &key.path);

    let mut parameters = Vec::new();
    for param in merged_parameters(docs, item, op, &site)? {
        parameters.push(parameter_descriptor(types, &key, param.value, &site)?);
    }
    let template = path_template_names(&key.path);
    for variable in &template {
        let declared = parameters
            .iter()
            .any(|p| p.location == ParameterLocation::Path && &p.wire_name == variable);
        if !declared {
            return Err(SchemaError::UnsupportedShape {
                site: site.clone(),
                detail: format!("path variable '{variable}' has no path parameter"),
            }
            .into());
        }
    }
    for param in parameters.iter().filter(|p| p.location == ParameterLocation::Path) {
        if !template.contains(&param.wire_name) {
            warn!("{site}: path parameter '{}' is not in the path template", param.wire_name);
        }
    }

    let request_body = match &op.request_body {
        Some(body) => Some(request_body_descriptor(docs, types, &key, body, &site)?),
        None => None,
    };

    Ok(OperationDescriptor {
        name,
        method: key.method,
        summary: op.summary.clone(),
        description: op.description.clone(),
        tags: op.tags.clone(),
        parameters,
        request_body,
        responses: response_groups(docs, types, &key, op, &site)?,
        deprecated: op.deprecated.unwrap_or(false),
        path: key.path,
    })
}

fn parameter_descriptor(
    types: &ResolvedTypes,
    key: &OperationKey,
    param: Parameter,
    site: &str,
) -> Result<ParameterDescriptor, SchemaError> {
    let param_site = format!("{site}/parameters/{}", escape_segment(&param.name));
    let style = parameter_style(&param, &param_site)?;
    let ty = types
        .site(&SchemaSite::Parameter {
            key: key.clone(),
            location: param.location,
            name: param.name.clone(),
        })
        .cloned()
        .unwrap_or(TypeRef::Any);
    let explode = param.explode.unwrap_or(style == ParamStyle::Form);
    if style != ParamStyle::DeepObject {
        let lists_in_objects = style == ParamStyle::Form && explode;
        if let Some(detail) = flat_shape_problem(&types.arena, &ty, lists_in_objects, &mut Vec::new()) {
            return Err(SchemaError::UnsupportedParameterShape {
                style: style.as_str().to_string(),
                location: param.location.as_str().to_string(),
                name: param.name,
                detail,
                site: param_site,
            });
        }
    }
    Ok(ParameterDescriptor {
        name: normalize_name(&param.name),
        required: param.required || param.location == ParameterLocation::Path,
        explode,
        location: param.location,
        style,
        ty,
        description: param.description,
        wire_name: param.name,
    })
}

/// Styles other than deepObject carry one level of scalars. Exploded form
/// objects may also repeat a key for a list of scalars.
fn flat_shape_problem(
    arena: &TypeArena,
    ty: &TypeRef,
    lists_in_objects: bool,
    visiting: &mut Vec<TypeId>,
) -> Option<String> {
    match ty {
        TypeRef::Array(item) if !is_scalar(arena, item, visiting) => {
            Some("array items are not scalars".to_string())
        }
        TypeRef::Map(value) if !is_scalar(arena, value, visiting) => {
            Some("map values are not scalars".to_string())
        }
        TypeRef::Named(id) if !visiting.contains(id) => {
            let kind = &arena.get(*id)?.kind;
            visiting.push(*id);
            let problem = match kind {
                TypeKind::Struct { fields, additional } => fields
                    .iter()
                    .find(|field| {
                        !is_scalar(arena, &field.ty, visiting)
                            && !(lists_in_objects && is_scalar_list(arena, &field.ty, visiting))
                    })
                    .map(|field| format!("field '{}' is not a scalar", field.wire_key))
                    .or_else(|| {
                        additional
                            .value_type()
                            .filter(|value| !is_scalar(arena, value, visiting))
                            .map(|_| "additional properties are not scalars".to_string())
                    }),
                TypeKind::Map(value) => (!is_scalar(arena, value, visiting))
                    .then(|| "map values are not scalars".to_string()),
                TypeKind::Alias(target) => {
                    flat_shape_problem(arena, target, lists_in_objects, visiting)
                }
                TypeKind::Union(variants) => variants
                    .iter()
                    .any(|variant| !is_scalar(arena, &variant.ty, visiting))
                    .then(|| "union has a structured variant".to_string()),
                TypeKind::Enum(_) => None,
            };
            visiting.pop();
            problem
        }
        _ => None,
    }
}

fn is_scalar(arena: &TypeArena, ty: &TypeRef, visiting: &mut Vec<TypeId>) -> bool {
    match ty {
        TypeRef::Array(_) | TypeRef::Map(_) => false,
        TypeRef::Named(id) => {
            if visiting.contains(id) {
                return false;
            }
            visiting.push(*id);
            let scalar = match arena.get(*id).map(|t| &t.kind) {
                Some(TypeKind::Enum(_)) => true,
                Some(TypeKind::Alias(target)) => is_scalar(arena, target, visiting),
                Some(TypeKind::Union(variants)) => variants
                    .iter()
                    .all(|variant| is_scalar(arena, &variant.ty, visiting)),
                _ => false,
            };
            visiting.pop();
            scalar
        }
        _ => true,
    }
}

fn is_scalar_list(arena: &TypeArena, ty: &TypeRef, visiting: &mut Vec<TypeId>) -> bool {
    match ty {
        TypeRef::Array(item) => is_scalar(arena, item, visiting),
        TypeRef::Named(id) if !visiting.contains(id) => match arena.get(*id).map(|t| &t.kind) {
            Some(TypeKind::Alias(target)) => {
                visiting.push(*id);
                let list = is_scalar_list(arena, target, visiting);
                visiting.pop();
                list
            }
            _ => false,
        },
        _ => false,
    }
}

fn request_body_descriptor(
    docs: &DocumentSet,
    types: &ResolvedTypes,
    key: &OperationKey,
    body: &RequestBodyOrRef,
    site: &str,
) -> Result<RequestBodyDescriptor, SchemaError> {
    let body = resolve_request_body(docs, body, site)?;
    let variants = body
        .value
        .content
        .keys()
        .map(|content_type| {
            let codec = BodyCodec::for_media_type(content_type);
            let ty = types
                .site(&SchemaSite::RequestBody {
                    key: key.clone(),
                    content_type: content_type.clone(),
                })
                .cloned();
            RequestBodyVariant {
                content_type: content_type.clone(),
                tag: content_type_tag(content_type),
                ty: typed_payload(codec, ty, content_type, site),
                codec,
            }
        })
        .collect();
    Ok(RequestBodyDescriptor {
        required: body.value.required,
        description: body.value.description,
        variants,
    })
}

/// Groups in declaration order with `default` moved last.
fn response_groups(
    docs: &DocumentSet,
    types: &ResolvedTypes,
    key: &OperationKey,
    op: &Operation,
    site: &str,
) -> Result<Vec<ResponseGroup>, SchemaError> {
    let mut groups = Vec::new();
    let mut fallback = None;
    for (status, response) in &op.responses {
        let status_match =
            StatusMatch::parse(status).ok_or_else(|| SchemaError::UnsupportedShape {
                site: format!("{site}/responses/{status}"),
                detail: format!("invalid status key '{status}'"),
            })?;
        let response = resolve_response(docs, response, site)?;
        let variants = response
            .value
            .content
            .keys()
            .map(|content_type| {
                let codec = BodyCodec::for_media_type(content_type);
                let ty = types
                    .site(&SchemaSite::Response {
                        key: key.clone(),
                        status: status.clone(),
                        content_type: content_type.clone(),
                    })
                    .cloned();
                ResponseVariant {
                    content_type: content_type.clone(),
                    tag: content_type_tag(content_type),
                    ty: typed_payload(codec, ty, content_type, site),
                    codec,
                }
            })
            .collect();
        let group = ResponseGroup {
            status: status_match,
            description: response.value.description,
            variants,
        };
        if status_match == StatusMatch::Default {
            fallback = Some(group);
        } else {
            groups.push(group);
        }
    }
    groups.extend(fallback);
    Ok(groups)
}

/// Only JSON and form payloads carry a decoded type; other media stay raw.
fn typed_payload(
    codec: BodyCodec,
    ty: Option<TypeRef>,
    content_type: &str,
    site: &str,
) -> Option<TypeRef> {
    match codec {
        BodyCodec::Json | BodyCodec::Form => Some(ty.unwrap_or(TypeRef::Any)),
        BodyCodec::Text => None,
        BodyCodec::Raw => {
            if ty.is_some() {
                warn!("{site}: schema for {content_type} is ignored, payload is passed as bytes");
            }
            None
        }
    }
}
