use apigen_core::ir::{EnumLiterals, Field, TypeArena, TypeId, TypeKind, TypeRef};

use crate::naming::type_ident;

/// Map a `TypeRef` to the Rust type emitted for it.
pub fn rust_type(arena: &TypeArena, ty: &TypeRef) -> String {
    match ty {
        TypeRef::String => "String".to_string(),
        TypeRef::Integer => "i64".to_string(),
        TypeRef::Number => "f64".to_string(),
        TypeRef::Boolean => "bool".to_string(),
        TypeRef::Any => "serde_json::Value".to_string(),
        TypeRef::Array(inner) => format!("Vec<{}>", rust_type(arena, inner)),
        TypeRef::Map(value) => format!("BTreeMap<String, {}>", rust_type(arena, value)),
        TypeRef::Named(id) => type_ident(arena.name_of(*id)),
    }
}

/// Declared type of a struct field: boxed when it closes a cycle, optional
/// when it may be absent or null.
pub fn field_type(arena: &TypeArena, field: &Field) -> String {
    let inner = rust_type(arena, &field.ty);
    let inner = if field.indirect {
        format!("Box<{inner}>")
    } else {
        inner
    };
    if field.is_optional() {
        format!("Option<{inner}>")
    } else {
        inner
    }
}

/// Whether an alias-like type (`pub type X = ...`) would expand into itself.
/// Such types are emitted as transparent newtypes instead.
pub fn is_self_referential(arena: &TypeArena, id: TypeId) -> bool {
    let Some(ty) = arena.get(id) else {
        return false;
    };
    let mut visited = vec![id];
    match &ty.kind {
        TypeKind::Alias(target) | TypeKind::Map(target) => {
            mentions_through_aliases(arena, target, id, &mut visited)
        }
        _ => false,
    }
}

fn mentions_through_aliases(
    arena: &TypeArena,
    ty: &TypeRef,
    goal: TypeId,
    visited: &mut Vec<TypeId>,
) -> bool {
    match ty {
        TypeRef::Array(inner) | TypeRef::Map(inner) => {
            mentions_through_aliases(arena, inner, goal, visited)
        }
        TypeRef::Named(id) if *id == goal => true,
        TypeRef::Named(id) => {
            if visited.contains(id) {
                return false;
            }
            visited.push(*id);
            match arena.get(*id).map(|t| &t.kind) {
                Some(TypeKind::Alias(target)) | Some(TypeKind::Map(target)) => {
                    mentions_through_aliases(arena, target, goal, visited)
                }
                _ => false,
            }
        }
        _ => false,
    }
}

/// A Rust expression of type `ParamShape` describing how to decode `ty`
/// from a parameter string. Recursive types degrade to `Any` at the point
/// where they repeat.
pub fn param_shape(arena: &TypeArena, ty: &TypeRef) -> String {
    shape_of(arena, ty, &mut Vec::new())
}

fn shape_of(arena: &TypeArena, ty: &TypeRef, visiting: &mut Vec<TypeId>) -> String {
    match ty {
        TypeRef::Array(inner) => format!(
            "rt::ParamShape::Array({})",
            primitive(primitive_of(arena, inner, visiting))
        ),
        TypeRef::Map(value) => object_shape(&[], Some(primitive_of(arena, value, visiting))),
        TypeRef::Named(id) => {
            if visiting.contains(id) {
                return scalar("Any");
            }
            let Some(resolved) = arena.get(*id) else {
                return scalar("Any");
            };
            visiting.push(*id);
            let shape = match &resolved.kind {
                TypeKind::Struct { fields, additional } => {
                    let fields: Vec<(String, String)> = fields
                        .iter()
                        .map(|f| (f.wire_key.clone(), shape_of(arena, &f.ty, visiting)))
                        .collect();
                    let additional = additional
                        .value_type()
                        .map(|value| primitive_of(arena, &value, visiting));
                    object_shape(&fields, additional)
                }
                TypeKind::Map(value) => {
                    object_shape(&[], Some(primitive_of(arena, value, visiting)))
                }
                TypeKind::Alias(target) => shape_of(arena, target, visiting),
                TypeKind::Enum(EnumLiterals::Strings(_)) => scalar("String"),
                TypeKind::Enum(EnumLiterals::Integers(_)) => scalar("Integer"),
                TypeKind::Union(_) => scalar("Text"),
            };
            visiting.pop();
            shape
        }
        scalar_ty => scalar(primitive_of(arena, scalar_ty, visiting)),
    }
}

fn primitive_of(arena: &TypeArena, ty: &TypeRef, visiting: &mut Vec<TypeId>) -> &'static str {
    match ty {
        TypeRef::String => "String",
        TypeRef::Integer => "Integer",
        TypeRef::Number => "Number",
        TypeRef::Boolean => "Boolean",
        TypeRef::Named(id) if !visiting.contains(id) => match arena.get(*id).map(|t| &t.kind) {
            Some(TypeKind::Enum(EnumLiterals::Strings(_))) => "String",
            Some(TypeKind::Enum(EnumLiterals::Integers(_))) => "Integer",
            Some(TypeKind::Union(_)) => "Text",
            Some(TypeKind::Alias(target)) => {
                visiting.push(*id);
                let primitive = primitive_of(arena, target, visiting);
                visiting.pop();
                primitive
            }
            _ => "Any",
        },
        _ => "Any",
    }
}

fn primitive(name: &str) -> String {
    format!("rt::Primitive::{name}")
}

fn scalar(name: &str) -> String {
    format!("rt::ParamShape::Primitive({})", primitive(name))
}

fn object_shape(fields: &[(String, String)], additional: Option<&str>) -> String {
    let fields: Vec<String> = fields
        .iter()
        .map(|(key, shape)| format!("({key:?}, {shape})"))
        .collect();
    let additional = match additional {
        Some(name) => format!("Some({})", primitive(name)),
        None => "None".to_string(),
    };
    format!(
        "rt::ParamShape::Object {{ fields: &[{}], additional: {additional} }}",
        fields.join(", ")
    )
}
