use apigen_core::ir::{
    AdditionalMode, EnumLiterals, Field, ResolvedType, TypeArena, TypeKind, TypeRef, UnionVariant,
};
use heck::ToPascalCase;
use minijinja::{Environment, context};
use serde::Serialize;

use super::Header;
use super::operation::OperationCtx;
use crate::error::EmitError;
use crate::naming::{IdentScope, doc_lines, literal, type_ident, value_ident, variant_ident};
use crate::type_mapper::{field_type, is_self_referential, rust_type};

/// Identifier of the open map on structs with additional properties.
const ADDITIONAL_IDENT: &str = "additional_properties";

#[derive(Debug, Serialize)]
struct FieldCtx {
    ident: String,
    wire: String,
    ty: String,
    /// `required`, `optional` (may be absent) or `nullable` (present, may be null).
    mode: &'static str,
    docs: Vec<String>,
}

#[derive(Debug, Serialize)]
struct VariantCtx {
    ident: String,
    value: String,
    ty: String,
}

#[derive(Debug, Default, Serialize)]
struct TypeCtx {
    kind: &'static str,
    name: String,
    docs: Vec<String>,
    fields: Vec<FieldCtx>,
    additional: Option<String>,
    additional_ident: String,
    declared_keys: String,
    target: Option<String>,
    variants: Vec<VariantCtx>,
}

/// Emit `types.rs`: every resolved type in arena order, then the parameter
/// structs and request body enums of each operation.
pub fn emit_types(
    env: &Environment<'_>,
    arena: &TypeArena,
    operations: &[OperationCtx],
    header: &Header,
) -> Result<String, EmitError> {
    let types: Vec<TypeCtx> = arena.iter().map(|ty| type_to_ctx(arena, ty)).collect();
    let tmpl = env.get_template("types.rs.j2")?;
    Ok(tmpl.render(context! {
        header => header,
        types => types,
        operations => operations,
    })?)
}

fn type_to_ctx(arena: &TypeArena, ty: &ResolvedType) -> TypeCtx {
    let name = type_ident(&ty.name);
    let mut docs = doc_lines(ty.description.as_deref());
    if docs.is_empty() && !ty.origin.is_empty() {
        docs.push(format!("Declared at `{}`.", ty.origin));
    }
    let base = TypeCtx {
        name,
        docs,
        ..TypeCtx::default()
    };
    match &ty.kind {
        TypeKind::Struct { fields, additional } => struct_ctx(arena, base, fields, additional),
        TypeKind::Enum(EnumLiterals::Strings(values)) => TypeCtx {
            kind: "string_enum",
            variants: string_variants(values),
            ..base
        },
        TypeKind::Enum(EnumLiterals::Integers(values)) => TypeCtx {
            kind: "integer_enum",
            variants: integer_variants(values),
            ..base
        },
        TypeKind::Union(variants) => TypeCtx {
            kind: "union",
            variants: union_variants(arena, variants),
            ..base
        },
        TypeKind::Alias(target) => alias_ctx(arena, ty, base, target.clone()),
        TypeKind::Map(value) => alias_ctx(arena, ty, base, TypeRef::Map(Box::new(value.clone()))),
    }
}

fn alias_ctx(arena: &TypeArena, ty: &ResolvedType, base: TypeCtx, target: TypeRef) -> TypeCtx {
    let kind = if is_self_referential(arena, ty.id) {
        "newtype"
    } else {
        "alias"
    };
    TypeCtx {
        kind,
        target: Some(rust_type(arena, &target)),
        ..base
    }
}

fn struct_ctx(
    arena: &TypeArena,
    base: TypeCtx,
    fields: &[Field],
    additional: &AdditionalMode,
) -> TypeCtx {
    let open = additional.value_type();
    let mut scope = if open.is_some() {
        IdentScope::with_reserved(&[ADDITIONAL_IDENT])
    } else {
        IdentScope::default()
    };
    let fields: Vec<FieldCtx> = fields
        .iter()
        .map(|field| FieldCtx {
            ident: scope.claim(value_ident(&field.name.snake_case)),
            wire: literal(&field.wire_key),
            ty: field_type(arena, field),
            mode: match (field.required, field.nullable) {
                (false, _) => "optional",
                (true, true) => "nullable",
                (true, false) => "required",
            },
            docs: doc_lines(field.description.as_deref()),
        })
        .collect();
    match open {
        Some(value) => TypeCtx {
            kind: "open_struct",
            declared_keys: fields
                .iter()
                .map(|f| f.wire.clone())
                .collect::<Vec<_>>()
                .join(", "),
            fields,
            additional: Some(rust_type(arena, &value)),
            additional_ident: ADDITIONAL_IDENT.to_string(),
            ..base
        },
        None => TypeCtx {
            kind: "struct",
            fields,
            ..base
        },
    }
}

fn string_variants(values: &[String]) -> Vec<VariantCtx> {
    let mut scope = IdentScope::default();
    values
        .iter()
        .map(|value| VariantCtx {
            ident: scope.claim(variant_ident(value)),
            value: literal(value),
            ty: String::new(),
        })
        .collect()
}

fn integer_variants(values: &[i64]) -> Vec<VariantCtx> {
    let mut scope = IdentScope::default();
    values
        .iter()
        .map(|value| {
            let ident = if *value < 0 {
                format!("VMinus{}", value.unsigned_abs())
            } else {
                format!("V{value}")
            };
            VariantCtx {
                ident: scope.claim(ident),
                value: value.to_string(),
                ty: String::new(),
            }
        })
        .collect()
}

fn union_variants(arena: &TypeArena, variants: &[UnionVariant]) -> Vec<VariantCtx> {
    let mut scope = IdentScope::default();
    variants
        .iter()
        .map(|variant| {
            let ty = rust_type(arena, &variant.ty);
            VariantCtx {
                ident: scope.claim(union_variant_ident(arena, &variant.ty)),
                value: String::new(),
                ty: if variant.indirect {
                    format!("Box<{ty}>")
                } else {
                    ty
                },
            }
        })
        .collect()
}

fn union_variant_ident(arena: &TypeArena, ty: &TypeRef) -> String {
    match ty {
        TypeRef::String => "String".to_string(),
        TypeRef::Integer => "Integer".to_string(),
        TypeRef::Number => "Number".to_string(),
        TypeRef::Boolean => "Boolean".to_string(),
        TypeRef::Any => "Any".to_string(),
        TypeRef::Array(_) => "Array".to_string(),
        TypeRef::Map(_) => "Map".to_string(),
        TypeRef::Named(id) => variant_ident(&arena.name_of(*id).to_pascal_case()),
    }
}
