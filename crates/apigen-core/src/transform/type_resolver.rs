use std::collections::{HashMap, VecDeque};

use log::{debug, warn};

use crate::error::{NamingError, SchemaError, TransformError};
use crate::ir::{
    AdditionalMode, EnumLiterals, Field, HttpMethod, ParameterLocation, ResolvedType, TypeArena,
    TypeId, TypeKind, TypeRef, UnionVariant,
};
use crate::parse::DocumentSet;
use crate::parse::operation::{Operation, PathItem};
use crate::parse::reference::{RefTarget, escape_segment};
use crate::parse::schema::{AdditionalProperties, Schema, SchemaKind, SchemaOrRef, SchemaType, TypeSet};

use super::TransformOptions;
use super::composition::FieldSet;
use super::cycles::mark_indirect;
use super::name_normalizer::{content_type_tag, normalize_name, status_tag};
use super::namer::{
    Namer, additional_type_name, body_type_name, component_type_name, item_type_name,
    nested_type_name, param_type_name, response_type_name, variant_type_name,
};
use super::operation_extractor::{
    merged_parameters, operation_name, operation_site, resolve_request_body, resolve_response,
};

/// Method and path of one operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationKey {
    pub method: HttpMethod,
    pub path: String,
}

impl OperationKey {
    pub fn new(method: HttpMethod, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
        }
    }
}

/// A place inside an operation where a schema is attached.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SchemaSite {
    Parameter {
        key: OperationKey,
        location: ParameterLocation,
        name: String,
    },
    RequestBody {
        key: OperationKey,
        content_type: String,
    },
    Response {
        key: OperationKey,
        status: String,
        content_type: String,
    },
}

/// The closed type graph of one run plus the type of every operation schema site.
#[derive(Debug, Clone)]
pub struct ResolvedTypes {
    pub arena: TypeArena,
    pub sites: HashMap<SchemaSite, TypeRef>,
}

impl ResolvedTypes {
    pub fn site(&self, site: &SchemaSite) -> Option<&TypeRef> {
        self.sites.get(site)
    }
}

/// Resolve every schema reachable from the operations and root components.
pub fn resolve_types(
    docs: &DocumentSet,
    options: &TransformOptions,
) -> Result<ResolvedTypes, TransformError> {
    let mut resolver = TypeResolver::new(docs);
    resolver.resolve_operations(options)?;
    resolver.resolve_components()?;
    resolver.drain()?;
    Ok(resolver.finish())
}

struct Slot {
    name: String,
    origin: String,
    kind: Option<TypeKind>,
    description: Option<String>,
}

/// A referenced schema whose name is reserved but whose body is not built yet.
struct PendingBody {
    id: TypeId,
    target: RefTarget,
    schema: SchemaOrRef,
}

struct TypeResolver<'a> {
    docs: &'a DocumentSet,
    slots: Vec<Slot>,
    namer: Namer,
    by_target: HashMap<RefTarget, TypeId>,
    declared: HashMap<TypeId, SchemaOrRef>,
    pending: VecDeque<PendingBody>,
    sites: HashMap<SchemaSite, TypeRef>,
    /// Hoisted inline types by declaration site and name.
    hoisted: HashMap<(String, String), TypeId>,
}

impl<'a> TypeResolver<'a> {
    fn new(docs: &'a DocumentSet) -> Self {
        Self {
            docs,
            slots: Vec::new(),
            namer: Namer::default(),
            by_target: HashMap::new(),
            declared: HashMap::new(),
            pending: VecDeque::new(),
            sites: HashMap::new(),
            hoisted: HashMap::new(),
        }
    }

    fn resolve_operations(&mut self, options: &TransformOptions) -> Result<(), TransformError> {
        let docs = self.docs;
        for (path, item) in &docs.spec().paths {
            for (method, op) in item.operations() {
                let name = operation_name(method, path, op, options);
                self.resolve_operation(OperationKey::new(method, path), item, op, &name.pascal_case)?;
            }
        }
        Ok(())
    }

    fn resolve_operation(
        &mut self,
        key: OperationKey,
        item: &PathItem,
        op: &Operation,
        op_name: &str,
    ) -> Result<(), TransformError> {
        let docs = self.docs;
        let base = operation_site(key.method, &key.path);

        for param in merged_parameters(docs, item, op, &base)? {
            let site = format!("{base}/parameters/{}", escape_segment(&param.value.name));
            let ty = match &param.value.schema {
                Some(schema) => self.resolve_schema(
                    schema,
                    &param_type_name(op_name, &param.value.name),
                    &param.document,
                    &site,
                )?,
                None => TypeRef::Any,
            };
            self.sites.insert(
                SchemaSite::Parameter {
                    key: key.clone(),
                    location: param.value.location,
                    name: param.value.name.clone(),
                },
                ty,
            );
        }

        if let Some(body) = &op.request_body {
            let body = resolve_request_body(docs, body, &base)?;
            for (content_type, media) in &body.value.content {
                let Some(schema) = &media.schema else {
                    continue;
                };
                let site = format!("{base}/requestBody/content/{}", escape_segment(content_type));
                let hint = body_type_name(op_name, &content_type_tag(content_type));
                let ty = self.resolve_schema(schema, &hint, &body.document, &site)?;
                self.sites.insert(
                    SchemaSite::RequestBody {
                        key: key.clone(),
                        content_type: content_type.clone(),
                    },
                    ty,
                );
            }
        }

        for (status, response) in &op.responses {
            let response = resolve_response(docs, response, &base)?;
            for (content_type, media) in &response.value.content {
                let Some(schema) = &media.schema else {
                    continue;
                };
                let site = format!(
                    "{base}/responses/{status}/content/{}",
                    escape_segment(content_type)
                );
                let hint =
                    response_type_name(op_name, &content_type_tag(content_type), &status_tag(status));
                let ty = self.resolve_schema(schema, &hint, &response.document, &site)?;
                self.sites.insert(
                    SchemaSite::Response {
                        key: key.clone(),
                        status: status.clone(),
                        content_type: content_type.clone(),
                    },
                    ty,
                );
            }
        }
        Ok(())
    }

    fn resolve_components(&mut self) -> Result<(), TransformError> {
        let docs = self.docs;
        let Some(components) = &docs.spec().components else {
            return Ok(());
        };
        for name in components.schemas.keys() {
            let reference = format!("#/components/schemas/{}", escape_segment(name));
            self.resolve_reference(&reference, "", "#/components/schemas")?;
        }
        Ok(())
    }

    /// Build the bodies of reserved references until none are left.
    fn drain(&mut self) -> Result<(), TransformError> {
        while let Some(body) = self.pending.pop_front() {
            let origin = body.target.to_string();
            let name = self.slots[body.id.0].name.clone();
            debug!("resolving {name} from {origin}");
            let (kind, description) = match &body.schema {
                SchemaOrRef::Ref { ref_path } => {
                    self.check_alias_chain(&body.target, ref_path)?;
                    let target = self.resolve_reference(ref_path, &body.target.document, &origin)?;
                    (TypeKind::Alias(target), None)
                }
                SchemaOrRef::Schema(schema) => (
                    self.build_kind(schema, &name, &body.target.document, &origin)?,
                    schema.description.clone(),
                ),
            };
            self.define(body.id, kind, description);
        }
        Ok(())
    }

    fn finish(self) -> ResolvedTypes {
        let types = self
            .slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| ResolvedType {
                id: TypeId(index),
                name: slot.name,
                kind: slot.kind.unwrap_or(TypeKind::Alias(TypeRef::Any)),
                description: slot.description,
                origin: slot.origin,
            })
            .collect();
        let mut arena = TypeArena::from_types(types);
        mark_indirect(&mut arena);
        ResolvedTypes {
            arena,
            sites: self.sites,
        }
    }

    fn reserve(&mut self, name: &str, origin: &str) -> Result<TypeId, NamingError> {
        let id = TypeId(self.slots.len());
        self.namer.claim(name, id, origin)?;
        self.slots.push(Slot {
            name: name.to_string(),
            origin: origin.to_string(),
            kind: None,
            description: None,
        });
        Ok(id)
    }

    fn define(&mut self, id: TypeId, kind: TypeKind, description: Option<String>) {
        if let Some(slot) = self.slots.get_mut(id.0) {
            slot.kind = Some(kind);
            slot.description = description;
        }
    }

    fn target(&self, reference: &str, document: &str, site: &str) -> Result<RefTarget, SchemaError> {
        self.docs
            .target(reference, document)
            .ok_or_else(|| SchemaError::InvalidReference {
                reference: reference.to_string(),
                site: site.to_string(),
            })
    }

    fn lookup_schema(
        &self,
        target: &RefTarget,
        reference: &str,
        site: &str,
    ) -> Result<SchemaOrRef, SchemaError> {
        match self.docs.lookup::<SchemaOrRef>(target) {
            Ok(Some(schema)) => Ok(schema),
            Ok(None) => Err(SchemaError::DanglingReference {
                reference: reference.to_string(),
                site: site.to_string(),
            }),
            Err(err) => Err(SchemaError::UnsupportedShape {
                site: target.to_string(),
                detail: err.to_string(),
            }),
        }
    }

    /// Map a `$ref` to its type, reserving a name on first sight.
    fn resolve_reference(
        &mut self,
        reference: &str,
        document: &str,
        site: &str,
    ) -> Result<TypeRef, TransformError> {
        let target = self.target(reference, document, site)?;
        if let Some(id) = self.by_target.get(&target) {
            return Ok(TypeRef::Named(*id));
        }
        let schema = self.lookup_schema(&target, reference, site)?;
        let name = component_type_name(&target);
        let origin = target.to_string();

        if let Some((existing, first)) = self.namer.get(&name) {
            if self.declared.get(&existing) == Some(&schema) {
                debug!("{origin} is identical to {first}, sharing type {name}");
                self.by_target.insert(target, existing);
                return Ok(TypeRef::Named(existing));
            }
            return Err(NamingError::Collision {
                name,
                first: first.to_string(),
                second: origin,
            }
            .into());
        }

        let id = self.reserve(&name, &origin)?;
        self.declared.insert(id, schema.clone());
        self.by_target.insert(target.clone(), id);
        self.pending.push_back(PendingBody { id, target, schema });
        Ok(TypeRef::Named(id))
    }

    /// Follow a chain of pure `$ref` aliases and fail if it loops.
    fn check_alias_chain(&self, start: &RefTarget, first: &str) -> Result<(), SchemaError> {
        let site = start.to_string();
        let mut chain = vec![start.clone()];
        let mut reference = first.to_string();
        let mut document = start.document.clone();
        loop {
            let target = self.target(&reference, &document, &site)?;
            let looped = chain.contains(&target);
            let next = self.lookup_schema(&target, &reference, &site)?;
            document = target.document.clone();
            chain.push(target);
            if looped {
                return Err(SchemaError::CircularReference {
                    chain: join_chain(&chain),
                });
            }
            match next {
                SchemaOrRef::Ref { ref_path } => reference = ref_path,
                SchemaOrRef::Schema(_) => return Ok(()),
            }
        }
    }

    fn resolve_schema(
        &mut self,
        schema: &SchemaOrRef,
        hint: &str,
        document: &str,
        site: &str,
    ) -> Result<TypeRef, TransformError> {
        match schema {
            SchemaOrRef::Ref { ref_path } => self.resolve_reference(ref_path, document, site),
            SchemaOrRef::Schema(schema) => self.resolve_inline(schema, hint, document, site),
        }
    }

    /// Inline schemas that need a declaration are hoisted under `hint`; the
    /// rest map straight to a type reference.
    fn resolve_inline(
        &mut self,
        schema: &Schema,
        hint: &str,
        document: &str,
        site: &str,
    ) -> Result<TypeRef, TransformError> {
        if schema.is_passthrough_composition() {
            return self.resolve_schema(&schema.all_of[0], hint, document, site);
        }
        match schema.kind() {
            SchemaKind::Composition | SchemaKind::Union | SchemaKind::Enum | SchemaKind::Object => {
                self.hoist(schema, hint, document, site).map(TypeRef::Named)
            }
            _ => self.inline_ref(schema, hint, document, site),
        }
    }

    /// Declare an inline schema as its own type. Reaching the same site again,
    /// or an identical schema under a name already taken, reuses the type.
    fn hoist(
        &mut self,
        schema: &Schema,
        hint: &str,
        document: &str,
        site: &str,
    ) -> Result<TypeId, TransformError> {
        let key = (site.to_string(), hint.to_string());
        if let Some(id) = self.hoisted.get(&key) {
            return Ok(*id);
        }
        let declared = SchemaOrRef::Schema(Box::new(schema.clone()));
        if let Some((existing, first)) = self.namer.get(hint) {
            if self.declared.get(&existing) == Some(&declared) {
                debug!("{site} is identical to {first}, sharing type {hint}");
                self.hoisted.insert(key, existing);
                return Ok(existing);
            }
        }
        let id = self.reserve(hint, site)?;
        self.declared.insert(id, declared);
        self.hoisted.insert(key, id);
        let kind = self.build_kind(schema, hint, document, site)?;
        self.define(id, kind, schema.description.clone());
        Ok(id)
    }

    fn inline_ref(
        &mut self,
        schema: &Schema,
        hint: &str,
        document: &str,
        site: &str,
    ) -> Result<TypeRef, TransformError> {
        Ok(match schema.kind() {
            SchemaKind::Map => TypeRef::Map(Box::new(self.map_value(schema, hint, document, site)?)),
            SchemaKind::Array => {
                let item = match &schema.items {
                    Some(items) => self.resolve_schema(
                        items,
                        &item_type_name(hint),
                        document,
                        &format!("{site}/items"),
                    )?,
                    None => TypeRef::Any,
                };
                TypeRef::Array(Box::new(item))
            }
            SchemaKind::String => TypeRef::String,
            SchemaKind::Integer => TypeRef::Integer,
            SchemaKind::Number => TypeRef::Number,
            SchemaKind::Boolean => TypeRef::Boolean,
            _ => TypeRef::Any,
        })
    }

    fn map_value(
        &mut self,
        schema: &Schema,
        owner: &str,
        document: &str,
        site: &str,
    ) -> Result<TypeRef, TransformError> {
        match &schema.additional_properties {
            Some(AdditionalProperties::Schema(value)) => self.resolve_schema(
                value,
                &additional_type_name(owner),
                document,
                &format!("{site}/additionalProperties"),
            ),
            _ => Ok(TypeRef::Any),
        }
    }

    /// The declaration of a named type.
    fn build_kind(
        &mut self,
        schema: &Schema,
        name: &str,
        document: &str,
        site: &str,
    ) -> Result<TypeKind, TransformError> {
        if schema.is_passthrough_composition() {
            return match &schema.all_of[0] {
                SchemaOrRef::Ref { ref_path } => Ok(TypeKind::Alias(
                    self.resolve_reference(ref_path, document, site)?,
                )),
                SchemaOrRef::Schema(member) => self.build_kind(member, name, document, site),
            };
        }
        match schema.kind() {
            SchemaKind::Composition => {
                let mut chain = Vec::new();
                let set = self.collect_fields_of(schema, name, document, site, &mut chain)?;
                Ok(TypeKind::Struct {
                    fields: set.fields,
                    additional: set.additional,
                })
            }
            SchemaKind::Union => {
                let keyword = if schema.one_of.is_empty() { "anyOf" } else { "oneOf" };
                if !schema.properties.is_empty() {
                    warn!("{site}: properties next to {keyword} are ignored");
                }
                let mut variants = Vec::new();
                for (index, member) in schema.union_members().iter().enumerate() {
                    let ty = self.resolve_schema(
                        member,
                        &variant_type_name(name, index + 1),
                        document,
                        &format!("{site}/{keyword}/{index}"),
                    )?;
                    variants.push(UnionVariant { ty, indirect: false });
                }
                Ok(TypeKind::Union(variants))
            }
            SchemaKind::Enum => Ok(TypeKind::Enum(enum_literals(schema, site)?)),
            SchemaKind::Object => {
                let set = self.object_fields(schema, name, document, site)?;
                Ok(TypeKind::Struct {
                    fields: set.fields,
                    additional: set.additional,
                })
            }
            SchemaKind::Map => Ok(TypeKind::Map(self.map_value(schema, name, document, site)?)),
            _ => Ok(TypeKind::Alias(self.inline_ref(schema, name, document, site)?)),
        }
    }

    fn object_fields(
        &mut self,
        schema: &Schema,
        owner: &str,
        document: &str,
        site: &str,
    ) -> Result<FieldSet, TransformError> {
        let mut set = FieldSet::default();
        for (key, property) in &schema.properties {
            let property_site = format!("{site}/properties/{}", escape_segment(key));
            let ty = self.resolve_schema(
                property,
                &nested_type_name(owner, key),
                document,
                &property_site,
            )?;
            let (nullable, description) = match property {
                SchemaOrRef::Schema(inline) => (inline.is_nullable(), inline.description.clone()),
                SchemaOrRef::Ref { .. } => (false, None),
            };
            set.fields.push(Field {
                name: normalize_name(key),
                wire_key: key.clone(),
                ty,
                required: schema.required.contains(key),
                nullable,
                indirect: false,
                description,
            });
        }
        set.additional = self.additional_mode(schema, owner, document, site)?;
        Ok(set)
    }

    fn additional_mode(
        &mut self,
        schema: &Schema,
        owner: &str,
        document: &str,
        site: &str,
    ) -> Result<AdditionalMode, TransformError> {
        Ok(match &schema.additional_properties {
            None | Some(AdditionalProperties::Bool(false)) => AdditionalMode::Forbidden,
            Some(AdditionalProperties::Bool(true)) => AdditionalMode::Arbitrary,
            Some(AdditionalProperties::Schema(value)) => match self.resolve_schema(
                value,
                &additional_type_name(owner),
                document,
                &format!("{site}/additionalProperties"),
            )? {
                TypeRef::Any => AdditionalMode::Arbitrary,
                ty => AdditionalMode::Typed(ty),
            },
        })
    }

    /// Fields of one `allOf` member, following references.
    fn collect_fields(
        &mut self,
        member: &SchemaOrRef,
        owner: &str,
        document: &str,
        site: &str,
        chain: &mut Vec<RefTarget>,
    ) -> Result<FieldSet, TransformError> {
        match member {
            SchemaOrRef::Ref { ref_path } => {
                let target = self.target(ref_path, document, site)?;
                if chain.contains(&target) {
                    let mut looped = chain.clone();
                    looped.push(target);
                    return Err(SchemaError::CircularReference {
                        chain: join_chain(&looped),
                    }
                    .into());
                }
                let schema = self.lookup_schema(&target, ref_path, site)?;
                let origin = target.to_string();
                let member_document = target.document.clone();
                // Inline fields keep the names the referenced type gives them.
                let member_owner = component_type_name(&target);
                chain.push(target);
                let set =
                    self.collect_fields(&schema, &member_owner, &member_document, &origin, chain);
                chain.pop();
                set
            }
            SchemaOrRef::Schema(schema) => {
                self.collect_fields_of(schema, owner, document, site, chain)
            }
        }
    }

    fn collect_fields_of(
        &mut self,
        schema: &Schema,
        owner: &str,
        document: &str,
        site: &str,
        chain: &mut Vec<RefTarget>,
    ) -> Result<FieldSet, TransformError> {
        match schema.kind() {
            SchemaKind::Composition | SchemaKind::Object | SchemaKind::Map | SchemaKind::Any => {}
            other => {
                return Err(SchemaError::UnsupportedShape {
                    site: site.to_string(),
                    detail: format!("allOf member is {other:?}, not an object"),
                }
                .into());
            }
        }
        let mut set = FieldSet::default();
        for (index, member) in schema.all_of.iter().enumerate() {
            let member_set =
                self.collect_fields(member, owner, document, &format!("{site}/allOf/{index}"), chain)?;
            set.merge(owner, member_set)?;
        }
        let own = self.object_fields(schema, owner, document, site)?;
        set.merge(owner, own)?;
        set.mark_required(&schema.required);
        Ok(set)
    }
}

fn join_chain(chain: &[RefTarget]) -> String {
    chain
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn enum_literals(schema: &Schema, site: &str) -> Result<EnumLiterals, SchemaError> {
    let values = schema.literals();
    if values.is_empty() {
        return Err(SchemaError::UnsupportedShape {
            site: site.to_string(),
            detail: "enum has no non-null members".to_string(),
        });
    }

    let declared = schema.schema_type.as_ref().map(TypeSet::non_null);
    let string_typed = matches!(declared.as_deref(), Some([SchemaType::String]));
    if !string_typed {
        let integers: Option<Vec<i64>> = values.iter().map(|v| v.as_i64()).collect();
        if let Some(integers) = integers {
            return Ok(EnumLiterals::Integers(integers));
        }
    }

    let strings = values
        .iter()
        .map(|value| match value.as_str() {
            Some(s) => s.to_string(),
            None => {
                warn!("{site}: enum member {value} is not a string, using its JSON text");
                value.to_string()
            }
        })
        .collect();
    Ok(EnumLiterals::Strings(strings))
}
