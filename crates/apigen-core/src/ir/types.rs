use std::fmt;

use indexmap::IndexMap;

/// Stable handle of a resolved type inside one [`TypeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub usize);

/// A name with multiple casing variants pre-computed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedName {
    pub original: String,
    pub pascal_case: String,
    pub camel_case: String,
    pub snake_case: String,
    pub screaming_snake: String,
}

impl fmt::Display for NormalizedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

/// How a field or parameter refers to its type. Named types are referenced by
/// id, never embedded, so the graph may contain cycles.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    String,
    Integer,
    Number,
    Boolean,
    Any,
    Array(Box<TypeRef>),
    Map(Box<TypeRef>),
    Named(TypeId),
}

impl TypeRef {
    pub fn named(&self) -> Option<TypeId> {
        match self {
            TypeRef::Named(id) => Some(*id),
            _ => None,
        }
    }
}

/// Policy for keys outside the declared field set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdditionalMode {
    /// Unknown keys are dropped on decode.
    Forbidden,
    /// Unknown keys are kept, values decode as the given type.
    Typed(TypeRef),
    /// Unknown keys are kept as generic JSON values.
    Arbitrary,
}

impl AdditionalMode {
    pub fn is_open(&self) -> bool {
        !matches!(self, AdditionalMode::Forbidden)
    }

    /// The value type of the open map, if any.
    pub fn value_type(&self) -> Option<TypeRef> {
        match self {
            AdditionalMode::Forbidden => None,
            AdditionalMode::Typed(ty) => Some(ty.clone()),
            AdditionalMode::Arbitrary => Some(TypeRef::Any),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: NormalizedName,
    /// Key used on the wire.
    pub wire_key: String,
    pub ty: TypeRef,
    pub required: bool,
    pub nullable: bool,
    /// Set when the field closes a by-value cycle and must be stored behind a pointer.
    pub indirect: bool,
    pub description: Option<String>,
}

impl Field {
    /// Whether the emitted field may be absent.
    pub fn is_optional(&self) -> bool {
        !self.required || self.nullable
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumLiterals {
    Strings(Vec<String>),
    Integers(Vec<i64>),
}

impl EnumLiterals {
    pub fn len(&self) -> usize {
        match self {
            EnumLiterals::Strings(values) => values.len(),
            EnumLiterals::Integers(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionVariant {
    pub ty: TypeRef,
    pub indirect: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Struct {
        fields: Vec<Field>,
        additional: AdditionalMode,
    },
    Map(TypeRef),
    Enum(EnumLiterals),
    Alias(TypeRef),
    Union(Vec<UnionVariant>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedType {
    pub id: TypeId,
    /// Unique type name, already in target casing.
    pub name: String,
    pub kind: TypeKind,
    pub description: Option<String>,
    /// Where the type was declared, for diagnostics.
    pub origin: String,
}

impl ResolvedType {
    pub fn is_open(&self) -> bool {
        matches!(&self.kind, TypeKind::Struct { additional, .. } if additional.is_open())
    }
}

/// Owner of every resolved type of one generation run, in resolution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeArena {
    types: Vec<ResolvedType>,
    by_name: IndexMap<String, TypeId>,
}

impl TypeArena {
    pub(crate) fn from_types(types: Vec<ResolvedType>) -> Self {
        let by_name = types.iter().map(|t| (t.name.clone(), t.id)).collect();
        Self { types, by_name }
    }

    pub fn get(&self, id: TypeId) -> Option<&ResolvedType> {
        self.types.get(id.0)
    }

    pub fn lookup(&self, name: &str) -> Option<&ResolvedType> {
        self.by_name.get(name).and_then(|id| self.get(*id))
    }

    pub fn name_of(&self, id: TypeId) -> &str {
        self.get(id).map(|t| t.name.as_str()).unwrap_or("?")
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedType> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub(crate) fn types_mut(&mut self) -> &mut [ResolvedType] {
        &mut self.types
    }
}
