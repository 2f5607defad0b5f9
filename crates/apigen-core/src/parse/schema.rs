use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A JSON Schema type keyword value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Null,
}

/// The `type` field can be a single type or an array of types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeSet {
    Single(SchemaType),
    Multiple(Vec<SchemaType>),
}

impl TypeSet {
    /// The declared types other than `null`.
    pub fn non_null(&self) -> Vec<SchemaType> {
        match self {
            TypeSet::Single(SchemaType::Null) => Vec::new(),
            TypeSet::Single(t) => vec![*t],
            TypeSet::Multiple(ts) => ts
                .iter()
                .copied()
                .filter(|t| *t != SchemaType::Null)
                .collect(),
        }
    }

    pub fn allows_null(&self) -> bool {
        match self {
            TypeSet::Single(t) => *t == SchemaType::Null,
            TypeSet::Multiple(ts) => ts.contains(&SchemaType::Null),
        }
    }
}

/// A reference or inline schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaOrRef {
    Ref {
        #[serde(rename = "$ref")]
        ref_path: String,
    },
    Schema(Box<Schema>),
}

/// Discriminator for polymorphic schemas. Parsed, not interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discriminator {
    #[serde(rename = "propertyName")]
    pub property_name: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub mapping: IndexMap<String, String>,
}

/// A JSON Schema object, limited to the keywords that shape generated types.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<TypeSet>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, SchemaOrRef>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(
        rename = "additionalProperties",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<AdditionalProperties>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaOrRef>>,

    #[serde(rename = "allOf", default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<SchemaOrRef>,

    #[serde(rename = "oneOf", default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<SchemaOrRef>,

    #[serde(rename = "anyOf", default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<SchemaOrRef>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<Discriminator>,

    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<serde_json::Value>,

    #[serde(rename = "const", skip_serializing_if = "Option::is_none")]
    pub const_value: Option<serde_json::Value>,

    #[serde(rename = "readOnly", skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,

    #[serde(rename = "writeOnly", skip_serializing_if = "Option::is_none")]
    pub write_only: Option<bool>,
}

/// `additionalProperties` can be a boolean or a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Bool(bool),
    Schema(Box<SchemaOrRef>),
}

/// Structural classification of an inline schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    /// `allOf` merge.
    Composition,
    /// `oneOf` / `anyOf`.
    Union,
    /// `enum` or `const`.
    Enum,
    /// Object with declared properties (or explicitly closed).
    Object,
    /// Object with no declared properties.
    Map,
    Array,
    String,
    Integer,
    Number,
    Boolean,
    Any,
}

impl Schema {
    /// Classify the node. Composition and union keywords take precedence over
    /// `type`, matching how generators commonly read mixed schemas.
    pub fn kind(&self) -> SchemaKind {
        if !self.all_of.is_empty() {
            return SchemaKind::Composition;
        }
        if !self.one_of.is_empty() || !self.any_of.is_empty() {
            return SchemaKind::Union;
        }
        if !self.literals().is_empty() {
            return SchemaKind::Enum;
        }

        let declared = self
            .schema_type
            .as_ref()
            .map(TypeSet::non_null)
            .unwrap_or_default();
        match declared.as_slice() {
            [SchemaType::Object] => self.object_kind(),
            [SchemaType::Array] => SchemaKind::Array,
            [SchemaType::String] => SchemaKind::String,
            [SchemaType::Integer] => SchemaKind::Integer,
            [SchemaType::Number] => SchemaKind::Number,
            [SchemaType::Boolean] => SchemaKind::Boolean,
            [] if !self.properties.is_empty() || self.additional_properties.is_some() => {
                self.object_kind()
            }
            [] if self.items.is_some() => SchemaKind::Array,
            _ => SchemaKind::Any,
        }
    }

    fn object_kind(&self) -> SchemaKind {
        let closed = matches!(
            self.additional_properties,
            Some(AdditionalProperties::Bool(false))
        );
        if !self.properties.is_empty() || closed {
            SchemaKind::Object
        } else {
            SchemaKind::Map
        }
    }

    pub fn is_object_like(&self) -> bool {
        matches!(self.kind(), SchemaKind::Object | SchemaKind::Map)
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable.unwrap_or(false)
            || self.schema_type.as_ref().is_some_and(TypeSet::allows_null)
            || self.enum_values.iter().any(serde_json::Value::is_null)
    }

    /// `allOf` with a single member and nothing of its own: a plain wrapper.
    pub fn is_passthrough_composition(&self) -> bool {
        self.all_of.len() == 1
            && self.properties.is_empty()
            && self.additional_properties.is_none()
            && self.required.is_empty()
    }

    /// Enum literals, with `const` treated as a single-member enum. Nulls are dropped.
    pub fn literals(&self) -> Vec<&serde_json::Value> {
        if !self.enum_values.is_empty() {
            return self.enum_values.iter().filter(|v| !v.is_null()).collect();
        }
        self.const_value
            .iter()
            .filter(|v| !v.is_null())
            .collect()
    }

    /// Union members, preferring `oneOf` over `anyOf`.
    pub fn union_members(&self) -> &[SchemaOrRef] {
        if self.one_of.is_empty() {
            &self.any_of
        } else {
            &self.one_of
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(yaml: &str) -> Schema {
        serde_yaml_ng::from_str(yaml).unwrap()
    }

    #[test]
    fn test_object_kinds() {
        assert_eq!(
            schema("type: object\nproperties:\n  a: {type: string}").kind(),
            SchemaKind::Object
        );
        assert_eq!(schema("type: object").kind(), SchemaKind::Map);
        assert_eq!(
            schema("type: object\nadditionalProperties: false").kind(),
            SchemaKind::Object
        );
        assert_eq!(
            schema("additionalProperties: {type: integer}").kind(),
            SchemaKind::Map
        );
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            schema("type: object\nallOf:\n  - {type: object}").kind(),
            SchemaKind::Composition
        );
        assert_eq!(
            schema("anyOf:\n  - {type: string}\n  - {type: integer}").kind(),
            SchemaKind::Union
        );
        assert_eq!(schema("type: string\nenum: [a, b]").kind(), SchemaKind::Enum);
        assert_eq!(schema("const: fixed").kind(), SchemaKind::Enum);
    }

    #[test]
    fn test_nullable_type_set() {
        let s = schema("type: [string, 'null']");
        assert_eq!(s.kind(), SchemaKind::String);
        assert!(s.is_nullable());
        assert!(schema("type: integer\nnullable: true").is_nullable());
        assert!(!schema("type: integer").is_nullable());
    }

    #[test]
    fn test_untyped_is_any() {
        assert_eq!(schema("description: anything").kind(), SchemaKind::Any);
        assert_eq!(schema("type: [string, integer]").kind(), SchemaKind::Any);
    }
}
