//! OpenAPI parameter styles.
//!
//! Encoding works on any `serde_json::Value`. Decoding needs a
//! [`ParamShape`] because a wire string alone does not say whether `1` is a
//! number or text. The client encoder and the server decoder follow the same
//! table:
//!
//! | style      | explode | scalar | array          | object             |
//! |------------|---------|--------|----------------|--------------------|
//! | simple     | false   | `v`    | `a,b`          | `k,v,k2,v2`        |
//! | simple     | true    | `v`    | `a,b`          | `k=v,k2=v2`        |
//! | form       | false   | `n=v`  | `n=a,b`        | `n=k,v,k2,v2`      |
//! | form       | true    | `n=v`  | `n=a&n=b`      | `k=v&k2=v2`        |
//! | deepObject | true    |        |                | `n[k]=v&n[k2]=v2`  |

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};

use crate::error::{BuildError, StyleError};
use crate::query::{FormPairs, encode_path_segment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Style {
    Simple,
    Form,
    DeepObject,
}

impl Style {
    pub fn as_str(self) -> &'static str {
        match self {
            Style::Simple => "simple",
            Style::Form => "form",
            Style::DeepObject => "deepObject",
        }
    }
}

/// Scalar type hint for decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    String,
    Integer,
    Number,
    Boolean,
    /// JSON numbers and booleans are recognized; anything else stays text,
    /// so the string `"3"` comes back as the number `3`.
    Any,
    /// Kept as text, for targets that pick their own reading (untagged unions).
    Text,
}

/// Structure of a parameter, as far as decoding needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamShape {
    Primitive(Primitive),
    Array(Primitive),
    Object {
        fields: &'static [(&'static str, ParamShape)],
        /// Value type of undeclared keys; `None` drops them.
        additional: Option<Primitive>,
    },
}

impl ParamShape {
    fn describe(self) -> &'static str {
        match self {
            ParamShape::Primitive(_) => "scalar",
            ParamShape::Array(_) => "array",
            ParamShape::Object { .. } => "object",
        }
    }
}

fn scalar_text(value: &Value, style: Style) -> Result<String, StyleError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        Value::Array(_) | Value::Object(_) => Err(StyleError::Unsupported {
            style: style.as_str(),
            kind: "nested value",
        }),
    }
}

fn join_scalars(items: &[Value], style: Style) -> Result<String, StyleError> {
    let parts = items
        .iter()
        .map(|item| scalar_text(item, style))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(parts.join(","))
}

/// Object entries as `k,v,k2,v2`, or `k=v,k2=v2` when exploded. Null entries are skipped.
fn join_entries(map: &Map<String, Value>, explode: bool, style: Style) -> Result<String, StyleError> {
    let mut parts = Vec::new();
    for (key, value) in map {
        if value.is_null() {
            continue;
        }
        let text = scalar_text(value, style)?;
        if explode {
            parts.push(format!("{key}={text}"));
        } else {
            parts.push(key.clone());
            parts.push(text);
        }
    }
    Ok(parts.join(","))
}

/// Render a value in `simple` style.
pub fn encode_simple(value: &Value, explode: bool) -> Result<String, StyleError> {
    match value {
        Value::Array(items) => join_scalars(items, Style::Simple),
        Value::Object(map) => join_entries(map, explode, Style::Simple),
        scalar => scalar_text(scalar, Style::Simple),
    }
}

/// Render a value as query pairs named `name`. Pairs are not yet percent-encoded.
pub fn encode_query(
    name: &str,
    style: Style,
    explode: bool,
    value: &Value,
) -> Result<Vec<(String, String)>, StyleError> {
    match style {
        Style::Simple => Ok(vec![(name.to_string(), encode_simple(value, explode)?)]),
        Style::Form => encode_form(name, explode, value),
        Style::DeepObject => {
            let Value::Object(map) = value else {
                return Err(StyleError::Unsupported {
                    style: style.as_str(),
                    kind: "non-object value",
                });
            };
            let mut pairs = Vec::new();
            encode_deep(name, map, &mut pairs)?;
            Ok(pairs)
        }
    }
}

fn encode_form(name: &str, explode: bool, value: &Value) -> Result<Vec<(String, String)>, StyleError> {
    let style = Style::Form;
    let mut pairs = Vec::new();
    match value {
        Value::Null => {}
        Value::Array(items) if explode => {
            for item in items {
                pairs.push((name.to_string(), scalar_text(item, style)?));
            }
        }
        Value::Array(items) => pairs.push((name.to_string(), join_scalars(items, style)?)),
        Value::Object(map) if explode => {
            for (key, value) in map {
                match value {
                    Value::Null => {}
                    Value::Array(items) => {
                        for item in items {
                            pairs.push((key.clone(), scalar_text(item, style)?));
                        }
                    }
                    other => pairs.push((key.clone(), scalar_text(other, style)?)),
                }
            }
        }
        Value::Object(map) => pairs.push((name.to_string(), join_entries(map, false, style)?)),
        scalar => pairs.push((name.to_string(), scalar_text(scalar, style)?)),
    }
    Ok(pairs)
}

fn encode_deep(
    prefix: &str,
    map: &Map<String, Value>,
    pairs: &mut Vec<(String, String)>,
) -> Result<(), StyleError> {
    for (key, value) in map {
        let key = format!("{prefix}[{key}]");
        match value {
            Value::Null => {}
            Value::Object(inner) => encode_deep(&key, inner, pairs)?,
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    let item_key = format!("{key}[{index}]");
                    match item {
                        Value::Object(inner) => encode_deep(&item_key, inner, pairs)?,
                        other => pairs.push((item_key, scalar_text(other, Style::DeepObject)?)),
                    }
                }
            }
            other => pairs.push((key, scalar_text(other, Style::DeepObject)?)),
        }
    }
    Ok(())
}

fn parse_primitive(raw: &str, primitive: Primitive) -> Result<Value, StyleError> {
    let invalid = |expected| StyleError::InvalidValue {
        value: raw.to_string(),
        expected,
    };
    match primitive {
        Primitive::String | Primitive::Text => Ok(Value::String(raw.to_string())),
        Primitive::Any => Ok(json_scalar(raw).unwrap_or_else(|| Value::String(raw.to_string()))),
        Primitive::Integer => raw
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| invalid("integer")),
        Primitive::Number => raw
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| invalid("number")),
        Primitive::Boolean => match raw {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(invalid("boolean")),
        },
    }
}

fn json_scalar(raw: &str) -> Option<Value> {
    if raw.trim() != raw {
        return None;
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ (Value::Number(_) | Value::Bool(_))) => Some(value),
        _ => None,
    }
}

/// Comma-separated items. Empty items are kept; only an empty value is an
/// empty list.
fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').filter(move |_| !raw.is_empty())
}

fn split_assignments(raw: &str, style: Style) -> Result<Map<String, Value>, StyleError> {
    let mut map = Map::new();
    for part in split_list(raw) {
        let (key, value) = part.split_once('=').ok_or_else(|| StyleError::Malformed {
            style: style.as_str(),
            value: raw.to_string(),
        })?;
        map.insert(key.to_string(), Value::String(value.to_string()));
    }
    Ok(map)
}

fn split_entries(raw: &str, style: Style) -> Result<Map<String, Value>, StyleError> {
    let parts: Vec<&str> = split_list(raw).collect();
    if parts.len() % 2 != 0 {
        return Err(StyleError::Malformed {
            style: style.as_str(),
            value: raw.to_string(),
        });
    }
    Ok(parts
        .chunks(2)
        .map(|pair| (pair[0].to_string(), Value::String(pair[1].to_string())))
        .collect())
}

/// Convert a tree of wire strings into typed JSON following `shape`.
fn coerce(value: Value, shape: ParamShape) -> Result<Value, StyleError> {
    match (shape, value) {
        (ParamShape::Primitive(Primitive::Any), Value::String(raw)) => {
            parse_primitive(&raw, Primitive::Any)
        }
        (ParamShape::Primitive(Primitive::Any | Primitive::Text), value) => Ok(value),
        (ParamShape::Primitive(primitive), Value::String(raw)) => parse_primitive(&raw, primitive),
        (ParamShape::Array(primitive), Value::String(raw)) => {
            Ok(Value::Array(vec![parse_primitive(&raw, primitive)?]))
        }
        (ParamShape::Array(primitive), Value::Array(items)) => items
            .into_iter()
            .map(|item| coerce(item, ParamShape::Primitive(primitive)))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        (ParamShape::Array(primitive), Value::Object(indexed)) => {
            let mut items = Vec::with_capacity(indexed.len());
            for (index, item) in indexed {
                let index = index.parse::<usize>().map_err(|_| StyleError::InvalidValue {
                    value: index.clone(),
                    expected: "array index",
                })?;
                items.push((index, coerce(item, ParamShape::Primitive(primitive))?));
            }
            items.sort_by_key(|(index, _)| *index);
            Ok(Value::Array(items.into_iter().map(|(_, item)| item).collect()))
        }
        (ParamShape::Object { fields, additional }, Value::Object(map)) => {
            let mut object = Map::new();
            for (key, value) in map {
                let field_shape = match fields.iter().find(|(name, _)| *name == key) {
                    Some((_, shape)) => *shape,
                    None => match additional {
                        Some(primitive) => ParamShape::Primitive(primitive),
                        None => continue,
                    },
                };
                object.insert(key, coerce(value, field_shape)?);
            }
            Ok(Value::Object(object))
        }
        (shape, value) => Err(StyleError::InvalidValue {
            value: value.to_string(),
            expected: shape.describe(),
        }),
    }
}

/// Read a `simple` style value.
pub fn decode_simple(raw: &str, explode: bool, shape: ParamShape) -> Result<Value, StyleError> {
    match shape {
        ParamShape::Primitive(primitive) => parse_primitive(raw, primitive),
        ParamShape::Array(primitive) => split_list(raw)
            .map(|part| parse_primitive(part, primitive))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        ParamShape::Object { .. } => {
            let map = if explode {
                split_assignments(raw, Style::Simple)?
            } else {
                split_entries(raw, Style::Simple)?
            };
            coerce(Value::Object(map), shape)
        }
    }
}

/// Read the parameter `name` back out of query (or cookie) pairs.
/// `None` means the parameter is absent.
pub fn decode_query(
    pairs: &FormPairs,
    name: &str,
    style: Style,
    explode: bool,
    shape: ParamShape,
) -> Result<Option<Value>, StyleError> {
    match style {
        Style::Simple => pairs
            .first(name)
            .map(|raw| decode_simple(raw, explode, shape))
            .transpose(),
        Style::Form => decode_form(pairs, name, explode, shape),
        Style::DeepObject => decode_deep(pairs, name, shape),
    }
}

fn decode_form(
    pairs: &FormPairs,
    name: &str,
    explode: bool,
    shape: ParamShape,
) -> Result<Option<Value>, StyleError> {
    match shape {
        ParamShape::Primitive(primitive) => pairs
            .first(name)
            .map(|raw| parse_primitive(raw, primitive))
            .transpose(),
        ParamShape::Array(primitive) => {
            if !pairs.contains(name) {
                return Ok(None);
            }
            let raw: Vec<&str> = if explode {
                pairs.all(name)
            } else {
                pairs.first(name).map(|r| split_list(r).collect()).unwrap_or_default()
            };
            raw.into_iter()
                .map(|part| parse_primitive(part, primitive))
                .collect::<Result<Vec<_>, _>>()
                .map(|items| Some(Value::Array(items)))
        }
        ParamShape::Object { .. } if !explode => pairs
            .first(name)
            .map(|raw| coerce(Value::Object(split_entries(raw, Style::Form)?), shape))
            .transpose(),
        ParamShape::Object { fields, additional } => {
            let mut map = Map::new();
            for (key, value) in pairs.iter() {
                let declared = fields.iter().find(|(field, _)| *field == key);
                let claimed = declared.is_some() || (additional.is_some() && !pairs.is_reserved(key));
                if !claimed {
                    continue;
                }
                match declared {
                    Some((_, ParamShape::Array(_))) => {
                        let entry = map
                            .entry(key.to_string())
                            .or_insert_with(|| Value::Array(Vec::new()));
                        if let Value::Array(items) = entry {
                            items.push(Value::String(value.to_string()));
                        }
                    }
                    _ => {
                        if !map.contains_key(key) {
                            map.insert(key.to_string(), Value::String(value.to_string()));
                        }
                    }
                }
            }
            if map.is_empty() {
                return Ok(None);
            }
            coerce(Value::Object(map), shape).map(Some)
        }
    }
}

fn decode_deep(pairs: &FormPairs, name: &str, shape: ParamShape) -> Result<Option<Value>, StyleError> {
    let prefix = format!("{name}[");
    let mut root = Map::new();
    let mut found = false;
    for (key, value) in pairs.iter() {
        let Some(rest) = key.strip_prefix(prefix.as_str()) else {
            continue;
        };
        let segments: Vec<&str> = rest
            .strip_suffix(']')
            .map(|inner| inner.split("][").collect())
            .ok_or_else(|| StyleError::Malformed {
                style: Style::DeepObject.as_str(),
                value: key.to_string(),
            })?;
        insert_path(&mut root, &segments, value)?;
        found = true;
    }
    if !found {
        return Ok(None);
    }
    coerce(Value::Object(root), shape).map(Some)
}

fn insert_path(map: &mut Map<String, Value>, segments: &[&str], value: &str) -> Result<(), StyleError> {
    match segments {
        [] => Ok(()),
        [last] => {
            map.insert((*last).to_string(), Value::String(value.to_string()));
            Ok(())
        }
        [head, rest @ ..] => {
            let entry = map
                .entry((*head).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            match entry {
                Value::Object(inner) => insert_path(inner, rest, value),
                _ => Err(StyleError::Malformed {
                    style: Style::DeepObject.as_str(),
                    value: (*head).to_string(),
                }),
            }
        }
    }
}

/// Serialize `value` and render it as query pairs for parameter `name`.
pub fn encode_query_param<T: Serialize + ?Sized>(
    name: &str,
    style: Style,
    explode: bool,
    value: &T,
) -> Result<Vec<(String, String)>, BuildError> {
    let value = serde_json::to_value(value)?;
    encode_query(name, style, explode, &value).map_err(|source| BuildError::Parameter {
        parameter: name.to_string(),
        source,
    })
}

/// Serialize `value` in `simple` style, as used for headers.
pub fn encode_simple_param<T: Serialize + ?Sized>(
    name: &str,
    explode: bool,
    value: &T,
) -> Result<String, BuildError> {
    let value = serde_json::to_value(value)?;
    encode_simple(&value, explode).map_err(|source| BuildError::Parameter {
        parameter: name.to_string(),
        source,
    })
}

/// `simple` style, percent-encoded for use as a path segment.
pub fn encode_path_param<T: Serialize + ?Sized>(
    name: &str,
    explode: bool,
    value: &T,
) -> Result<String, BuildError> {
    Ok(encode_path_segment(&encode_simple_param(name, explode, value)?))
}

/// Decode a JSON value produced by one of the decoders into `T`.
pub fn from_wire<T: DeserializeOwned>(value: Value) -> Result<T, StyleError> {
    Ok(serde_json::from_value(value)?)
}
