//! Split and merge helpers for objects that carry additional properties.
//!
//! Generated `Deserialize` impls read the wire object into a JSON map, take
//! each declared field out of it, and collect whatever remains. Generated
//! `Serialize` impls write declared fields first and then the open map.

use std::collections::BTreeMap;

use serde::de::{self, DeserializeOwned};
use serde::ser::{self, SerializeMap};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::FieldError;

/// Remove `key` and decode it. Absent and `null` both read as `None`.
pub fn take_field<T, E>(object: &mut Map<String, Value>, key: &str) -> Result<Option<T>, E>
where
    T: DeserializeOwned,
    E: de::Error,
{
    match object.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => decode(key, value).map(Some),
    }
}

/// Remove `key` and decode it, failing when it is absent.
pub fn take_required_field<T, E>(object: &mut Map<String, Value>, key: &str) -> Result<T, E>
where
    T: DeserializeOwned,
    E: de::Error,
{
    match object.remove(key) {
        Some(value) => decode(key, value),
        None => Err(E::custom(FieldError::Missing(key.to_string()))),
    }
}

/// Decode every remaining entry as an additional property.
pub fn collect_additional<T, E>(object: Map<String, Value>) -> Result<BTreeMap<String, T>, E>
where
    T: DeserializeOwned,
    E: de::Error,
{
    object
        .into_iter()
        .map(|(key, value)| {
            let decoded = decode(&key, value)?;
            Ok((key, decoded))
        })
        .collect()
}

/// Write the additional properties after the declared fields.
///
/// A key equal to one of `declared` would produce a duplicate key on the
/// wire and is rejected.
pub fn serialize_additional<M, V>(
    map: &mut M,
    additional: &BTreeMap<String, V>,
    declared: &[&str],
) -> Result<(), M::Error>
where
    M: SerializeMap,
    V: Serialize,
{
    for (key, value) in additional {
        if declared.contains(&key.as_str()) {
            return Err(ser::Error::custom(FieldError::Shadowed(key.clone())));
        }
        map.serialize_entry(key, value)?;
    }
    Ok(())
}

fn decode<T, E>(key: &str, value: Value) -> Result<T, E>
where
    T: DeserializeOwned,
    E: de::Error,
{
    serde_json::from_value(value).map_err(|source| {
        E::custom(FieldError::Invalid {
            key: key.to_string(),
            source,
        })
    })
}
