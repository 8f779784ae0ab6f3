// src/utils/serialization.rs
//! Serialization utilities.
//!
//! Provides the JSON conversions used to turn credential structs into EIP-712
//! messages, and the ordered shallow merge used to layer caller-supplied proof
//! fields over computed defaults.

use crate::error::{CredentialError, Result};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

/// Serializes a value into a JSON object.
///
/// # Errors
/// - `Serialization` if serde fails
/// - `NotAnObject` if the value serializes to anything but an object
pub fn to_object<T: Serialize>(data: &T, type_name: &str) -> Result<Map<String, Value>> {
    match serde_json::to_value(data)? {
        Value::Object(map) => Ok(map),
        _ => Err(CredentialError::NotAnObject(type_name.to_string())),
    }
}

/// Deserializes a value from a JSON object.
pub fn from_object<T: DeserializeOwned>(object: Map<String, Value>) -> Result<T> {
    serde_json::from_value(Value::Object(object)).map_err(Into::into)
}

/// Shallow-merges `layers` in order: every key of a later layer replaces the
/// same key of an earlier one. Nested objects are replaced, not merged.
pub fn merge_objects<'a, I>(layers: I) -> Map<String, Value>
where
    I: IntoIterator<Item = &'a Map<String, Value>>,
{
    let mut merged = Map::new();
    for layer in layers {
        for (key, value) in layer {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}
