//! Typed field descriptors mapping a config struct onto a Vault payload.
//!
//! Each resource declares a table of [`Field`]s. Encoding walks the table and
//! only emits fields that are present; decoding starts from `C::default()` so
//! a read fully replaces whatever was stored before.

use crate::vault::VaultError;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

pub type Encode<C> = fn(&C) -> Option<Value>;
pub type Decode<C> = fn(&mut C, Option<&Value>) -> Result<(), VaultError>;

pub struct Field<C> {
    /// Attribute name in the declarative schema.
    pub name: &'static str,
    /// Key in the Vault request/response body.
    pub key: &'static str,
    pub encode: Encode<C>,
    pub decode: Decode<C>,
}

impl<C> Field<C> {
    pub fn new(name: &'static str, key: &'static str, encode: Encode<C>, decode: Decode<C>) -> Self {
        Self {
            name,
            key,
            encode,
            decode,
        }
    }
}

pub fn encode_payload<C>(fields: &[Field<C>], config: &C) -> Map<String, Value> {
    let mut payload = Map::new();
    for field in fields {
        if let Some(value) = (field.encode)(config) {
            payload.insert(field.key.to_string(), value);
        }
    }
    payload
}

pub fn decode_data<C: Default>(fields: &[Field<C>], data: &Map<String, Value>) -> Result<C, VaultError> {
    let mut config = C::default();
    for field in fields {
        (field.decode)(&mut config, data.get(field.key))?;
    }
    Ok(config)
}

pub fn encode_string(value: &str) -> Option<Value> {
    Some(Value::String(value.to_string()))
}

pub fn decode_string(key: &str, value: Option<&Value>) -> Result<Option<String>, VaultError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(unexpected(key, "a string", other)),
    }
}

/// `None` is omitted; a present set, even an empty one, is sent as an array.
pub fn encode_string_set(set: &Option<BTreeSet<String>>) -> Option<Value> {
    set.as_ref()
        .map(|items| Value::Array(items.iter().cloned().map(Value::String).collect()))
}

pub fn decode_string_set(
    key: &str,
    value: Option<&Value>,
) -> Result<Option<BTreeSet<String>>, VaultError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| unexpected(key, "a list of strings", item))
            })
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Some),
        Some(other) => Err(unexpected(key, "a list of strings", other)),
    }
}

pub fn encode_string_map(map: &Option<BTreeMap<String, String>>) -> Option<Value> {
    map.as_ref().map(|m| {
        Value::Object(
            m.iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        )
    })
}

/// Decodes an object whose scalar values are stringified.
pub fn decode_string_map(
    key: &str,
    value: Option<&Value>,
) -> Result<Option<BTreeMap<String, String>>, VaultError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(
            map.iter()
                .map(|(k, v)| (k.clone(), stringify(v)))
                .collect(),
        )),
        Some(other) => Err(unexpected(key, "an object", other)),
    }
}

pub fn decode_u64(key: &str, value: Option<&Value>) -> Result<Option<u64>, VaultError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| unexpected(key, "a non-negative integer", &Value::Number(n.clone()))),
        Some(other) => Err(unexpected(key, "a non-negative integer", other)),
    }
}

/// Renders a JSON scalar the way it would appear in a string map.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn unexpected(key: &str, expected: &str, got: &Value) -> VaultError {
    VaultError::Parse(format!("expected {:?} to be {}, got {}", key, expected, got))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, PartialEq)]
    struct Sample {
        name: String,
        ids: Option<BTreeSet<String>>,
    }

    fn fields() -> [Field<Sample>; 2] {
        [
            Field::new(
                "name",
                "name",
                |c: &Sample| encode_string(&c.name),
                |c: &mut Sample, v: Option<&Value>| {
                    c.name = decode_string("name", v)?.unwrap_or_default();
                    Ok(())
                },
            ),
            Field::new(
                "ids",
                "member_ids",
                |c: &Sample| encode_string_set(&c.ids),
                |c: &mut Sample, v: Option<&Value>| {
                    c.ids = decode_string_set("member_ids", v)?;
                    Ok(())
                },
            ),
        ]
    }

    #[test]
    fn test_absent_set_is_omitted() {
        let sample = Sample {
            name: "x".to_string(),
            ids: None,
        };
        let payload = encode_payload(&fields(), &sample);
        assert_eq!(Value::Object(payload), json!({"name": "x"}));
    }

    #[test]
    fn test_present_empty_set_is_sent() {
        let sample = Sample {
            name: "x".to_string(),
            ids: Some(BTreeSet::new()),
        };
        let payload = encode_payload(&fields(), &sample);
        assert_eq!(payload.get("member_ids"), Some(&json!([])));
    }

    #[test]
    fn test_decode_replaces_and_dedups() {
        let data = json!({"name": "x", "member_ids": ["b", "a", "b"]});
        let decoded: Sample = decode_data(&fields(), data.as_object().unwrap()).unwrap();
        let ids: Vec<_> = decoded.ids.unwrap().into_iter().collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_decode_null_set_is_none() {
        let data = json!({"name": "x", "member_ids": null});
        let decoded: Sample = decode_data(&fields(), data.as_object().unwrap()).unwrap();
        assert_eq!(decoded.ids, None);
    }

    #[test]
    fn test_decode_rejects_non_string_members() {
        let data = json!({"name": "x", "member_ids": [1]});
        let err = decode_data::<Sample>(&fields(), data.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, VaultError::Parse(_)));
    }

    #[test]
    fn test_string_map_stringifies_scalars() {
        let decoded = decode_string_map("data", Some(&json!({"a": "b", "n": 1, "t": true})))
            .unwrap()
            .unwrap();
        assert_eq!(decoded["n"], "1");
        assert_eq!(decoded["t"], "true");
        assert_eq!(decoded["a"], "b");
    }
}
