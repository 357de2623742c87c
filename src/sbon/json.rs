//! Conversions between SBON values and JSON
//!
//! Archive metadata is JSON-shaped in practice, so the bridge is handy
//! for tooling built on top of this crate. Key order is preserved in
//! both directions.

use super::{Value, ValueMap};
use crate::error::{Error, Result};

impl Value {
    /// Convert to a [`serde_json::Value`].
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] for non-finite doubles, which
    /// JSON cannot represent.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        match self {
            Value::Null => Ok(serde_json::Value::Null),
            Value::Double(value) => serde_json::Number::from_f64(*value)
                .map(serde_json::Value::Number)
                .ok_or_else(|| {
                    Error::InvalidArgument(format!("double {value} has no JSON representation"))
                }),
            Value::Bool(value) => Ok(serde_json::Value::Bool(*value)),
            Value::Int(value) => Ok(serde_json::Value::Number((*value).into())),
            Value::String(value) => Ok(serde_json::Value::String(value.clone())),
            Value::List(values) => Ok(serde_json::Value::Array(
                values
                    .iter()
                    .map(Value::to_json)
                    .collect::<Result<Vec<_>>>()?,
            )),
            Value::Map(map) => {
                let mut object = serde_json::Map::with_capacity(map.len());
                for (key, value) in map {
                    object.insert(key.clone(), value.to_json()?);
                }
                Ok(serde_json::Value::Object(object))
            }
        }
    }

    /// Build from a [`serde_json::Value`].
    ///
    /// Integral JSON numbers become [`Value::Int`]; everything else
    /// numeric becomes [`Value::Double`].
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] for unsigned numbers beyond
    /// `i64::MAX`.
    pub fn from_json(json: &serde_json::Value) -> Result<Value> {
        match json {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(value) => Ok(Value::Bool(*value)),
            serde_json::Value::Number(number) => {
                if let Some(value) = number.as_i64() {
                    Ok(Value::Int(value))
                } else if number.as_u64().is_some() {
                    Err(Error::InvalidArgument(format!(
                        "number {number} does not fit a signed 64-bit integer"
                    )))
                } else if let Some(value) = number.as_f64() {
                    Ok(Value::Double(value))
                } else {
                    Err(Error::InvalidArgument(format!(
                        "number {number} has no SBON representation"
                    )))
                }
            }
            serde_json::Value::String(value) => Ok(Value::String(value.clone())),
            serde_json::Value::Array(values) => Ok(Value::List(
                values
                    .iter()
                    .map(Value::from_json)
                    .collect::<Result<Vec<_>>>()?,
            )),
            serde_json::Value::Object(object) => {
                let mut map = ValueMap::with_capacity(object.len());
                for (key, value) in object {
                    map.insert(key.clone(), Value::from_json(value)?);
                }
                Ok(Value::Map(map))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_roundtrip() {
        let json: serde_json::Value = serde_json::from_str(
            r#"{ "priority": 9999999999, "name": "mod", "tags": ["a", "b"], "ratio": 0.5, "on": true, "gone": null }"#,
        )
        .unwrap();

        let value = Value::from_json(&json).unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map["priority"], Value::Int(9_999_999_999));
        assert_eq!(map["ratio"], Value::Double(0.5));
        let keys: Vec<_> = map.keys().collect();
        assert_eq!(keys, ["priority", "name", "tags", "ratio", "on", "gone"]);

        assert_eq!(value.to_json().unwrap(), json);
    }

    #[test]
    fn test_json_rejects_non_finite_double() {
        assert!(matches!(
            Value::Double(f64::NAN).to_json(),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_json_rejects_huge_unsigned() {
        let json = serde_json::json!(u64::MAX);
        assert!(matches!(
            Value::from_json(&json),
            Err(Error::InvalidArgument(_))
        ));
    }
}
