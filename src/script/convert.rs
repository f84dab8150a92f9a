// src/script/convert.rs — JSON <-> Rhai Dynamic conversion
//
// Event payloads live as JSON object maps on the host side and as Rhai
// maps inside scripts. Conversion is lossy only for JSON numbers outside
// i64/f64 range.

use rhai::Dynamic;
use serde_json::Value;

/// Convert a JSON value to a Rhai `Dynamic`.
pub fn json_to_dynamic(value: &Value) -> Dynamic {
    match value {
        Value::Null => Dynamic::UNIT,
        Value::Bool(b) => Dynamic::from(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Dynamic::from(i)
            } else if let Some(f) = n.as_f64() {
                Dynamic::from(f)
            } else {
                Dynamic::UNIT
            }
        }
        Value::String(s) => Dynamic::from(s.clone()),
        Value::Array(arr) => {
            let rhai_arr: Vec<Dynamic> = arr.iter().map(json_to_dynamic).collect();
            Dynamic::from(rhai_arr)
        }
        Value::Object(obj) => {
            let mut map = rhai::Map::new();
            for (k, v) in obj {
                map.insert(k.clone().into(), json_to_dynamic(v));
            }
            Dynamic::from(map)
        }
    }
}

/// Convert a JSON object map to a Rhai map `Dynamic`.
pub fn map_to_dynamic(map: &serde_json::Map<String, Value>) -> Dynamic {
    let mut rhai_map = rhai::Map::new();
    for (k, v) in map {
        rhai_map.insert(k.clone().into(), json_to_dynamic(v));
    }
    Dynamic::from(rhai_map)
}

/// Convert a Rhai `Dynamic` to a JSON value. Types with no JSON
/// representation fall back to their display form.
pub fn dynamic_to_json(value: &Dynamic) -> Value {
    if value.is_unit() {
        Value::Null
    } else if value.is::<bool>() {
        Value::Bool(value.as_bool().unwrap_or_default())
    } else if value.is::<rhai::INT>() {
        Value::from(value.as_int().unwrap_or_default())
    } else if value.is::<rhai::FLOAT>() {
        serde_json::Number::from_f64(value.as_float().unwrap_or_default())
            .map(Value::Number)
            .unwrap_or(Value::Null)
    } else if value.is::<rhai::ImmutableString>() {
        Value::String(value.clone().into_string().unwrap_or_default())
    } else if value.is::<rhai::Array>() {
        let arr = value.clone().cast::<rhai::Array>();
        Value::Array(arr.iter().map(dynamic_to_json).collect())
    } else if value.is::<rhai::Map>() {
        let map = value.clone().cast::<rhai::Map>();
        Value::Object(
            map.iter()
                .map(|(k, v)| (k.to_string(), dynamic_to_json(v)))
                .collect(),
        )
    } else {
        Value::String(value.to_string())
    }
}

/// Convert a Rhai `Dynamic` to a JSON object map. Returns `None` when the
/// value is not a map.
pub fn dynamic_to_map(value: &Dynamic) -> Option<serde_json::Map<String, Value>> {
    if !value.is::<rhai::Map>() {
        return None;
    }
    match dynamic_to_json(value) {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_json_to_dynamic_primitives() {
        assert!(json_to_dynamic(&serde_json::json!(null)).is_unit());
        assert!(json_to_dynamic(&serde_json::json!(true)).as_bool().unwrap());
        assert_eq!(json_to_dynamic(&serde_json::json!(42)).as_int().unwrap(), 42);
        assert_eq!(
            json_to_dynamic(&serde_json::json!("hi")).into_string().unwrap(),
            "hi"
        );
    }

    #[test]
    fn test_json_to_dynamic_object() {
        let d = json_to_dynamic(&serde_json::json!({"key": "value", "num": 7}));
        let map = d.cast::<rhai::Map>();
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_dynamic_to_json_primitives() {
        assert_eq!(dynamic_to_json(&Dynamic::UNIT), Value::Null);
        assert_eq!(dynamic_to_json(&Dynamic::from(true)), Value::Bool(true));
        assert_eq!(dynamic_to_json(&Dynamic::from(9_i64)), serde_json::json!(9));
        assert_eq!(
            dynamic_to_json(&Dynamic::from("text".to_string())),
            serde_json::json!("text")
        );
    }

    #[test]
    fn test_roundtrip_nested() {
        let original = serde_json::json!({
            "from": "alice@example.com",
            "flags": [1, 2, 3],
            "meta": {"seen": false, "score": 0.5}
        });
        let roundtripped = dynamic_to_json(&json_to_dynamic(&original));
        assert_eq!(roundtripped, original);
    }

    #[test]
    fn test_dynamic_to_map_rejects_non_map() {
        assert!(dynamic_to_map(&Dynamic::from(3_i64)).is_none());
        assert!(dynamic_to_map(&Dynamic::UNIT).is_none());

        let map = json_to_dynamic(&serde_json::json!({"a": 1}));
        let obj = dynamic_to_map(&map).unwrap();
        assert_eq!(obj["a"], 1);
    }
}
