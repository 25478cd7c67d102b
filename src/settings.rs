use serde_json::{Map, Value};

/// A settings value that should have been an integer but wasn't.
#[derive(Debug, thiserror::Error, PartialEq)]
#[error("value is not a valid number: {key} = {raw}")]
pub struct InvalidNumber {
    pub key: String,
    pub raw: String,
}

pub fn get_str<'a>(v: &'a Map<String, Value>, k: &str) -> Option<&'a str> {
    v.get(k)?.as_str()
}

/// `Ok(None)` when the key is absent or blank; numbers and numeric strings
/// are accepted, anything else is an error.
pub fn get_i64(v: &Map<String, Value>, k: &str) -> Result<Option<i64>, InvalidNumber> {
    let parsed = match v.get(k) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        Some(_) => None,
    };
    parsed.map(Some).ok_or_else(|| invalid(v, k))
}

pub fn get_u64(v: &Map<String, Value>, k: &str) -> Result<Option<u64>, InvalidNumber> {
    let parsed = match v.get(k) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        Some(_) => None,
    };
    parsed.map(Some).ok_or_else(|| invalid(v, k))
}

fn invalid(v: &Map<String, Value>, k: &str) -> InvalidNumber {
    InvalidNumber {
        key: k.to_string(),
        raw: v.get(k).map(Value::to_string).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn numbers_and_numeric_strings() {
        let m = map(json!({ "a": 5, "b": " -3 ", "c": "" }));
        assert_eq!(get_i64(&m, "a"), Ok(Some(5)));
        assert_eq!(get_i64(&m, "b"), Ok(Some(-3)));
        assert_eq!(get_i64(&m, "c"), Ok(None));
        assert_eq!(get_i64(&m, "missing"), Ok(None));
    }

    #[test]
    fn garbage_is_invalid() {
        let m = map(json!({ "a": "abc", "b": 1.5, "c": true }));
        for k in ["a", "b", "c"] {
            assert_eq!(get_i64(&m, k).unwrap_err().key, k);
        }
        assert_eq!(
            get_i64(&m, "a").unwrap_err().to_string(),
            "value is not a valid number: a = \"abc\""
        );
    }

    #[test]
    fn negative_is_not_a_duration() {
        let m = map(json!({ "ms": -1, "ok": "750" }));
        assert!(get_u64(&m, "ms").is_err());
        assert_eq!(get_u64(&m, "ok"), Ok(Some(750)));
    }
}
