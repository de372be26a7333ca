//! Flat key/value request parameters

use serde_json::Value;

use crate::error::{AuthError, AuthResult};

/// Ordered request parameters
///
/// Values may be absent; absent entries are dropped when the parameters
/// are encoded. Setting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, Option<String>)>,
}

impl Params {
    /// Create empty parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a present value
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.set(key, Some(value.to_string()));
        self
    }

    /// Add a value that may be absent
    pub fn with_opt<V: ToString>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        self.set(key, value.map(|v| v.to_string()));
        self
    }

    /// Insert or replace a value
    pub fn set(&mut self, key: impl Into<String>, value: Option<String>) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Look up a value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Number of entries, absent ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose value is present, in insertion order
    pub fn present(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter_map(|(k, v)| v.as_deref().map(|v| (k.as_str(), v)))
    }

    /// Encode present entries as `application/x-www-form-urlencoded`
    pub fn to_urlencoded(&self) -> AuthResult<String> {
        let pairs: Vec<(&str, &str)> = self.present().collect();
        serde_urlencoded::to_string(pairs).map_err(|e| AuthError::Encode(e.to_string()))
    }

    /// Build parameters from a JSON object
    ///
    /// `null` values become absent entries, strings are taken verbatim and
    /// any other value uses its JSON text.
    pub fn from_json(value: Value) -> AuthResult<Self> {
        let map = match value {
            Value::Object(map) => map,
            other => return Err(AuthError::NotAMapping(json_type(&other).to_string())),
        };

        let mut params = Self::new();
        for (key, value) in map {
            let value = match value {
                Value::Null => None,
                Value::String(s) => Some(s),
                other => Some(other.to_string()),
            };
            params.set(key, value);
        }
        Ok(params)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.set(key, Some(value.to_string()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_values_are_skipped() {
        let params = Params::new()
            .with("a", 1)
            .with_opt::<String>("b", None)
            .with_opt("c", Some(true));

        assert_eq!(params.len(), 3);
        assert_eq!(params.to_urlencoded().unwrap(), "a=1&c=true");
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut params = Params::new().with("x", 1).with("y", 2);
        params.set("x", Some("3".to_string()));

        assert_eq!(params.to_urlencoded().unwrap(), "x=3&y=2");
    }

    #[test]
    fn test_encoding_escapes_values() {
        let params = Params::new().with("address", "a b&c=d");
        assert_eq!(params.to_urlencoded().unwrap(), "address=a+b%26c%3Dd");
    }

    #[test]
    fn test_from_json_object() {
        let params = Params::from_json(json!({"amount": 10, "price": "100.5", "limit_price": null}))
            .unwrap();

        assert_eq!(params.get("amount"), Some("10"));
        assert_eq!(params.get("price"), Some("100.5"));
        assert_eq!(params.get("limit_price"), None);
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_from_json_rejects_non_mapping() {
        assert!(matches!(
            Params::from_json(json!([1, 2])),
            Err(AuthError::NotAMapping(kind)) if kind == "array"
        ));
        assert!(Params::from_json(json!("amount=1")).is_err());
    }

    #[test]
    fn test_empty_params_encode_to_empty_string() {
        assert_eq!(Params::new().to_urlencoded().unwrap(), "");
    }
}
