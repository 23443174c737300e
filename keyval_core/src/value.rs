use std::collections::HashMap;

/// A stored value: a scalar string or a field-keyed map of strings.
///
/// The variant is fixed when the key is first written and only changes when
/// the key is deleted and recreated, or overwritten whole by a scalar `set`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Hash(HashMap<String, String>),
}

impl Value {
    pub fn as_string(&self) -> Option<&String> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_hash(&self) -> Option<&HashMap<String, String>> {
        match self {
            Value::Hash(hash) => Some(hash),
            _ => None,
        }
    }

    pub fn as_hash_mut(&mut self) -> Option<&mut HashMap<String, String>> {
        match self {
            Value::Hash(hash) => Some(hash),
            _ => None,
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn is_hash(&self) -> bool {
        matches!(self, Value::Hash(_))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<HashMap<String, String>> for Value {
    fn from(hash: HashMap<String, String>) -> Self {
        Value::Hash(hash)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Hash(hash) => {
                let pairs: Vec<String> = hash.iter().map(|(k, v)| format!("\"{}\": \"{}\"", k, v)).collect();
                write!(f, "{{{}}}", pairs.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_value() {
        let value = Value::from("hello");
        assert!(value.is_string());
        assert!(!value.is_hash());
        assert_eq!(value.as_string(), Some(&"hello".to_string()));
        assert_eq!(value.as_hash(), None);
        assert_eq!(value.to_string(), "hello");
    }

    #[test]
    fn test_hash_value() {
        let mut hash = HashMap::new();
        hash.insert("field1".to_string(), "value1".to_string());

        let value = Value::from(hash.clone());
        assert!(value.is_hash());
        assert!(!value.is_string());
        assert_eq!(value.as_hash(), Some(&hash));
        assert_eq!(value.as_string(), None);
        assert_eq!(value.to_string(), "{\"field1\": \"value1\"}");
    }

    #[test]
    fn test_hash_field_mutation() {
        let mut value = Value::Hash(HashMap::new());
        value
            .as_hash_mut()
            .unwrap()
            .insert("f".to_string(), "v".to_string());
        assert_eq!(value.as_hash().unwrap().get("f"), Some(&"v".to_string()));

        let mut scalar = Value::from("s");
        assert!(scalar.as_hash_mut().is_none());
    }
}
