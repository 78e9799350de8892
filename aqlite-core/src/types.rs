use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Default service port of a cluster node
pub const DEFAULT_PORT: u16 = 3000;

/// Bin name the generated or resolved user key is written back to
pub const PK_BIN: &str = "PK";

/// Typed bin value as stored by the cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// UTF-8 string
    Str(String),
    /// 64-bit signed integer
    Int(i64),
    /// Double precision float
    Float(f64),
    /// Boolean
    Bool(bool),
    /// Raw bytes
    Blob(Vec<u8>),
    /// Ordered list
    List(Vec<Value>),
    /// String-keyed map
    Map(BTreeMap<String, Value>),
    /// Absent value
    Nil,
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn int(n: i64) -> Self {
        Value::Int(n)
    }

    pub fn float(f: f64) -> Self {
        Value::Float(f)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Name of the runtime type, as shown in operator messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "String",
            Value::Int(_) => "Integer",
            Value::Float(_) => "Double",
            Value::Bool(_) => "Boolean",
            Value::Blob(_) => "Blob",
            Value::List(_) => "List",
            Value::Map(_) => "Map",
            Value::Nil => "Nil",
        }
    }

    /// Convert from a JSON value (used for seed files and JSON output round trips)
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => Value::Str(s.clone()),
            serde_json::Value::Array(items) => Value::List(items.iter().map(Value::from_json).collect()),
            serde_json::Value::Object(obj) => Value::Map(
                obj.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert to a JSON value
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::Int(n) => serde_json::Value::from(*n),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Blob(bytes) => serde_json::Value::Array(
                bytes.iter().map(|b| serde_json::Value::from(*b)).collect(),
            ),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Nil => serde_json::Value::Null,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{}", s),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Blob(bytes) => write!(f, "<Blob {} bytes>", bytes.len()),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Value::Map(map) => {
                let parts: Vec<String> = map.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
            Value::Nil => write!(f, "null"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Bins of one record - a map of bin names to values
pub type Bins = HashMap<String, Value>;

/// Record address: namespace + set + user key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Key {
    pub namespace: String,
    pub set: String,
    pub user_key: String,
}

impl Key {
    pub fn new(namespace: impl Into<String>, set: impl Into<String>, user_key: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            set: set.into(),
            user_key: user_key.into(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.namespace, self.set, self.user_key)
    }
}

/// Record as returned by the store: key, bins and server-side metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub key: Key,
    pub bins: Bins,
    /// Write-version counter, bumped on every put
    pub generation: u32,
    /// Seconds until expiry, `None` = never expires
    pub ttl: Option<u32>,
}

impl Record {
    pub fn new(key: Key, bins: Bins) -> Self {
        Self {
            key,
            bins,
            generation: 1,
            ttl: None,
        }
    }

    /// TTL as the store reports it: `-1` for records that never expire
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.map(i64::from).unwrap_or(-1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::string("hello").as_str(), Some("hello"));
        assert_eq!(Value::int(42).as_int(), Some(42));
        assert_eq!(Value::float(1.5).as_float(), Some(1.5));
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::int(42).as_str(), None);
    }

    #[test]
    fn test_value_type_names() {
        assert_eq!(Value::int(1).type_name(), "Integer");
        assert_eq!(Value::float(1.0).type_name(), "Double");
        assert_eq!(Value::Bool(false).type_name(), "Boolean");
        assert_eq!(Value::string("x").type_name(), "String");
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::string("John Doe").to_string(), "John Doe");
        assert_eq!(Value::int(-7).to_string(), "-7");
        assert_eq!(Value::Blob(vec![1, 2, 3]).to_string(), "<Blob 3 bytes>");
        assert_eq!(
            Value::List(vec![Value::string("a"), Value::int(1)]).to_string(),
            "[a, 1]"
        );
        assert_eq!(Value::Nil.to_string(), "null");
    }

    #[test]
    fn test_value_json_conversion() {
        let json = serde_json::json!({"age": 30, "score": 1.5, "tags": ["a"], "ok": true});
        let value = Value::from_json(&json);
        let map = match &value {
            Value::Map(m) => m,
            other => panic!("Expected map, got {:?}", other),
        };
        assert_eq!(map["age"], Value::Int(30));
        assert_eq!(map["score"], Value::Float(1.5));
        assert_eq!(map["ok"], Value::Bool(true));
        assert_eq!(value.to_json(), json);
    }

    #[test]
    fn test_key_display() {
        let key = Key::new("test", "users", "u1");
        assert_eq!(key.to_string(), "test.users.u1");
    }

    #[test]
    fn test_record_ttl_seconds() {
        let mut record = Record::new(Key::new("test", "users", "u1"), Bins::new());
        assert_eq!(record.ttl_seconds(), -1);
        record.ttl = Some(3600);
        assert_eq!(record.ttl_seconds(), 3600);
    }
}
