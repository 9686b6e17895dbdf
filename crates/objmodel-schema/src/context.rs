//! Shared serialization context
//!
//! A [`Context`] is a reference-counted handle to a mutable key/value
//! mapping. Cloning the handle shares the mapping; [`Context::deep_clone`]
//! copies it. Individual reads and writes are atomic, sequences of them are
//! not.

use parking_lot::RwLock;
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct Context {
    inner: Arc<RwLock<JsonMap<String, JsonValue>>>,
}

impl Context {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context from a JSON value. Returns `None` unless it is an object.
    pub fn from_json(value: JsonValue) -> Option<Self> {
        match value {
            JsonValue::Object(map) => Some(Self::from(map)),
            _ => None,
        }
    }

    /// Builder-style insert
    pub fn with<K: Into<String>, V: Into<JsonValue>>(self, key: K, value: V) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<JsonValue> {
        self.inner.read().get(key).cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.read().contains_key(key)
    }

    pub fn insert<K: Into<String>, V: Into<JsonValue>>(&self, key: K, value: V) -> Option<JsonValue> {
        self.inner.write().insert(key.into(), value.into())
    }

    pub fn remove(&self, key: &str) -> Option<JsonValue> {
        self.inner.write().remove(key)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> JsonMap<String, JsonValue> {
        self.inner.read().clone()
    }

    /// Independent context with the same contents
    pub fn deep_clone(&self) -> Self {
        Self::from(self.snapshot())
    }

    /// Whether both handles share the same underlying mapping
    pub fn ptr_eq(&self, other: &Context) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl From<JsonMap<String, JsonValue>> for Context {
    fn from(map: JsonMap<String, JsonValue>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.snapshot() == other.snapshot()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Context").field(&*self.inner.read()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clone_shares_mapping() {
        let context = Context::new().with("value", "foo");
        let shared = context.clone();
        shared.insert("value", "bar");
        assert_eq!(context.get("value"), Some(json!("bar")));
        assert!(context.ptr_eq(&shared));
    }

    #[test]
    fn test_deep_clone_is_independent() {
        let context = Context::new().with("value", "foo");
        let copy = context.deep_clone();
        copy.insert("value", "bar");
        assert_eq!(context.get("value"), Some(json!("foo")));
        assert!(!context.ptr_eq(&copy));
    }

    #[test]
    fn test_from_json_requires_object() {
        assert!(Context::from_json(json!({"a": 1})).is_some());
        assert!(Context::from_json(json!([1, 2])).is_none());
    }
}
