//! Validation error types for schema load, validate and dump

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Key under which schema-level (not field-specific) messages are stored
pub const SCHEMA_KEY: &str = "_schema";

/// Structured error detail.
///
/// Field errors map a field name (or an item index for bulk loads) to either
/// a list of messages or the nested detail of a sub-schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ErrorMessages {
    Messages(Vec<String>),
    Nested(IndexMap<String, ErrorMessages>),
}

impl ErrorMessages {
    /// A single message
    pub fn message<M: Into<String>>(message: M) -> Self {
        Self::Messages(vec![message.into()])
    }

    /// An empty mapping (the "valid" result of `validate`)
    pub fn empty() -> Self {
        Self::Nested(IndexMap::new())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Messages(messages) => messages.is_empty(),
            Self::Nested(map) => map.is_empty(),
        }
    }

    /// Number of entries at the top level
    pub fn len(&self) -> usize {
        match self {
            Self::Messages(messages) => messages.len(),
            Self::Nested(map) => map.len(),
        }
    }

    /// Nested detail for a field or index
    pub fn get(&self, key: &str) -> Option<&ErrorMessages> {
        match self {
            Self::Nested(map) => map.get(key),
            Self::Messages(_) => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterate top-level keys of a mapping
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        let map = match self {
            Self::Nested(map) => Some(map),
            Self::Messages(_) => None,
        };
        map.into_iter().flat_map(|m| m.keys().map(String::as_str))
    }

    /// Turn a bare message list into `{"_schema": [...]}`
    pub fn normalized(self) -> Self {
        match self {
            Self::Messages(messages) => {
                let mut map = IndexMap::new();
                map.insert(SCHEMA_KEY.to_string(), Self::Messages(messages));
                Self::Nested(map)
            }
            nested => nested,
        }
    }

    /// Merge another set of messages into this one
    pub fn merge(&mut self, other: ErrorMessages) {
        match other {
            Self::Messages(theirs) => match self {
                Self::Messages(ours) => ours.extend(theirs),
                Self::Nested(ours) => store(ours, SCHEMA_KEY.to_string(), Self::Messages(theirs)),
            },
            Self::Nested(theirs) => {
                if let Self::Messages(_) = self {
                    let ours = std::mem::replace(self, Self::empty());
                    *self = ours.normalized();
                }
                if let Self::Nested(ours) = self {
                    for (key, value) in theirs {
                        store(ours, key, value);
                    }
                }
            }
        }
    }

    /// Flatten into `(dotted path, messages)` pairs
    pub fn flatten(&self) -> Vec<(String, Vec<String>)> {
        let mut out = Vec::new();
        self.flatten_into(String::new(), &mut out);
        out
    }

    fn flatten_into(&self, prefix: String, out: &mut Vec<(String, Vec<String>)>) {
        match self {
            Self::Messages(messages) => {
                let path = if prefix.is_empty() { SCHEMA_KEY.to_string() } else { prefix };
                out.push((path, messages.clone()));
            }
            Self::Nested(map) => {
                for (key, value) in map {
                    let path = if prefix.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", prefix, key)
                    };
                    value.flatten_into(path, out);
                }
            }
        }
    }
}

/// Insert into an error mapping, merging with what is already there
pub(crate) fn store(map: &mut IndexMap<String, ErrorMessages>, key: String, value: ErrorMessages) {
    match map.get_mut(&key) {
        Some(existing) => existing.merge(value),
        None => {
            map.insert(key, value);
        }
    }
}

/// Validation failure carrying structured per-field detail
#[derive(Debug, Clone, PartialEq, Error)]
pub struct ValidationError {
    messages: ErrorMessages,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed")?;
        for (i, (path, messages)) in self.messages.flatten().iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}{}: {}", sep, path, messages.join(" "))?;
        }
        Ok(())
    }
}

impl ValidationError {
    /// Create a validation error with a single message
    pub fn new<M: Into<String>>(message: M) -> Self {
        Self {
            messages: ErrorMessages::message(message),
        }
    }

    /// Create a validation error for one field
    pub fn for_field<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        let mut map = IndexMap::new();
        map.insert(field.into(), ErrorMessages::message(message));
        Self {
            messages: ErrorMessages::Nested(map),
        }
    }

    /// Create a schema-level error (`{"_schema": [message]}`)
    pub fn schema_level<M: Into<String>>(message: M) -> Self {
        Self::for_field(SCHEMA_KEY, message)
    }

    pub fn from_messages(messages: ErrorMessages) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &ErrorMessages {
        &self.messages
    }

    pub fn into_messages(self) -> ErrorMessages {
        self.messages
    }

    /// Whether the error names the given top-level field
    pub fn contains_field(&self, field: &str) -> bool {
        self.messages.contains_key(field)
    }

    /// All `(dotted path, messages)` pairs
    pub fn flatten(&self) -> Vec<(String, Vec<String>)> {
        self.messages.flatten()
    }
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Errors raised while deriving a schema
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A method field names a method the schema does not define
    #[error("Field '{field}' of {schema} references undefined method '{method}'")]
    MissingMethod {
        schema: String,
        field: String,
        method: String,
    },

    /// The owner back-reference can only be bound once
    #[error("Schema {schema} is already bound to an owner")]
    OwnerAlreadyBound { schema: String },

    /// Anything else wrong with a definition
    #[error("Invalid schema definition for {schema}: {reason}")]
    InvalidDefinition { schema: String, reason: String },
}

impl SchemaError {
    pub fn invalid_definition<S: Into<String>, R: Into<String>>(schema: S, reason: R) -> Self {
        Self::InvalidDefinition {
            schema: schema.into(),
            reason: reason.into(),
        }
    }
}
