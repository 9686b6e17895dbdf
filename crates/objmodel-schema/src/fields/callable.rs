//! Fields computed by schema methods or closures
//!
//! Both kinds serialize from the whole object, so they are emitted even
//! when the object has no attribute of the field's name.

use super::{DumpContext, DumpSource, FieldKind, LoadContext};
use crate::context::Context;
use crate::error::{ErrorMessages, ValidationError};
use crate::value::{Attributes, Value};
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;

/// Computes an output value from the whole object
pub type SerializeFn =
    Arc<dyn Fn(&dyn Attributes, &Context) -> Result<JsonValue, ValidationError> + Send + Sync>;

/// Converts an input value
pub type DeserializeFn = Arc<dyn Fn(Value, &Context) -> Result<Value, ValidationError> + Send + Sync>;

/// A named method defined on a schema
#[derive(Clone)]
pub enum SchemaMethod {
    Serialize(SerializeFn),
    Deserialize(DeserializeFn),
}

impl SchemaMethod {
    pub fn serialize<F>(f: F) -> Self
    where
        F: Fn(&dyn Attributes, &Context) -> Result<JsonValue, ValidationError> + Send + Sync + 'static,
    {
        SchemaMethod::Serialize(Arc::new(f))
    }

    pub fn deserialize<F>(f: F) -> Self
    where
        F: Fn(Value, &Context) -> Result<Value, ValidationError> + Send + Sync + 'static,
    {
        SchemaMethod::Deserialize(Arc::new(f))
    }

    pub fn role(&self) -> MethodRole {
        match self {
            SchemaMethod::Serialize(_) => MethodRole::Serialize,
            SchemaMethod::Deserialize(_) => MethodRole::Deserialize,
        }
    }
}

impl fmt::Debug for SchemaMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SchemaMethod::{}", self.role())
    }
}

/// Which side of a method field a schema method serves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodRole {
    Serialize,
    Deserialize,
}

impl fmt::Display for MethodRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodRole::Serialize => write!(f, "serialize"),
            MethodRole::Deserialize => write!(f, "deserialize"),
        }
    }
}

/// Field calling named methods of its schema
#[derive(Debug, Clone)]
pub struct Method {
    serialize: Option<String>,
    deserialize: Option<String>,
}

impl Method {
    pub fn new(serialize: Option<&str>, deserialize: Option<&str>) -> Self {
        Self {
            serialize: serialize.map(str::to_string),
            deserialize: deserialize.map(str::to_string),
        }
    }

    pub fn serialize_name(&self) -> Option<&str> {
        self.serialize.as_deref()
    }

    pub fn deserialize_name(&self) -> Option<&str> {
        self.deserialize.as_deref()
    }
}

impl FieldKind for Method {
    fn name(&self) -> &'static str {
        "method"
    }

    fn deserialize(&self, value: Value, ctx: &LoadContext<'_>) -> Result<Value, ErrorMessages> {
        let Some(name) = &self.deserialize else {
            return Ok(value);
        };
        match ctx.schema.schema().method(name) {
            Some(SchemaMethod::Deserialize(f)) => {
                f(value, &ctx.context()).map_err(ValidationError::into_messages)
            }
            _ => Err(ErrorMessages::message(format!("Unknown method '{}'.", name))),
        }
    }

    fn serialize(&self, value: Value, _ctx: &DumpContext<'_>) -> Result<JsonValue, ErrorMessages> {
        value
            .to_json()
            .ok_or_else(|| ErrorMessages::message("Value cannot be serialized."))
    }

    fn dump_source(&self) -> DumpSource {
        DumpSource::Object
    }

    fn serialize_object(
        &self,
        obj: &dyn Attributes,
        ctx: &DumpContext<'_>,
    ) -> Result<Option<JsonValue>, ErrorMessages> {
        let Some(name) = &self.serialize else {
            return Ok(None);
        };
        match ctx.schema.schema().method(name) {
            Some(SchemaMethod::Serialize(f)) => f(obj, &ctx.context())
                .map(Some)
                .map_err(ValidationError::into_messages),
            _ => Err(ErrorMessages::message(format!("Unknown method '{}'.", name))),
        }
    }

    fn method_names(&self) -> Vec<(MethodRole, &str)> {
        let mut names = Vec::new();
        if let Some(name) = &self.serialize {
            names.push((MethodRole::Serialize, name.as_str()));
        }
        if let Some(name) = &self.deserialize {
            names.push((MethodRole::Deserialize, name.as_str()));
        }
        names
    }
}

/// Field calling closures directly
#[derive(Clone)]
pub struct Function {
    serialize: Option<SerializeFn>,
    deserialize: Option<DeserializeFn>,
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("serialize", &self.serialize.is_some())
            .field("deserialize", &self.deserialize.is_some())
            .finish()
    }
}

impl Function {
    pub fn new(serialize: Option<SerializeFn>, deserialize: Option<DeserializeFn>) -> Self {
        Self {
            serialize,
            deserialize,
        }
    }
}

impl FieldKind for Function {
    fn name(&self) -> &'static str {
        "function"
    }

    fn deserialize(&self, value: Value, ctx: &LoadContext<'_>) -> Result<Value, ErrorMessages> {
        match &self.deserialize {
            Some(f) => f(value, &ctx.context()).map_err(ValidationError::into_messages),
            None => Ok(value),
        }
    }

    fn serialize(&self, value: Value, _ctx: &DumpContext<'_>) -> Result<JsonValue, ErrorMessages> {
        value
            .to_json()
            .ok_or_else(|| ErrorMessages::message("Value cannot be serialized."))
    }

    fn dump_source(&self) -> DumpSource {
        DumpSource::Object
    }

    fn serialize_object(
        &self,
        obj: &dyn Attributes,
        ctx: &DumpContext<'_>,
    ) -> Result<Option<JsonValue>, ErrorMessages> {
        match &self.serialize {
            Some(f) => f(obj, &ctx.context())
                .map(Some)
                .map_err(ValidationError::into_messages),
            None => Ok(None),
        }
    }
}
