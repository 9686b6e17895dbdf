//! List and nested-schema field kinds

use super::{DumpContext, Field, FieldKind, LoadContext};
use crate::error::{ErrorMessages, ValidationError};
use crate::schema::Schema;
use crate::value::Value;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;

/// Homogeneous list; errors are keyed by item index
#[derive(Debug, Clone)]
pub struct List {
    inner: Field,
}

impl List {
    pub fn new(inner: Field) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &Field {
        &self.inner
    }
}

impl FieldKind for List {
    fn name(&self) -> &'static str {
        "list"
    }

    fn deserialize(&self, value: Value, ctx: &LoadContext<'_>) -> Result<Value, ErrorMessages> {
        let Value::List(items) = value else {
            return Err(ErrorMessages::message("Not a valid list."));
        };
        let mut out = Vec::with_capacity(items.len());
        let mut errors = IndexMap::new();
        for (index, item) in items.into_iter().enumerate() {
            match self.inner.deserialize_value(item, ctx) {
                Ok(value) => out.push(value),
                Err(messages) => {
                    errors.insert(index.to_string(), messages);
                }
            }
        }
        if errors.is_empty() {
            Ok(Value::List(out))
        } else {
            Err(ErrorMessages::Nested(errors))
        }
    }

    fn serialize(&self, value: Value, ctx: &DumpContext<'_>) -> Result<JsonValue, ErrorMessages> {
        let Value::List(items) = value else {
            return Err(ErrorMessages::message("Not a valid list."));
        };
        let mut out = Vec::with_capacity(items.len());
        let mut errors = IndexMap::new();
        for (index, item) in items.into_iter().enumerate() {
            match self.inner.serialize_value(item, ctx) {
                Ok(json) => out.push(json),
                Err(messages) => {
                    errors.insert(index.to_string(), messages);
                }
            }
        }
        if errors.is_empty() {
            Ok(JsonValue::Array(out))
        } else {
            Err(ErrorMessages::Nested(errors))
        }
    }
}

/// Looks a schema up by name when first needed
pub type SchemaResolver = Arc<dyn Fn(&str) -> Result<Arc<Schema>, String> + Send + Sync>;

/// A schema reference resolved on every use
pub struct DeferredSchema {
    name: String,
    resolver: SchemaResolver,
}

impl DeferredSchema {
    pub fn new<N: Into<String>>(name: N, resolver: SchemaResolver) -> Self {
        Self {
            name: name.into(),
            resolver,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resolve(&self) -> Result<Arc<Schema>, String> {
        (self.resolver)(&self.name)
    }
}

impl fmt::Debug for DeferredSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredSchema")
            .field("name", &self.name)
            .finish()
    }
}

/// What a nested field points at
#[derive(Debug, Clone)]
pub enum NestedTarget {
    Schema(Arc<Schema>),
    Deferred(Arc<DeferredSchema>),
}

impl NestedTarget {
    pub fn deferred<N: Into<String>>(name: N, resolver: SchemaResolver) -> Self {
        NestedTarget::Deferred(Arc::new(DeferredSchema::new(name, resolver)))
    }

    pub fn resolve(&self) -> Result<Arc<Schema>, ValidationError> {
        match self {
            NestedTarget::Schema(schema) => Ok(schema.clone()),
            NestedTarget::Deferred(deferred) => deferred.resolve().map_err(ValidationError::new),
        }
    }
}

/// A mapping (or list of mappings) loaded through another schema
#[derive(Debug, Clone)]
pub struct Nested {
    target: NestedTarget,
    many: bool,
}

impl Nested {
    pub fn new(target: NestedTarget, many: bool) -> Self {
        Self { target, many }
    }

    pub fn target(&self) -> &NestedTarget {
        &self.target
    }

    pub fn is_many(&self) -> bool {
        self.many
    }
}

impl FieldKind for Nested {
    fn name(&self) -> &'static str {
        "nested"
    }

    fn deserialize(&self, value: Value, ctx: &LoadContext<'_>) -> Result<Value, ErrorMessages> {
        let schema = self.target.resolve().map_err(ValidationError::into_messages)?;
        if self.many && !matches!(value, Value::List(_)) {
            return Err(ErrorMessages::message("Invalid type."));
        }
        let child = ctx.schema.child(schema, ctx.field);
        child
            .load_with(value, self.many, ctx.postprocess)
            .map_err(ValidationError::into_messages)
    }

    fn serialize(&self, value: Value, ctx: &DumpContext<'_>) -> Result<JsonValue, ErrorMessages> {
        let schema = self.target.resolve().map_err(ValidationError::into_messages)?;
        let child = ctx.schema.child(schema, ctx.field);
        child
            .dump_value(&value, self.many)
            .map_err(ValidationError::into_messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{integer, string};
    use crate::schema::{BoundSchema, SchemaDefinition};
    use serde_json::json;

    fn inner_schema() -> Arc<Schema> {
        Schema::derive(
            "InnerSchema",
            vec![Schema::root()],
            SchemaDefinition::new().field("test_field", string().required()),
        )
        .unwrap()
    }

    fn root() -> Arc<BoundSchema> {
        BoundSchema::new(
            Schema::derive("OuterSchema", vec![Schema::root()], SchemaDefinition::new()).unwrap(),
        )
    }

    #[test]
    fn test_list_errors_keyed_by_index() {
        let schema = root();
        let ctx = LoadContext { schema: &schema, field: "items", postprocess: true };
        let kind = List::new(integer());
        let err = kind
            .deserialize(Value::from(json!([1, "x", 3, null])), &ctx)
            .unwrap_err();
        assert_eq!(err.keys().collect::<Vec<_>>(), vec!["1", "3"]);
        assert_eq!(
            kind.deserialize(Value::Int(1), &ctx),
            Err(ErrorMessages::message("Not a valid list."))
        );
    }

    #[test]
    fn test_nested_many_requires_list() {
        let schema = root();
        let ctx = LoadContext { schema: &schema, field: "a", postprocess: true };
        let kind = Nested::new(NestedTarget::Schema(inner_schema()), true);
        assert_eq!(
            kind.deserialize(Value::from(json!({"test_field": "x"})), &ctx),
            Err(ErrorMessages::message("Invalid type."))
        );
        let loaded = kind
            .deserialize(Value::from(json!([{"test_field": "x"}])), &ctx)
            .unwrap();
        assert_eq!(loaded.as_list().map(|items| items.len()), Some(1));
    }

    #[test]
    fn test_deferred_failure_is_validation_error() {
        let schema = root();
        let ctx = LoadContext { schema: &schema, field: "a", postprocess: true };
        let resolver: SchemaResolver =
            Arc::new(|name: &str| Err(format!("The class '{}' not found", name)));
        let kind = Nested::new(NestedTarget::deferred("Missing", resolver), false);
        assert_eq!(
            kind.deserialize(Value::from(json!({})), &ctx),
            Err(ErrorMessages::message("The class 'Missing' not found"))
        );
    }
}
