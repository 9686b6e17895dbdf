//! Field descriptors
//!
//! A [`Field`] pairs a [`FieldKind`] (coercion in both directions) with
//! [`FieldOptions`] (defaults, nullability, direction). The load pipeline
//! calls [`Field::deserialize`] once per declared field and the dump
//! pipeline calls [`Field::serialize`].
//!
//! Copyright (c) 2025 Objmodel Team
//! Licensed under the Apache-2.0 license

mod callable;
mod container;
mod scalar;

pub use callable::{DeserializeFn, Function, Method, MethodRole, SchemaMethod, SerializeFn};
pub use container::{DeferredSchema, List, Nested, NestedTarget, SchemaResolver};
pub use scalar::{Bool, Dict, Email, Float, Int, Raw, Str};

use crate::context::Context;
use crate::error::{ErrorMessages, ValidationError};
use crate::schema::{BoundSchema, Schema};
use crate::validate::Validator;
use crate::value::{Attributes, Value};
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;

pub(crate) const MISSING_MESSAGE: &str = "Missing data for required field.";
pub(crate) const NULL_MESSAGE: &str = "Field may not be null.";

/// Load-side view handed to field kinds
pub struct LoadContext<'a> {
    pub schema: &'a Arc<BoundSchema>,
    /// Attribute name of the field being loaded
    pub field: &'a str,
    /// Whether post-load hooks run; false during `validate`
    pub postprocess: bool,
}

impl LoadContext<'_> {
    pub fn context(&self) -> Context {
        self.schema.context()
    }
}

/// Dump-side view handed to field kinds
pub struct DumpContext<'a> {
    pub schema: &'a Arc<BoundSchema>,
    pub field: &'a str,
}

impl DumpContext<'_> {
    pub fn context(&self) -> Context {
        self.schema.context()
    }
}

/// Where the serializer reads a field's input from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpSource {
    /// The attribute of the same name
    Attribute,
    /// The whole object
    Object,
}

/// Coercion logic for one field type
pub trait FieldKind: Send + Sync + fmt::Debug {
    /// Short type name used in logs
    fn name(&self) -> &'static str;

    /// Coerce a non-null input value
    fn deserialize(&self, value: Value, ctx: &LoadContext<'_>) -> Result<Value, ErrorMessages>;

    /// Render a non-null attribute value
    fn serialize(&self, value: Value, ctx: &DumpContext<'_>) -> Result<JsonValue, ErrorMessages>;

    fn dump_source(&self) -> DumpSource {
        DumpSource::Attribute
    }

    /// Serialize from the whole object. Only called for [`DumpSource::Object`]
    /// kinds; `None` omits the key.
    fn serialize_object(
        &self,
        _obj: &dyn Attributes,
        _ctx: &DumpContext<'_>,
    ) -> Result<Option<JsonValue>, ErrorMessages> {
        Ok(None)
    }

    /// Schema methods this kind calls, checked when a schema is derived
    fn method_names(&self) -> Vec<(MethodRole, &str)> {
        Vec::new()
    }
}

/// Factory producing a fresh default value
pub type DefaultFactory = Arc<dyn Fn() -> Value + Send + Sync>;

/// A default used when a field is absent
#[derive(Clone)]
pub enum DefaultValue {
    Value(Value),
    Factory(DefaultFactory),
}

impl DefaultValue {
    pub fn factory<F: Fn() -> Value + Send + Sync + 'static>(f: F) -> Self {
        DefaultValue::Factory(Arc::new(f))
    }

    pub fn produce(&self) -> Value {
        match self {
            DefaultValue::Value(value) => value.clone(),
            DefaultValue::Factory(f) => f(),
        }
    }

    fn is_null(&self) -> bool {
        matches!(self, DefaultValue::Value(Value::Null))
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Value(value) => f.debug_tuple("Value").field(value).finish(),
            DefaultValue::Factory(_) => f.write_str("Factory"),
        }
    }
}

impl<T: Into<Value>> From<T> for DefaultValue {
    fn from(value: T) -> Self {
        DefaultValue::Value(value.into())
    }
}

#[derive(Debug, Clone, Default)]
pub struct FieldOptions {
    /// Input/output key when it differs from the attribute name
    pub data_key: Option<String>,
    pub load_default: Option<DefaultValue>,
    pub dump_default: Option<DefaultValue>,
    pub required: bool,
    /// Explicit nullability; see [`Field::allows_none`]
    pub allow_none: Option<bool>,
    pub load_only: bool,
    pub dump_only: bool,
    pub validators: Vec<Validator>,
}

/// A declared field
#[derive(Clone)]
pub struct Field {
    kind: Arc<dyn FieldKind>,
    options: FieldOptions,
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("kind", &self.kind)
            .field("options", &self.options)
            .finish()
    }
}

impl Field {
    pub fn new<K: FieldKind + 'static>(kind: K) -> Self {
        Self::from_kind(Arc::new(kind))
    }

    pub fn from_kind(kind: Arc<dyn FieldKind>) -> Self {
        Self {
            kind,
            options: FieldOptions::default(),
        }
    }

    pub fn kind(&self) -> &Arc<dyn FieldKind> {
        &self.kind
    }

    pub fn options(&self) -> &FieldOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut FieldOptions {
        &mut self.options
    }

    pub fn required(mut self) -> Self {
        self.options.required = true;
        self
    }

    pub fn allow_none(mut self, allow: bool) -> Self {
        self.options.allow_none = Some(allow);
        self
    }

    pub fn load_default<D: Into<DefaultValue>>(mut self, default: D) -> Self {
        self.options.load_default = Some(default.into());
        self
    }

    pub fn dump_default<D: Into<DefaultValue>>(mut self, default: D) -> Self {
        self.options.dump_default = Some(default.into());
        self
    }

    pub fn load_only(mut self) -> Self {
        self.options.load_only = true;
        self
    }

    pub fn dump_only(mut self) -> Self {
        self.options.dump_only = true;
        self
    }

    pub fn data_key<K: Into<String>>(mut self, key: K) -> Self {
        self.options.data_key = Some(key.into());
        self
    }

    pub fn validate(mut self, validator: Validator) -> Self {
        self.options.validators.push(validator);
        self
    }

    /// Custom validation closure
    pub fn validate_with<F>(self, check: F) -> Self
    where
        F: Fn(&Value) -> Result<(), ValidationError> + Send + Sync + 'static,
    {
        self.validate(Validator::new("custom", check))
    }

    /// Key used in input and output mappings
    pub fn key<'a>(&'a self, name: &'a str) -> &'a str {
        self.options.data_key.as_deref().unwrap_or(name)
    }

    /// Null is accepted when set explicitly, or when the load default is null
    pub fn allows_none(&self) -> bool {
        self.options.allow_none.unwrap_or_else(|| {
            self.options
                .load_default
                .as_ref()
                .is_some_and(DefaultValue::is_null)
        })
    }

    /// Load one raw input entry. `None` input means the key was absent;
    /// `Ok(None)` means nothing is stored.
    pub fn deserialize(
        &self,
        raw: Option<Value>,
        ctx: &LoadContext<'_>,
    ) -> Result<Option<Value>, ErrorMessages> {
        match raw {
            None => match &self.options.load_default {
                Some(default) => Ok(Some(default.produce())),
                None if self.options.required => Err(ErrorMessages::message(MISSING_MESSAGE)),
                None => Ok(None),
            },
            Some(value) => self.deserialize_value(value, ctx).map(Some),
        }
    }

    /// Coerce a present value, applying the null check and validators
    pub fn deserialize_value(
        &self,
        value: Value,
        ctx: &LoadContext<'_>,
    ) -> Result<Value, ErrorMessages> {
        if value.is_null() {
            return if self.allows_none() {
                Ok(Value::Null)
            } else {
                Err(ErrorMessages::message(NULL_MESSAGE))
            };
        }
        let value = self.kind.deserialize(value, ctx)?;
        let mut errors: Option<ErrorMessages> = None;
        for validator in &self.options.validators {
            if let Err(messages) = validator.check(&value) {
                match errors.as_mut() {
                    Some(existing) => existing.merge(messages),
                    None => errors = Some(messages),
                }
            }
        }
        match errors {
            Some(errors) => Err(errors),
            None => Ok(value),
        }
    }

    /// Dump the field `name` of `obj`. `Ok(None)` omits the key.
    pub fn serialize(
        &self,
        name: &str,
        obj: &dyn Attributes,
        ctx: &DumpContext<'_>,
    ) -> Result<Option<JsonValue>, ErrorMessages> {
        if self.kind.dump_source() == DumpSource::Object {
            return self.kind.serialize_object(obj, ctx);
        }
        let value = match obj.attribute(name) {
            Some(value) => value,
            None => match &self.options.dump_default {
                Some(default) => default.produce(),
                None => return Ok(None),
            },
        };
        self.serialize_value(value, ctx).map(Some)
    }

    pub fn serialize_value(
        &self,
        value: Value,
        ctx: &DumpContext<'_>,
    ) -> Result<JsonValue, ErrorMessages> {
        if value.is_null() {
            return Ok(JsonValue::Null);
        }
        self.kind.serialize(value, ctx)
    }
}

pub fn string() -> Field {
    Field::new(Str)
}

pub fn integer() -> Field {
    Field::new(Int)
}

pub fn float() -> Field {
    Field::new(Float)
}

pub fn boolean() -> Field {
    Field::new(Bool)
}

pub fn email() -> Field {
    Field::new(Email)
}

pub fn raw() -> Field {
    Field::new(Raw)
}

pub fn dict() -> Field {
    Field::new(Dict)
}

pub fn list(inner: Field) -> Field {
    Field::new(List::new(inner))
}

/// Nested schema, one mapping
pub fn nested(schema: Arc<Schema>) -> Field {
    Field::new(Nested::new(NestedTarget::Schema(schema), false))
}

/// Nested schema, list of mappings
pub fn nested_many(schema: Arc<Schema>) -> Field {
    Field::new(Nested::new(NestedTarget::Schema(schema), true))
}

/// Field backed by named schema methods
pub fn method(serialize: Option<&str>, deserialize: Option<&str>) -> Field {
    Field::new(Method::new(serialize, deserialize))
}

/// Field backed by closures
pub fn function(serialize: Option<SerializeFn>, deserialize: Option<DeserializeFn>) -> Field {
    Field::new(Function::new(serialize, deserialize))
}
