//! Schema instances: load, validate and dump
//!
//! Copyright (c) 2025 Objmodel Team
//! Licensed under the Apache-2.0 license

use super::{Hook, HookContext, HookKind, Schema};
use crate::context::Context;
use crate::error::{store, ErrorMessages, ValidationError, ValidationResult};
use crate::fields::{DumpContext, LoadContext};
use crate::options::{LoadOptions, Partial, UnknownPolicy};
use crate::value::{Attributes, Value, ValueMap};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

const INPUT_TYPE_MESSAGE: &str = "Invalid input type.";
const UNKNOWN_MESSAGE: &str = "Unknown field.";

/// Attribute source for values that expose nothing
struct NoAttributes;

impl Attributes for NoAttributes {
    fn attribute(&self, _name: &str) -> Option<Value> {
        None
    }
}

/// A schema plus the state of one load or dump: shared context, partial
/// setting and unknown-policy override.
pub struct BoundSchema {
    schema: Arc<Schema>,
    context: RwLock<Context>,
    partial: Partial,
    unknown: Option<UnknownPolicy>,
}

impl BoundSchema {
    pub fn new(schema: Arc<Schema>) -> Arc<Self> {
        Self::from_options(schema, &LoadOptions::default())
    }

    pub fn from_options(schema: Arc<Schema>, options: &LoadOptions) -> Arc<Self> {
        Arc::new(Self {
            schema,
            context: RwLock::new(options.context.clone().unwrap_or_default()),
            partial: options.partial.clone(),
            unknown: options.unknown,
        })
    }

    /// Instance for the nested schema under `field`, sharing this context
    pub fn child(&self, schema: Arc<Schema>, field: &str) -> Arc<Self> {
        Arc::new(Self {
            schema,
            context: RwLock::new(self.context()),
            partial: self.partial.for_nested(field),
            unknown: self.unknown,
        })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Handle to the current context
    pub fn context(&self) -> Context {
        self.context.read().clone()
    }

    pub fn set_context(&self, context: Context) {
        *self.context.write() = context;
    }

    pub fn partial(&self) -> &Partial {
        &self.partial
    }

    /// Effective unknown policy
    pub fn unknown(&self) -> UnknownPolicy {
        self.unknown.unwrap_or(self.schema.meta().unknown)
    }

    /// Deserialize, validate and post-process `data`
    pub fn load(self: &Arc<Self>, data: Value, many: bool) -> ValidationResult<Value> {
        self.load_with(data, many, true)
    }

    /// Error detail for `data`; empty when valid. Post-load hooks do not run.
    pub fn validate(self: &Arc<Self>, data: Value, many: bool) -> ErrorMessages {
        match self.load_with(data, many, false) {
            Ok(_) => ErrorMessages::empty(),
            Err(err) => err.into_messages(),
        }
    }

    pub(crate) fn load_with(
        self: &Arc<Self>,
        data: Value,
        many: bool,
        postprocess: bool,
    ) -> ValidationResult<Value> {
        debug!(schema = %self.schema.name(), many, postprocess, "loading");
        let original = self.schema.error_handler().map(|_| data.clone());
        let messages = match self.run_load(data, many, postprocess) {
            Ok(value) => return Ok(value),
            Err(messages) => messages,
        };

        let error = ValidationError::from_messages(messages);
        debug!(schema = %self.schema.name(), errors = error.messages().len(), "load failed");
        if let (Some(handler), Some(original)) = (self.schema.error_handler(), original) {
            let ctx = HookContext { schema: self, many };
            handler(&error, &original, &ctx);
        }
        Err(error)
    }

    fn run_load(
        self: &Arc<Self>,
        data: Value,
        many: bool,
        postprocess: bool,
    ) -> Result<Value, ErrorMessages> {
        let ctx = HookContext { schema: self, many };
        if !many {
            let value = self.load_item(data, &ctx, postprocess)?;
            return if postprocess {
                self.run_value_hooks(HookKind::PostLoad, value, &ctx)
            } else {
                Ok(value)
            };
        }

        let Value::List(items) = data else {
            return Err(ErrorMessages::message(INPUT_TYPE_MESSAGE).normalized());
        };
        let mut loaded = Vec::with_capacity(items.len());
        let mut errors = IndexMap::new();
        for (index, item) in items.into_iter().enumerate() {
            match self.load_item(item, &ctx, postprocess) {
                Ok(value) => loaded.push(value),
                Err(messages) => {
                    errors.insert(index.to_string(), messages);
                }
            }
        }
        if !errors.is_empty() {
            return Err(ErrorMessages::Nested(errors));
        }
        if !postprocess {
            return Ok(Value::List(loaded));
        }

        let mut processed = Vec::with_capacity(loaded.len());
        for (index, value) in loaded.into_iter().enumerate() {
            match self.run_value_hooks(HookKind::PostLoad, value, &ctx) {
                Ok(value) => processed.push(value),
                Err(messages) => {
                    errors.insert(index.to_string(), messages);
                }
            }
        }
        if errors.is_empty() {
            Ok(Value::List(processed))
        } else {
            Err(ErrorMessages::Nested(errors))
        }
    }

    fn load_item(
        self: &Arc<Self>,
        data: Value,
        ctx: &HookContext<'_>,
        postprocess: bool,
    ) -> Result<Value, ErrorMessages> {
        let data = self.run_value_hooks(HookKind::PreLoad, data, ctx)?;
        let Value::Map(mut input) = data else {
            return Err(ErrorMessages::message(INPUT_TYPE_MESSAGE).normalized());
        };

        let mut loaded = ValueMap::new();
        let mut errors = IndexMap::new();
        for (name, field) in self.schema.load_fields() {
            let key = field.key(name);
            let raw = input.shift_remove(key);
            if raw.is_none() && self.partial.allows_missing(name) {
                continue;
            }
            let load_ctx = LoadContext {
                schema: self,
                field: name,
                postprocess,
            };
            match field.deserialize(raw, &load_ctx) {
                Ok(Some(value)) => {
                    trace!(field = name, kind = field.kind().name(), "loaded field");
                    loaded.insert(name.to_string(), value);
                }
                Ok(None) => {}
                Err(messages) => store(&mut errors, key.to_string(), messages),
            }
        }

        let policy = self.unknown();
        for (key, value) in input {
            match policy {
                UnknownPolicy::Raise => {
                    store(&mut errors, key, ErrorMessages::message(UNKNOWN_MESSAGE))
                }
                UnknownPolicy::Include => {
                    loaded.insert(key, value);
                }
                UnknownPolicy::Exclude => trace!(key = %key, "excluded unknown key"),
            }
        }

        if errors.is_empty() {
            Ok(Value::Map(loaded))
        } else {
            Err(ErrorMessages::Nested(errors))
        }
    }

    fn run_value_hooks(
        &self,
        kind: HookKind,
        mut value: Value,
        ctx: &HookContext<'_>,
    ) -> Result<Value, ErrorMessages> {
        for (name, hook) in self.schema.hooks_of(kind) {
            let Some(f) = hook.value_fn() else {
                continue;
            };
            trace!(schema = %self.schema.name(), hook = name, "running hook");
            value = f(value, ctx).map_err(|err| err.into_messages().normalized())?;
        }
        Ok(value)
    }

    /// Serialize one object (a mapping or a [`SchemaObject`](crate::SchemaObject))
    pub fn dump(self: &Arc<Self>, obj: &Value) -> ValidationResult<JsonMap<String, JsonValue>> {
        self.dump_item(obj, false)
            .map_err(ValidationError::from_messages)
    }

    /// Serialize one object, or each object of a list when `many`
    pub fn dump_value(self: &Arc<Self>, obj: &Value, many: bool) -> ValidationResult<JsonValue> {
        if !many {
            return self.dump(obj).map(JsonValue::Object);
        }
        let Value::List(items) = obj else {
            return Err(ValidationError::schema_level(INPUT_TYPE_MESSAGE));
        };
        let mut out = Vec::with_capacity(items.len());
        let mut errors = IndexMap::new();
        for (index, item) in items.iter().enumerate() {
            match self.dump_item(item, true) {
                Ok(map) => out.push(JsonValue::Object(map)),
                Err(messages) => {
                    errors.insert(index.to_string(), messages);
                }
            }
        }
        if errors.is_empty() {
            Ok(JsonValue::Array(out))
        } else {
            Err(ValidationError::from_messages(ErrorMessages::Nested(errors)))
        }
    }

    fn dump_item(
        self: &Arc<Self>,
        obj: &Value,
        many: bool,
    ) -> Result<JsonMap<String, JsonValue>, ErrorMessages> {
        let ctx = HookContext { schema: self, many };
        let processed;
        let obj = if self.schema.has_hooks(HookKind::PreDump) {
            processed = self.run_value_hooks(HookKind::PreDump, obj.clone(), &ctx)?;
            &processed
        } else {
            obj
        };
        let attrs: &dyn Attributes = match obj {
            Value::Map(map) => map,
            Value::Object(object) => object.as_attributes(),
            _ => &NoAttributes,
        };

        let mut out = JsonMap::new();
        let mut errors = IndexMap::new();
        for (name, field) in self.schema.dump_fields() {
            let key = field.key(name);
            let dump_ctx = DumpContext { schema: self, field: name };
            match field.serialize(name, attrs, &dump_ctx) {
                Ok(Some(json)) => {
                    out.insert(key.to_string(), json);
                }
                Ok(None) => trace!(field = name, "omitted missing field"),
                Err(messages) => store(&mut errors, key.to_string(), messages),
            }
        }
        if !errors.is_empty() {
            return Err(ErrorMessages::Nested(errors));
        }

        if !self.schema.meta().ordered {
            let mut entries: Vec<(String, JsonValue)> = out.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            out = entries.into_iter().collect();
        }

        for (name, hook) in self.schema.hooks_of(HookKind::PostDump) {
            if let Hook::PostDump(f) = hook {
                trace!(schema = %self.schema.name(), hook = name, "running hook");
                out = f(out, &ctx).map_err(|err| err.into_messages().normalized())?;
            }
        }
        Ok(out)
    }
}

impl fmt::Debug for BoundSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundSchema")
            .field("schema", &self.schema.name())
            .field("context", &self.context())
            .field("partial", &self.partial)
            .field("unknown", &self.unknown)
            .finish()
    }
}
