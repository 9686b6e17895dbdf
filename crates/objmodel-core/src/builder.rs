//! Model definition
//!
//! [`ModelBuilder`] collects a model body member by member, in declaration
//! order, and [`build`](ModelBuilder::build) harvests it, synthesizes the
//! schema and registers the class.
//!
//! ```rust
//! use objmodel_core::{fields, Kwargs, ModelBuilder, ModelRegistry};
//!
//! let registry = ModelRegistry::new();
//! let user = ModelBuilder::new("User")
//!     .registry(&registry)
//!     .field("name", fields::string().required())
//!     .field("active", fields::boolean().load_default(true))
//!     .build()
//!     .unwrap();
//!
//! let ada = user.construct(Kwargs::new().set("name", "Ada")).unwrap();
//! assert_eq!(ada.get_bool("active"), Some(true));
//! ```
//!
//! Copyright (c) 2025 Objmodel Team
//! Licensed under the Apache-2.0 license

use crate::body::{harvest, ClassBody, ClassMember, HANDLE_ERROR, META, ON_BIND_FIELD};
use crate::class::{InitFn, ModelClass};
use crate::error::Result;
use crate::instance::Model;
use crate::registry::ModelRegistry;
use crate::synth::{synthesize, ClassSpec};
use objmodel_schema::schema::{BindFieldFn, ErrorHandler};
use objmodel_schema::{
    Attributes, Context, Field, Hook, HookContext, SchemaMeta, SchemaMethod, ValidationError,
    Value, ValueMap,
};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

type HookResult<T> = std::result::Result<T, ValidationError>;

/// Builder for a model class
pub struct ModelBuilder {
    name: String,
    parents: Vec<ModelClass>,
    body: ClassBody,
    init: Option<InitFn>,
    registry: Option<ModelRegistry>,
}

impl ModelBuilder {
    pub fn new<N: Into<String>>(name: N) -> Self {
        Self {
            name: name.into(),
            parents: Vec::new(),
            body: ClassBody::new(),
            init: None,
            registry: None,
        }
    }

    /// Inherit from `parent`. Earlier parents take precedence.
    pub fn extends(mut self, parent: &ModelClass) -> Self {
        self.parents.push(parent.clone());
        self
    }

    pub fn field<N: Into<String>>(self, name: N, field: Field) -> Self {
        self.member(name, ClassMember::Field(field))
    }

    pub fn pre_load<N, F>(self, name: N, f: F) -> Self
    where
        N: Into<String>,
        F: Fn(Value, &HookContext<'_>) -> HookResult<Value> + Send + Sync + 'static,
    {
        self.member(name, ClassMember::Hook(Hook::pre_load(f)))
    }

    /// Post-load hook on the loaded value. For a model this value is
    /// already the constructed instance.
    pub fn post_load<N, F>(self, name: N, f: F) -> Self
    where
        N: Into<String>,
        F: Fn(Value, &HookContext<'_>) -> HookResult<Value> + Send + Sync + 'static,
    {
        self.member(name, ClassMember::Hook(Hook::post_load(f)))
    }

    /// Post-load hook working on the constructed instance
    pub fn post_load_model<N, F>(self, name: N, f: F) -> Self
    where
        N: Into<String>,
        F: Fn(&Model, &Context) -> HookResult<()> + Send + Sync + 'static,
    {
        let hook = Hook::post_load(move |value, ctx| {
            if let Some(model) = Model::from_value(&value) {
                f(&model, &ctx.context())?;
            }
            Ok(value)
        });
        self.member(name, ClassMember::Hook(hook))
    }

    pub fn pre_dump<N, F>(self, name: N, f: F) -> Self
    where
        N: Into<String>,
        F: Fn(Value, &HookContext<'_>) -> HookResult<Value> + Send + Sync + 'static,
    {
        self.member(name, ClassMember::Hook(Hook::pre_dump(f)))
    }

    pub fn post_dump<N, F>(self, name: N, f: F) -> Self
    where
        N: Into<String>,
        F: Fn(JsonMap<String, JsonValue>, &HookContext<'_>) -> HookResult<JsonMap<String, JsonValue>>
            + Send
            + Sync
            + 'static,
    {
        self.member(name, ClassMember::Hook(Hook::post_dump(f)))
    }

    /// A method a method field can name for serialization
    pub fn method_serialize<N, F>(self, name: N, f: F) -> Self
    where
        N: Into<String>,
        F: Fn(&dyn Attributes, &Context) -> HookResult<JsonValue> + Send + Sync + 'static,
    {
        self.member(name, ClassMember::Method(SchemaMethod::serialize(f)))
    }

    /// A method a method field can name for deserialization
    pub fn method_deserialize<N, F>(self, name: N, f: F) -> Self
    where
        N: Into<String>,
        F: Fn(Value, &Context) -> HookResult<Value> + Send + Sync + 'static,
    {
        self.member(name, ClassMember::Method(SchemaMethod::deserialize(f)))
    }

    pub fn meta(self, meta: SchemaMeta) -> Self {
        self.member(META, ClassMember::Meta(meta))
    }

    pub fn on_bind_field<F>(self, f: F) -> Self
    where
        F: Fn(&str, &mut Field) + Send + Sync + 'static,
    {
        let callback: BindFieldFn = Arc::new(f);
        self.member(ON_BIND_FIELD, ClassMember::OnBindField(callback))
    }

    pub fn handle_error<F>(self, f: F) -> Self
    where
        F: Fn(&ValidationError, &Value, &HookContext<'_>) + Send + Sync + 'static,
    {
        let handler: ErrorHandler = Arc::new(f);
        self.member(HANDLE_ERROR, ClassMember::HandleError(handler))
    }

    /// An ordinary class attribute, readable from every instance
    pub fn attribute<N: Into<String>, V: Into<Value>>(self, name: N, value: V) -> Self {
        self.member(name, ClassMember::Attribute(value.into()))
    }

    pub fn member<N: Into<String>>(mut self, name: N, member: ClassMember) -> Self {
        self.body.insert(name, member);
        self
    }

    /// Routine run on every new instance after its fields are set
    pub fn init<F>(mut self, f: F) -> Self
    where
        F: Fn(&Model, &ValueMap) -> HookResult<()> + Send + Sync + 'static,
    {
        self.init = Some(Arc::new(f));
        self
    }

    /// Register into `registry` instead of the global one
    pub fn registry(mut self, registry: &ModelRegistry) -> Self {
        self.registry = Some(registry.clone());
        self
    }

    pub fn build(self) -> Result<ModelClass> {
        debug!(model = %self.name, members = self.body.len(), "building model class");
        let harvested = harvest(&self.name, self.body)?;
        let registry = self.registry.unwrap_or_else(|| ModelRegistry::global().clone());
        synthesize(
            ClassSpec {
                name: self.name,
                parents: self.parents,
                harvested,
                init: self.init,
            },
            &registry,
        )
    }
}

impl fmt::Debug for ModelBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelBuilder")
            .field("name", &self.name)
            .field("parents", &self.parents)
            .field("body", &self.body)
            .field("init", &self.init.is_some())
            .finish()
    }
}
