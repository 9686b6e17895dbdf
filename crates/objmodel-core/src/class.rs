//! Model classes
//!
//! A [`ModelClass`] is what [`ModelBuilder::build`](crate::ModelBuilder::build)
//! returns: the synthesized schema, the parent classes, ordinary class
//! attributes and the optional init routine. Loading goes through the class.
//!
//! Copyright (c) 2025 Objmodel Team
//! Licensed under the Apache-2.0 license

use crate::error::{ModelError, Result};
use crate::instance::Model;
use crate::kwargs::Kwargs;
use indexmap::IndexMap;
use objmodel_schema::{
    BoundSchema, ErrorMessages, LoadOptions, Schema, SchemaMethod, ValidationError, Value,
    ValueMap,
};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Runs after an instance's fields are populated, with the validated data
pub type InitFn = Arc<dyn Fn(&Model, &ValueMap) -> std::result::Result<(), ValidationError> + Send + Sync>;

/// Shared handle to a model class
#[derive(Clone)]
pub struct ModelClass(Arc<ClassInner>);

pub(crate) struct ClassInner {
    pub(crate) name: String,
    pub(crate) schema: Arc<Schema>,
    pub(crate) parents: Vec<ModelClass>,
    pub(crate) attributes: ValueMap,
    pub(crate) methods: IndexMap<String, SchemaMethod>,
    pub(crate) init: Option<InitFn>,
}

/// Result of a load: one instance, or one per input item
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded {
    One(Model),
    Many(Vec<Model>),
}

impl Loaded {
    pub fn into_one(self) -> Option<Model> {
        match self {
            Loaded::One(model) => Some(model),
            Loaded::Many(_) => None,
        }
    }

    /// All instances; a single one becomes a one-element list
    pub fn into_many(self) -> Vec<Model> {
        match self {
            Loaded::One(model) => vec![model],
            Loaded::Many(models) => models,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Loaded::One(_) => 1,
            Loaded::Many(models) => models.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ModelClass {
    pub(crate) fn from_inner(inner: Arc<ClassInner>) -> Self {
        ModelClass(inner)
    }

    /// The class a schema was synthesized for, looking through its bases
    /// when the schema was derived further by hand
    pub fn from_schema(schema: &Schema) -> Option<ModelClass> {
        if let Some(owner) = schema.owner() {
            if let Ok(inner) = owner.downcast::<ClassInner>() {
                return Some(ModelClass(inner));
            }
        }
        schema.bases().iter().find_map(|base| ModelClass::from_schema(base))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// The synthesized schema, named `<Name>Schema`
    pub fn schema(&self) -> &Arc<Schema> {
        &self.0.schema
    }

    pub fn parents(&self) -> &[ModelClass] {
        &self.0.parents
    }

    /// A class attribute; declared fields read as null
    pub fn attribute(&self, name: &str) -> Option<Value> {
        self.0.attributes.get(name).cloned()
    }

    pub fn attributes(&self) -> &ValueMap {
        &self.0.attributes
    }

    /// A method defined in the class body
    pub fn method(&self, name: &str) -> Option<&SchemaMethod> {
        self.0.methods.get(name)
    }

    pub fn init(&self) -> Option<&InitFn> {
        self.0.init.as_ref()
    }

    pub fn ptr_eq(&self, other: &ModelClass) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Whether `self` is `other` or inherits from it
    pub fn is_subclass_of(&self, other: &ModelClass) -> bool {
        self.ptr_eq(other) || self.parents().iter().any(|parent| parent.is_subclass_of(other))
    }

    /// A fresh bound schema carrying the per-call options
    pub fn bind_schema(&self, options: &LoadOptions) -> Arc<BoundSchema> {
        BoundSchema::from_options(self.0.schema.clone(), options)
    }

    /// Validate `data` and construct instances from it
    pub fn load<V: Into<Value>>(&self, data: V, options: LoadOptions) -> Result<Loaded> {
        debug!(
            model = %self.name(),
            many = options.many,
            partial = ?options.partial,
            unknown = ?options.unknown,
            "loading model"
        );
        let bound = self.bind_schema(&options);
        let loaded = bound.load(data.into(), options.many)?;
        if !options.many {
            return self.expect_model(&loaded).map(Loaded::One);
        }
        match &loaded {
            Value::List(items) => items
                .iter()
                .map(|item| self.expect_model(item))
                .collect::<Result<Vec<_>>>()
                .map(Loaded::Many),
            other => Err(self.construction_error(other)),
        }
    }

    /// Load exactly one instance, whatever `options.many` says
    pub fn load_one<V: Into<Value>>(&self, data: V, options: LoadOptions) -> Result<Model> {
        match self.load(data, options.many(false))? {
            Loaded::One(model) => Ok(model),
            Loaded::Many(_) => Err(self.construction_error(&Value::Null)),
        }
    }

    /// Load a list of instances, whatever `options.many` says
    pub fn load_many<V: Into<Value>>(&self, data: V, options: LoadOptions) -> Result<Vec<Model>> {
        Ok(self.load(data, options.many(true))?.into_many())
    }

    /// Error detail for `data`, empty when valid. No instance is built.
    pub fn validate<V: Into<Value>>(&self, data: V, options: LoadOptions) -> ErrorMessages {
        self.bind_schema(&options).validate(data.into(), options.many)
    }

    /// Direct construction from keyword arguments
    pub fn construct(&self, kwargs: Kwargs) -> Result<Model> {
        let (fields, options) = kwargs.into_parts();
        match self.load(Value::Map(fields), options)? {
            Loaded::One(model) => Ok(model),
            Loaded::Many(_) => Err(self.construction_error(&Value::Null)),
        }
    }

    fn expect_model(&self, value: &Value) -> Result<Model> {
        Model::from_value(value).ok_or_else(|| self.construction_error(value))
    }

    fn construction_error(&self, value: &Value) -> ModelError {
        ModelError::Construction {
            model: self.name().to_string(),
            message: format!("load produced {} instead of an instance", value.type_label()),
        }
    }
}

impl PartialEq for ModelClass {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for ModelClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelClass")
            .field("name", &self.name())
            .field("schema", &self.schema().name())
            .field(
                "parents",
                &self.parents().iter().map(ModelClass::name).collect::<Vec<_>>(),
            )
            .finish()
    }
}
