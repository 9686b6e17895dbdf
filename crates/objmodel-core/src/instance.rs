//! Model instances
//!
//! A [`Model`] is a shared handle to one loaded object: the validated field
//! values, the bound schema that produced them and the missing-field
//! tracker. Instances only come out of the load pipeline; after that they
//! are read with [`Model::get`] and changed with [`Model::set`].
//!
//! Copyright (c) 2025 Objmodel Team
//! Licensed under the Apache-2.0 license

use crate::class::ModelClass;
use crate::error::Result;
use crate::tracker::{collect_tree, DumpModeGuard, FieldTracker};
use indexmap::IndexSet;
use objmodel_schema::{
    Attributes, BoundSchema, Context, LoadOptions, ObjectRef, SchemaObject, UnknownPolicy,
    ValidationError, Value, ValueMap,
};
use parking_lot::RwLock;
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Shared handle to a model instance. Cloning shares the instance.
#[derive(Clone)]
pub struct Model(Arc<ModelInner>);

struct ModelInner {
    class: ModelClass,
    schema: Arc<BoundSchema>,
    values: RwLock<ValueMap>,
    tracker: FieldTracker,
}

impl Model {
    /// Build an instance from the output of a successful load. Declared
    /// fields absent from `data` start out missing. The class init routine
    /// runs last, with the validated data.
    pub(crate) fn from_validated(
        class: ModelClass,
        schema: Arc<BoundSchema>,
        data: ValueMap,
    ) -> std::result::Result<Model, ValidationError> {
        let missing: IndexSet<String> = schema
            .schema()
            .fields()
            .keys()
            .filter(|name| !data.contains_key(name.as_str()))
            .cloned()
            .collect();
        let model = Model(Arc::new(ModelInner {
            class,
            schema,
            values: RwLock::new(ValueMap::with_capacity(data.len())),
            tracker: FieldTracker::new(missing),
        }));
        for (name, value) in &data {
            model.set(name.as_str(), value.clone());
        }
        if let Some(init) = model.class().init() {
            init(&model, &data)?;
        }
        trace!(
            model = %model.class().name(),
            missing = model.0.tracker.missing().len(),
            "constructed instance"
        );
        Ok(model)
    }

    pub fn class(&self) -> &ModelClass {
        &self.0.class
    }

    /// The bound schema that produced this instance
    pub fn schema(&self) -> &Arc<BoundSchema> {
        &self.0.schema
    }

    pub(crate) fn tracker(&self) -> &FieldTracker {
        &self.0.tracker
    }

    /// Read an attribute: instance value first, then class attribute.
    ///
    /// Declared fields that were never set read as null, or as `None` while
    /// dump mode is on.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.0.read(name)
    }

    pub fn get_str(&self, name: &str) -> Option<String> {
        self.get(name).and_then(|value| value.as_str().map(str::to_string))
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(|value| value.as_i64())
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(|value| value.as_f64())
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(|value| value.as_bool())
    }

    /// A nested instance held by `name`
    pub fn get_model(&self, name: &str) -> Option<Model> {
        self.get(name).as_ref().and_then(Model::from_value)
    }

    /// The nested instances held by a `many` field; empty when unset
    pub fn get_models(&self, name: &str) -> Vec<Model> {
        match self.get(name) {
            Some(Value::List(items)) => items.iter().filter_map(Model::from_value).collect(),
            _ => Vec::new(),
        }
    }

    /// Assign an attribute. Assigning a declared field clears its missing mark.
    pub fn set<N: Into<String>, V: Into<Value>>(&self, name: N, value: V) {
        let name = name.into();
        if self.0.tracker.mark_set(&name) {
            trace!(model = %self.class().name(), field = %name, "field no longer missing");
        }
        self.0.values.write().insert(name, value.into());
    }

    pub fn is_missing(&self, name: &str) -> bool {
        self.0.tracker.is_missing(name)
    }

    /// Declared fields never supplied nor assigned, in declaration order
    pub fn missing_fields(&self) -> Vec<String> {
        self.0.tracker.missing()
    }

    pub fn is_dump_mode(&self) -> bool {
        self.0.tracker.is_dump_mode()
    }

    /// Turn dump mode on for this instance and every nested one until the
    /// guard is dropped
    pub fn dump_mode(&self) -> DumpModeGuard<'_> {
        DumpModeGuard::engage(self)
    }

    /// Handle to the shared context
    pub fn context(&self) -> Context {
        self.0.schema.context()
    }

    /// Replace the context of this instance and of every nested instance
    pub fn set_context(&self, context: Context) {
        let tree = collect_tree(self);
        for node in &tree {
            node.0.schema.set_context(context.clone());
        }
        debug!(model = %self.class().name(), instances = tree.len(), "context replaced");
    }

    /// Serialize through the bound schema with missing fields omitted
    pub fn dump(&self) -> Result<JsonMap<String, JsonValue>> {
        let _guard = self.dump_mode();
        debug!(model = %self.class().name(), "dumping instance");
        Ok(self.0.schema.dump(&self.to_value())?)
    }

    /// Serialize with another context. The instance keeps its own.
    pub fn dump_with_context(&self, context: &Context) -> Result<JsonMap<String, JsonValue>> {
        let options = LoadOptions::new().with_context(context.clone());
        let bound = BoundSchema::from_options(self.0.schema.schema().clone(), &options);
        let _guard = self.dump_mode();
        debug!(model = %self.class().name(), "dumping instance with context override");
        Ok(bound.dump(&self.to_value())?)
    }

    /// Dump and reload; the copy shares this context
    pub fn copy(&self) -> Result<Model> {
        self.reload(self.context())
    }

    /// Dump and reload; the copy gets its own clone of the context
    pub fn deep_copy(&self) -> Result<Model> {
        self.reload(self.context().deep_clone())
    }

    fn reload(&self, context: Context) -> Result<Model> {
        let data = Value::from(JsonValue::Object(self.dump()?));
        let options = LoadOptions::new()
            .with_context(context)
            .unknown(UnknownPolicy::Exclude);
        self.class().load_one(data, options)
    }

    /// Whether both handles point at the same instance
    pub fn ptr_eq(&self, other: &Model) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Address-based identity
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    pub fn is_instance_of(&self, class: &ModelClass) -> bool {
        self.class().is_subclass_of(class)
    }

    /// Instances held directly by declared fields, list elements included
    pub(crate) fn nested_models(&self) -> Vec<Model> {
        let values = self.0.values.read();
        let mut out = Vec::new();
        for name in self.0.schema.schema().fields().keys() {
            match values.get(name) {
                Some(Value::List(items)) => out.extend(items.iter().filter_map(Model::from_value)),
                Some(value) => out.extend(Model::from_value(value)),
                None => {}
            }
        }
        out
    }

    pub fn to_value(&self) -> Value {
        Value::from(self.clone())
    }

    /// Wrap `models` as a list value, ready for a many-valued nested field
    pub fn list<I: IntoIterator<Item = Model>>(models: I) -> Value {
        Value::List(models.into_iter().map(Value::from).collect())
    }

    /// The instance inside `value`, if it holds one
    pub fn from_value(value: &Value) -> Option<Model> {
        let Value::Object(object) = value else {
            return None;
        };
        object.clone().into_any().downcast::<ModelInner>().ok().map(Model)
    }
}

impl ModelInner {
    fn read(&self, name: &str) -> Option<Value> {
        if self.tracker.is_dump_mode() && self.tracker.is_missing(name) {
            return None;
        }
        if let Some(value) = self.values.read().get(name) {
            return Some(value.clone());
        }
        self.class.attribute(name)
    }

    fn fields_eq(&self, other: &ModelInner) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        self.class.ptr_eq(&other.class)
            && self
                .schema
                .schema()
                .fields()
                .keys()
                .all(|name| self.read(name) == other.read(name))
    }
}

impl Attributes for ModelInner {
    fn attribute(&self, name: &str) -> Option<Value> {
        self.read(name)
    }
}

impl SchemaObject for ModelInner {
    fn type_name(&self) -> &str {
        self.class.name()
    }

    fn as_attributes(&self) -> &dyn Attributes {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn object_eq(&self, other: &dyn SchemaObject) -> bool {
        other
            .as_any()
            .downcast_ref::<ModelInner>()
            .is_some_and(|other| self.fields_eq(other))
    }
}

impl fmt::Debug for ModelInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(self.class.name())
            .field("values", &*self.values.read())
            .field("missing", &self.tracker.missing())
            .finish()
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.0.fields_eq(&other.0)
    }
}

impl From<Model> for Value {
    fn from(model: Model) -> Self {
        let object: ObjectRef = model.0;
        Value::Object(object)
    }
}

impl From<&Model> for Value {
    fn from(model: &Model) -> Self {
        Value::from(model.clone())
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.dump() {
            Ok(map) => write!(f, "{}(**{})", self.class().name(), JsonValue::Object(map)),
            Err(err) => write!(f, "{}(<{}>)", self.class().name(), err),
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dumped = self
            .dump()
            .and_then(|map| Ok(serde_json::to_string_pretty(&map)?));
        match dumped {
            Ok(text) => f.write_str(&text),
            Err(err) => write!(f, "<{}>", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ModelBuilder;
    use crate::kwargs::Kwargs;
    use crate::registry::ModelRegistry;
    use objmodel_schema::fields;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn optional(registry: &ModelRegistry) -> ModelClass {
        ModelBuilder::new("Optional")
            .registry(registry)
            .field("str_field", fields::string().load_default("foo"))
            .field("int_field", fields::integer().dump_default(-1))
            .build()
            .unwrap()
    }

    #[test]
    fn test_missing_fields_follow_input() {
        let registry = ModelRegistry::new();
        let model = optional(&registry).construct(Kwargs::new()).unwrap();
        assert_eq!(model.missing_fields(), vec!["int_field".to_string()]);
        assert_eq!(model.get_str("str_field").as_deref(), Some("foo"));
        assert_eq!(model.get("int_field"), Some(Value::Null));
    }

    #[test]
    fn test_dump_mode_hides_missing() {
        let registry = ModelRegistry::new();
        let model = optional(&registry)
            .construct(Kwargs::new().partial(true))
            .unwrap();
        {
            let _guard = model.dump_mode();
            assert!(model.is_dump_mode());
            assert_eq!(model.get("int_field"), None);
            {
                let _inner = model.dump_mode();
                assert!(model.is_dump_mode());
            }
            assert!(model.is_dump_mode());
        }
        assert!(!model.is_dump_mode());
        assert_eq!(model.get("int_field"), Some(Value::Null));
    }

    #[test]
    fn test_set_clears_missing_and_dumps() {
        let registry = ModelRegistry::new();
        let model = optional(&registry)
            .construct(Kwargs::new().partial(true))
            .unwrap();
        assert_eq!(JsonValue::Object(model.dump().unwrap()), json!({"int_field": -1}));
        model.set("int_field", 1);
        assert!(!model.is_missing("int_field"));
        assert_eq!(JsonValue::Object(model.dump().unwrap()), json!({"int_field": 1}));
    }

    #[test]
    fn test_value_round_trip_keeps_identity() {
        let registry = ModelRegistry::new();
        let model = optional(&registry).construct(Kwargs::new()).unwrap();
        let back = Model::from_value(&model.to_value()).unwrap();
        assert!(back.ptr_eq(&model));
        assert_eq!(back.id(), model.id());
        assert!(Model::from_value(&Value::from("x")).is_none());
    }

    #[test]
    fn test_debug_and_display() {
        let registry = ModelRegistry::new();
        let model = optional(&registry).construct(Kwargs::new()).unwrap();
        assert_eq!(
            format!("{:?}", model),
            r#"Optional(**{"str_field":"foo","int_field":-1})"#
        );
        assert!(model.to_string().contains("\"str_field\": \"foo\""));
    }
}
