//! Fields holding other models
//!
//! A [`NestedModel`] field loads its value through another model's schema.
//! The target is either a class or a name looked up in a registry when the
//! field is first used, which allows forward and circular references.
//! Values that already are instances are kept as they are.

use crate::class::ModelClass;
use crate::instance::Model;
use crate::registry::ModelRegistry;
use objmodel_schema::fields::{Nested, NestedTarget};
use objmodel_schema::{DumpContext, ErrorMessages, Field, FieldKind, LoadContext, Value};
use serde_json::Value as JsonValue;
use tracing::trace;

/// A schema only points back to its class weakly, so a field aimed at a
/// class keeps that class alive for as long as the field exists.
#[derive(Debug, Clone)]
pub struct NestedModel {
    inner: Nested,
    class: Option<ModelClass>,
}

impl NestedModel {
    pub fn to(class: &ModelClass, many: bool) -> Self {
        Self {
            inner: Nested::new(NestedTarget::Schema(class.schema().clone()), many),
            class: Some(class.clone()),
        }
    }

    /// Refer to a class by name in the global registry
    pub fn named<N: Into<String>>(name: N, many: bool) -> Self {
        Self::named_in(ModelRegistry::global(), name, many)
    }

    pub fn named_in<N: Into<String>>(registry: &ModelRegistry, name: N, many: bool) -> Self {
        Self {
            inner: Nested::new(NestedTarget::deferred(name, registry.resolver()), many),
            class: None,
        }
    }

    /// The class this field was aimed at directly, if any
    pub fn class(&self) -> Option<&ModelClass> {
        self.class.as_ref()
    }

    pub fn target(&self) -> &NestedTarget {
        self.inner.target()
    }

    pub fn is_many(&self) -> bool {
        self.inner.is_many()
    }
}

/// Whether `value` is already constructed and skips loading
fn is_constructed(value: &Value, many: bool) -> bool {
    match value {
        Value::Object(_) => Model::from_value(value).is_some(),
        Value::List(items) if many => items
            .first()
            .is_some_and(|first| Model::from_value(first).is_some()),
        _ => false,
    }
}

impl FieldKind for NestedModel {
    fn name(&self) -> &'static str {
        "nested_model"
    }

    fn deserialize(&self, value: Value, ctx: &LoadContext<'_>) -> Result<Value, ErrorMessages> {
        if is_constructed(&value, self.inner.is_many()) {
            trace!(field = ctx.field, "kept constructed instance");
            return Ok(value);
        }
        self.inner.deserialize(value, ctx)
    }

    fn serialize(&self, value: Value, ctx: &DumpContext<'_>) -> Result<JsonValue, ErrorMessages> {
        self.inner.serialize(value, ctx)
    }
}

/// Field holding one instance of `class`
pub fn nested_model(class: &ModelClass) -> Field {
    Field::new(NestedModel::to(class, false))
}

/// Field holding a list of instances of `class`
pub fn nested_models(class: &ModelClass) -> Field {
    Field::new(NestedModel::to(class, true))
}

/// Field holding one instance of the class registered globally as `name`
pub fn nested_model_named<N: Into<String>>(name: N) -> Field {
    Field::new(NestedModel::named(name, false))
}

/// Field holding a list of instances of the class registered globally as `name`
pub fn nested_models_named<N: Into<String>>(name: N) -> Field {
    Field::new(NestedModel::named(name, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ModelBuilder;
    use crate::kwargs::Kwargs;
    use objmodel_schema::{fields, LoadOptions};
    use serde_json::json;

    #[test]
    fn test_instance_passes_through() {
        let registry = ModelRegistry::new();
        let leaf = ModelBuilder::new("Leaf")
            .registry(&registry)
            .field("v", fields::string())
            .build()
            .unwrap();
        let holder = ModelBuilder::new("Holder")
            .registry(&registry)
            .field("leaf", nested_model(&leaf))
            .field("leaves", nested_models(&leaf))
            .build()
            .unwrap();

        let one = leaf.construct(Kwargs::new().set("v", "x")).unwrap();
        let two = leaf.construct(Kwargs::new().set("v", "y")).unwrap();
        let model = holder
            .construct(
                Kwargs::new()
                    .set("leaf", &one)
                    .set("leaves", Model::list([two.clone()])),
            )
            .unwrap();
        assert!(model.get_model("leaf").unwrap().ptr_eq(&one));
        assert!(model.get_models("leaves")[0].ptr_eq(&two));
        assert!(NestedModel::to(&leaf, false).class().unwrap().ptr_eq(&leaf));
        assert!(NestedModel::named_in(&registry, "Leaf", false).class().is_none());
    }

    #[test]
    fn test_loads_after_nested_class_handle_is_dropped() {
        let outer = {
            let registry = ModelRegistry::new();
            let inner = ModelBuilder::new("Inner")
                .registry(&registry)
                .field("v", fields::string())
                .build()
                .unwrap();
            ModelBuilder::new("Outer")
                .registry(&registry)
                .field("inner", nested_model(&inner))
                .field("inners", nested_models(&inner))
                .build()
                .unwrap()
        };
        let model = outer
            .load_one(
                Value::from(json!({"inner": {"v": "x"}, "inners": [{"v": "y"}]})),
                LoadOptions::new(),
            )
            .unwrap();
        let inner = model.get_model("inner").unwrap();
        assert_eq!(inner.class().name(), "Inner");
        assert_eq!(inner.get_str("v").as_deref(), Some("x"));
        assert_eq!(model.get_models("inners")[0].get_str("v").as_deref(), Some("y"));
    }

    #[test]
    fn test_named_target_resolves_late() {
        let registry = ModelRegistry::new();
        let node = ModelBuilder::new("Node")
            .registry(&registry)
            .field("name", fields::string())
            .field("child", Field::new(NestedModel::named_in(&registry, "Node", false)))
            .build()
            .unwrap();
        let model = node
            .load_one(
                Value::from(json!({"name": "root", "child": {"name": "leaf"}})),
                LoadOptions::new(),
            )
            .unwrap();
        let child = model.get_model("child").unwrap();
        assert_eq!(child.get_str("name").as_deref(), Some("leaf"));
        assert!(child.class().ptr_eq(&node));
    }

    #[test]
    fn test_unknown_name_fails_validation() {
        let registry = ModelRegistry::new();
        let holder = ModelBuilder::new("Dangling")
            .registry(&registry)
            .field("other", Field::new(NestedModel::named_in(&registry, "Missing", false)))
            .build()
            .unwrap();
        let err = holder
            .load_one(Value::from(json!({"other": {}})), LoadOptions::new())
            .unwrap_err();
        let messages = err.validation().unwrap().flatten();
        assert_eq!(
            messages,
            vec![("other".to_string(), vec!["The class 'Missing' not found".to_string()])]
        );
    }
}
