//! Schema synthesis
//!
//! Turns a harvested body plus parent classes into a [`ModelClass`]: the
//! schema is derived from the parents' schemas (or the root schema), gets a
//! post-load hook that builds instances, and is bound back to its class.
//!
//! Copyright (c) 2025 Objmodel Team
//! Licensed under the Apache-2.0 license

use crate::body::Harvested;
use crate::class::{ClassInner, InitFn, ModelClass};
use crate::error::{ModelError, Result};
use crate::instance::Model;
use crate::registry::ModelRegistry;
use indexmap::IndexMap;
use objmodel_schema::{Hook, HookContext, Schema, SchemaDefinition, ValidationError, Value, ValueMap};
use std::any::Any;
use std::sync::{Arc, Weak};
use tracing::debug;

/// Name of the injected post-load hook that builds instances. It always
/// runs before the model's own post-load hooks.
pub const MAKE_OBJECT_HOOK: &str = "__make_object__";

/// Everything needed to create a class
pub(crate) struct ClassSpec {
    pub(crate) name: String,
    pub(crate) parents: Vec<ModelClass>,
    pub(crate) harvested: Harvested,
    pub(crate) init: Option<InitFn>,
}

pub(crate) fn synthesize(spec: ClassSpec, registry: &ModelRegistry) -> Result<ModelClass> {
    let ClassSpec {
        name,
        parents,
        harvested,
        init,
    } = spec;
    let Harvested {
        definition,
        attributes: own_attributes,
        methods,
    } = harvested;

    let mut hooks = IndexMap::new();
    hooks.insert(MAKE_OBJECT_HOOK.to_string(), Hook::post_load(make_object));
    hooks.extend(definition.hooks);
    let definition = SchemaDefinition {
        hooks,
        ..definition
    };

    let bases: Vec<Arc<Schema>> = parents.iter().map(|parent| parent.schema().clone()).collect();
    let schema = Schema::derive(format!("{}Schema", name), bases, definition).map_err(|source| {
        ModelError::Definition {
            model: name.clone(),
            source,
        }
    })?;

    let mut attributes = ValueMap::new();
    for parent in parents.iter().rev() {
        for (key, value) in parent.attributes() {
            attributes.insert(key.clone(), value.clone());
        }
    }
    attributes.extend(own_attributes);
    let init = init.or_else(|| parents.iter().find_map(|parent| parent.init().cloned()));

    let inner = Arc::new(ClassInner {
        name,
        schema,
        parents,
        attributes,
        methods,
        init,
    });
    let erased: Arc<dyn Any + Send + Sync> = inner.clone();
    let owner: Weak<dyn Any + Send + Sync> = Arc::downgrade(&erased);
    inner
        .schema
        .bind_owner(owner)
        .map_err(|source| ModelError::Definition {
            model: inner.name.clone(),
            source,
        })?;

    let class = ModelClass::from_inner(inner);
    debug!(
        model = %class.name(),
        schema = %class.schema().name(),
        parents = class.parents().len(),
        fields = class.schema().fields().len(),
        "synthesized model class"
    );
    registry.register(class.clone());
    Ok(class)
}

/// Replace a loaded mapping with an instance of the schema's class
fn make_object(value: Value, ctx: &HookContext<'_>) -> std::result::Result<Value, ValidationError> {
    let data = match value {
        Value::Map(data) => data,
        other => return Ok(other),
    };
    let schema = ctx.schema.schema();
    let class = ModelClass::from_schema(schema).ok_or_else(|| {
        ValidationError::schema_level(format!("No model class is bound to {}", schema.name()))
    })?;
    Model::from_validated(class, ctx.schema.clone(), data).map(Value::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ModelBuilder;
    use objmodel_schema::{fields, BoundSchema, LoadOptions, SchemaMeta};
    use serde_json::json;

    #[test]
    fn test_construct_hook_runs_first() {
        let registry = ModelRegistry::new();
        let class = ModelBuilder::new("Tagged")
            .registry(&registry)
            .field("test_field", fields::string())
            .field("tag_field", fields::string().load_only())
            .post_load_model("set_tag_field", |model, _| {
                model.set("tag_field", model.get("test_field").unwrap_or_default());
                Ok(())
            })
            .build()
            .unwrap();
        let names: Vec<&str> = class.schema().hooks().keys().map(String::as_str).collect();
        assert_eq!(names, vec![MAKE_OBJECT_HOOK, "set_tag_field"]);

        let model = class
            .load_one(Value::from(json!({"test_field": "x", "tag_field": "fake"})), LoadOptions::new())
            .unwrap();
        assert_eq!(model.get_str("tag_field").as_deref(), Some("x"));
    }

    #[test]
    fn test_parents_merge_attributes_and_init() {
        let registry = ModelRegistry::new();
        let base = ModelBuilder::new("Base")
            .registry(&registry)
            .field("a", fields::string())
            .attribute("kind", "base")
            .attribute("shared", 1)
            .init(|model, _| {
                model.set("initialized", true);
                Ok(())
            })
            .build()
            .unwrap();
        let child = ModelBuilder::new("Child")
            .registry(&registry)
            .extends(&base)
            .field("b", fields::string())
            .attribute("kind", "child")
            .build()
            .unwrap();

        assert_eq!(child.schema().name(), "ChildSchema");
        assert!(child.schema().is_derived_from(base.schema()));
        assert!(child.is_subclass_of(&base));
        assert_eq!(child.attribute("kind"), Some(Value::from("child")));
        assert_eq!(child.attribute("shared"), Some(Value::Int(1)));

        let model = child
            .load_one(Value::from(json!({"a": "1", "b": "2"})), LoadOptions::new())
            .unwrap();
        assert_eq!(model.get_bool("initialized"), Some(true));
        assert!(model.class().ptr_eq(&child));
    }

    #[test]
    fn test_hand_derived_schema_finds_class() {
        let registry = ModelRegistry::new();
        let class = ModelBuilder::new("Plain")
            .registry(&registry)
            .field("a", fields::string())
            .build()
            .unwrap();
        let derived = Schema::derive(
            "PlainExtraSchema",
            vec![class.schema().clone()],
            SchemaDefinition::new().meta(SchemaMeta::new().ordered(false)),
        )
        .unwrap();
        let loaded = BoundSchema::new(derived)
            .load(Value::from(json!({"a": "x"})), false)
            .unwrap();
        let model = Model::from_value(&loaded).unwrap();
        assert!(model.class().ptr_eq(&class));
    }
}
