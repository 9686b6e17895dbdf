//! Dumping collections of instances
//!
//! [`dump_many`] serializes a sequence that may mix instances of different
//! classes and nested lists of them. An override context, when given,
//! applies to the whole dumped tree; the instances keep their own.

use crate::error::Result;
use crate::instance::Model;
use objmodel_schema::{Context, ValidationError, Value};
use serde_json::Value as JsonValue;
use tracing::debug;

/// Dump every item of `items`; nested lists come out as nested arrays
pub fn dump_many(items: &[Value], context: Option<&Context>) -> Result<Vec<JsonValue>> {
    debug!(items = items.len(), override_context = context.is_some(), "dumping many");
    items.iter().map(|item| dump_item(item, context)).collect()
}

pub fn dump_many_json(items: &[Value], context: Option<&Context>) -> Result<String> {
    Ok(serde_json::to_string(&dump_many(items, context)?)?)
}

pub fn dump_many_yaml(items: &[Value], context: Option<&Context>) -> Result<String> {
    Ok(serde_yaml::to_string(&dump_many(items, context)?)?)
}

fn dump_item(item: &Value, context: Option<&Context>) -> Result<JsonValue> {
    if let Some(model) = Model::from_value(item) {
        let dumped = match context {
            Some(context) => model.dump_with_context(context)?,
            None => model.dump()?,
        };
        return Ok(JsonValue::Object(dumped));
    }
    match item {
        Value::List(items) => Ok(JsonValue::Array(dump_many(items, context)?)),
        other => Err(ValidationError::new(format!(
            "The object '{}' is not an instance of Model class",
            describe(other)
        ))
        .into()),
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Str(text) => text.clone(),
        other => other
            .to_json()
            .map(|json| json.to_string())
            .unwrap_or_else(|| other.type_label().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ModelBuilder;
    use crate::kwargs::Kwargs;
    use crate::registry::ModelRegistry;
    use objmodel_schema::fields;
    use serde_json::json;

    #[test]
    fn test_mixed_and_nested_items() {
        let registry = ModelRegistry::new();
        let a = ModelBuilder::new("A")
            .registry(&registry)
            .field("x", fields::integer())
            .build()
            .unwrap();
        let b = ModelBuilder::new("B")
            .registry(&registry)
            .field("y", fields::string())
            .build()
            .unwrap();
        let one = a.construct(Kwargs::new().set("x", 1)).unwrap();
        let two = b.construct(Kwargs::new().set("y", "z")).unwrap();
        let items = vec![Value::from(&one), Value::List(vec![Value::from(&two)])];
        assert_eq!(
            dump_many(&items, None).unwrap(),
            vec![json!({"x": 1}), json!([{"y": "z"}])]
        );
        assert_eq!(dump_many_json(&items, None).unwrap(), r#"[{"x":1},[{"y":"z"}]]"#);
    }

    #[test]
    fn test_non_instance_is_rejected() {
        let err = dump_many(&[Value::from("fake")], None).unwrap_err();
        assert_eq!(
            err.validation().unwrap().flatten(),
            vec![(
                "_schema".to_string(),
                vec!["The object 'fake' is not an instance of Model class".to_string()]
            )]
        );
    }
}
