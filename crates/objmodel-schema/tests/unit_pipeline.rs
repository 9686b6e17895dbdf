//! Integration tests for the load, validate and dump pipelines

use objmodel_schema::fields::{self, NestedTarget, SchemaResolver};
use objmodel_schema::{
    Attributes, BoundSchema, Context, ErrorMessages, Field, Hook, LoadOptions, Schema,
    SchemaDefinition, SchemaMeta, SchemaMethod, UnknownPolicy, ValidationError, Validator, Value,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn address_schema() -> Arc<Schema> {
    Schema::derive(
        "AddressSchema",
        vec![],
        SchemaDefinition::new()
            .field("street", fields::string().required())
            .field("zip", fields::string().validate(Validator::length(Some(5), Some(5)))),
    )
    .unwrap()
}

fn person_schema() -> Arc<Schema> {
    Schema::derive(
        "PersonSchema",
        vec![],
        SchemaDefinition::new()
            .field("name", fields::string().required())
            .field("email", fields::email())
            .field("active", fields::boolean().load_default(true))
            .field("address", fields::nested(address_schema()))
            .field("tags", fields::list(fields::string())),
    )
    .unwrap()
}

fn messages(err: &ErrorMessages) -> serde_json::Value {
    serde_json::to_value(err).unwrap()
}

#[test]
fn test_load_nested_document() {
    let bound = BoundSchema::new(person_schema());
    let loaded = bound
        .load(
            Value::from(json!({
                "name": "Ada",
                "email": "ada@example.com",
                "address": {"street": "Main", "zip": "12345"},
                "tags": ["a", "b"],
            })),
            false,
        )
        .unwrap();
    assert_eq!(
        loaded.to_json(),
        Some(json!({
            "name": "Ada",
            "email": "ada@example.com",
            "address": {"street": "Main", "zip": "12345"},
            "tags": ["a", "b"],
            "active": true,
        }))
    );
}

#[test]
fn test_nested_errors_are_structured() {
    let bound = BoundSchema::new(person_schema());
    let err = bound
        .load(
            Value::from(json!({
                "name": "Ada",
                "email": "nope",
                "address": {"zip": "1"},
                "tags": ["ok", 3],
            })),
            false,
        )
        .unwrap_err();
    assert_eq!(
        messages(err.messages()),
        json!({
            "email": ["Not a valid email address."],
            "address": {
                "street": ["Missing data for required field."],
                "zip": ["Length must be 5."],
            },
            "tags": {"1": ["Not a valid string."]},
        })
    );
    let paths: Vec<String> = err.flatten().into_iter().map(|(path, _)| path).collect();
    assert!(paths.contains(&"address.street".to_string()));
    assert!(paths.contains(&"tags.1".to_string()));
}

#[test]
fn test_unknown_override_reaches_nested_schema() {
    let data = Value::from(json!({
        "name": "Ada",
        "address": {"street": "Main", "extra": true},
    }));
    let strict = BoundSchema::new(person_schema());
    let err = strict.load(data.clone(), false).unwrap_err();
    assert_eq!(
        messages(err.messages()),
        json!({"address": {"extra": ["Unknown field."]}})
    );

    let options = LoadOptions::new().unknown(UnknownPolicy::Exclude);
    let relaxed = BoundSchema::from_options(person_schema(), &options);
    assert!(relaxed.load(data, false).is_ok());
}

#[test]
fn test_meta_unknown_include() {
    let schema = Schema::derive(
        "OpenSchema",
        vec![],
        SchemaDefinition::new()
            .field("a", fields::integer())
            .meta(SchemaMeta::new().with_unknown(UnknownPolicy::Include)),
    )
    .unwrap();
    let loaded = BoundSchema::new(schema)
        .load(Value::from(json!({"a": "1", "b": "x"})), false)
        .unwrap();
    assert_eq!(loaded.to_json(), Some(json!({"a": 1, "b": "x"})));
}

#[test]
fn test_load_only_and_dump_only() {
    let schema = Schema::derive(
        "AccountSchema",
        vec![],
        SchemaDefinition::new()
            .field("user", fields::string())
            .field("password", fields::string().load_only())
            .field("created", fields::string().dump_only()),
    )
    .unwrap();
    let bound = BoundSchema::new(schema);

    let err = bound
        .load(Value::from(json!({"user": "u", "created": "now"})), false)
        .unwrap_err();
    assert_eq!(messages(err.messages()), json!({"created": ["Unknown field."]}));

    let dumped = bound
        .dump(&Value::from(json!({"user": "u", "password": "p", "created": "now"})))
        .unwrap();
    assert_eq!(
        serde_json::Value::Object(dumped),
        json!({"user": "u", "created": "now"})
    );
}

fn text(obj: &dyn Attributes, name: &str) -> String {
    obj.attribute(name)
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

fn prefixed_first(
    obj: &dyn Attributes,
    context: &Context,
) -> Result<serde_json::Value, ValidationError> {
    let prefix = context
        .get("prefix")
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    Ok(json!(format!("{}{}", prefix, text(obj, "first"))))
}

#[test]
fn test_method_and_function_fields_use_whole_object() {
    let schema = Schema::derive(
        "ComputedSchema",
        vec![],
        SchemaDefinition::new()
            .field("first", fields::string())
            .field("last", fields::string())
            .field("full", fields::method(Some("full_name"), None))
            .field(
                "prefixed",
                fields::function(Some(Arc::new(prefixed_first)), None),
            )
            .method(
                "full_name",
                SchemaMethod::serialize(|obj, _| {
                    Ok(json!(format!("{} {}", text(obj, "first"), text(obj, "last"))))
                }),
            ),
    )
    .unwrap();

    let context = Context::new().with("prefix", "Dr. ");
    let bound = BoundSchema::from_options(schema, &LoadOptions::new().with_context(context));
    let dumped = bound
        .dump(&Value::from(json!({"first": "Ada", "last": "Lovelace"})))
        .unwrap();
    assert_eq!(
        serde_json::Value::Object(dumped),
        json!({
            "first": "Ada",
            "last": "Lovelace",
            "full": "Ada Lovelace",
            "prefixed": "Dr. Ada",
        })
    );
}

#[test]
fn test_deferred_target_resolves_at_use() {
    let resolver: SchemaResolver = Arc::new(|name: &str| {
        if name == "Address" {
            Ok(address_schema())
        } else {
            Err(format!("The class '{}' not found", name))
        }
    });
    let schema = Schema::derive(
        "HolderSchema",
        vec![],
        SchemaDefinition::new()
            .field(
                "home",
                Field::new(fields::Nested::new(
                    NestedTarget::deferred("Address", resolver.clone()),
                    false,
                )),
            )
            .field(
                "work",
                Field::new(fields::Nested::new(
                    NestedTarget::deferred("Office", resolver),
                    false,
                )),
            ),
    )
    .unwrap();
    let bound = BoundSchema::new(schema);
    assert!(bound
        .load(Value::from(json!({"home": {"street": "Main"}})), false)
        .is_ok());
    let err = bound
        .load(Value::from(json!({"work": {}})), false)
        .unwrap_err();
    assert_eq!(
        messages(err.messages()),
        json!({"work": ["The class 'Office' not found"]})
    );
}

#[test]
fn test_post_load_replaces_value() {
    let schema = Schema::derive(
        "CountSchema",
        vec![],
        SchemaDefinition::new()
            .field("items", fields::list(fields::integer()))
            .hook(
                "total",
                Hook::post_load(|value, _| {
                    let total: i64 = value
                        .as_map()
                        .and_then(|map| map.get("items"))
                        .and_then(Value::as_list)
                        .map(|items| items.iter().filter_map(Value::as_i64).sum())
                        .unwrap_or(0);
                    Ok(Value::Int(total))
                }),
            ),
    )
    .unwrap();
    let bound = BoundSchema::new(schema);
    assert_eq!(
        bound.load(Value::from(json!({"items": [1, "2", 3]})), false),
        Ok(Value::Int(6))
    );
    let many = bound
        .load(Value::from(json!([{"items": [1]}, {"items": []}])), true)
        .unwrap();
    assert_eq!(many, Value::List(vec![Value::Int(1), Value::Int(0)]));
}

#[test]
fn test_hook_error_lands_under_schema_key() {
    let schema = Schema::derive(
        "RejectSchema",
        vec![],
        SchemaDefinition::new().field("a", fields::integer()).hook(
            "reject",
            Hook::post_load(|_, _| Err(ValidationError::new("Rejected."))),
        ),
    )
    .unwrap();
    let err = BoundSchema::new(schema)
        .load(Value::from(json!({"a": 1})), false)
        .unwrap_err();
    assert_eq!(messages(err.messages()), json!({"_schema": ["Rejected."]}));
}
