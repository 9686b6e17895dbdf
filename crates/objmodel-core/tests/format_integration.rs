//! Integration tests for the text formats and collection dumps


use test_support::models;
use objmodel_core::{
    dump_many, dump_many_json, dump_many_yaml, Context, Kwargs, LoadOptions, ModelError, Value,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value as JsonValue};

const INI: &str = "[DEFAULT]\ntest_field = foo\n\n[a]\ntest_field = bar";

fn many_data() -> JsonValue {
    json!([
        {"test_field": "foo", "a": {"test_field": "bar"}},
        {"test_field": "foo", "a": {"test_field": "bar"}},
    ])
}

fn as_values(models: Vec<objmodel_core::Model>) -> Vec<Value> {
    models.into_iter().map(Value::from).collect()
}

#[test]
fn test_ini_load() {
    let b = models().b.load_ini(INI, LoadOptions::new()).unwrap();
    assert_eq!(b.get_str("test_field").as_deref(), Some("foo"));
    let a = b.get_model("a").unwrap();
    assert_eq!(a.get_str("test_field").as_deref(), Some("bar"));
}

#[test]
fn test_ini_dump() {
    let b = models()
        .b
        .construct(
            Kwargs::new()
                .set("test_field", "foo")
                .set("a", Value::from(json!({"test_field": "bar"}))),
        )
        .unwrap();
    assert_eq!(b.dump_ini().unwrap(), INI);
}

#[test]
fn test_ini_dump_rejects_list_field() {
    let c = models()
        .c
        .construct(Kwargs::new().set("a", Value::from(json!([{"test_field": "x"}]))))
        .unwrap();
    match c.dump_ini() {
        Err(ModelError::IniValue { key, .. }) => assert_eq!(key, "a"),
        other => panic!("expected INI value error, got {:?}", other),
    }
}

#[test]
fn test_ini_parse_error() {
    let err = models().b.load_ini("test_field = foo", LoadOptions::new()).unwrap_err();
    assert!(matches!(err, ModelError::Ini { line: 1, .. }));
}

#[test]
fn test_json_load_and_dump() {
    let m = models();
    let a = m
        .a
        .load_json(r#"{"test_field": "foo"}"#, LoadOptions::new())
        .unwrap()
        .into_one()
        .unwrap();
    assert_eq!(a.get_str("test_field").as_deref(), Some("foo"));
    let text = a.dump_json().unwrap();
    assert_eq!(
        serde_json::from_str::<JsonValue>(&text).unwrap(),
        json!({"test_field": "foo"})
    );
}

#[test]
fn test_json_partial() {
    let b = models()
        .b
        .load_json("{}", LoadOptions::new().partial(true))
        .unwrap()
        .into_one()
        .unwrap();
    assert_eq!(b.get("a"), Some(Value::Null));
}

#[test]
fn test_yaml_load_and_dump() {
    let m = models();
    let a = m
        .a
        .load_yaml("test_field: foo\n", LoadOptions::new())
        .unwrap()
        .into_one()
        .unwrap();
    assert_eq!(a.get_str("test_field").as_deref(), Some("foo"));
    assert_eq!(a.dump_yaml().unwrap(), "test_field: foo\n");

    let b = m
        .b
        .load_yaml("{}", LoadOptions::new().partial(true))
        .unwrap()
        .into_one()
        .unwrap();
    assert_eq!(b.get("a"), Some(Value::Null));
}

#[test]
fn test_many_from_json_and_yaml() {
    let m = models();
    let text = serde_json::to_string(&many_data()).unwrap();
    let from_json = m.b.load_json(&text, LoadOptions::new().many(true)).unwrap();
    assert_eq!(from_json.len(), 2);

    let yaml = serde_yaml::to_string(&many_data()).unwrap();
    let from_yaml = m
        .b
        .load_yaml(&yaml, LoadOptions::new().many(true))
        .unwrap()
        .into_many();
    assert_eq!(from_yaml, from_json.into_many());
}

#[test]
fn test_dump_many_same_class() {
    let bb = models().b.load_many(many_data(), LoadOptions::new()).unwrap();
    let dumped = dump_many(&as_values(bb), None).unwrap();
    assert_eq!(JsonValue::Array(dumped), many_data());
}

#[test]
fn test_dump_many_different_classes() {
    let m = models();
    let bb = m.b.load_many(many_data(), LoadOptions::new()).unwrap();
    let a = m.a.construct(Kwargs::new().set("test_field", "foo")).unwrap();
    let items = vec![Value::List(as_values(bb)), Value::from(a)];
    let dumped = dump_many(&items, None).unwrap();
    assert_eq!(
        JsonValue::Array(dumped),
        json!([many_data(), {"test_field": "foo"}])
    );
}

#[test]
fn test_dump_many_rejects_plain_values() {
    let err = dump_many(&[Value::from("fake")], None).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Validation failed: _schema: The object 'fake' is not an instance of Model class"
    );
}

#[test]
fn test_dump_many_context_override() {
    let context = Context::new().with("value", "bar");
    let bb = models()
        .b_context
        .load_many(many_data(), LoadOptions::new().with_context(context.clone()))
        .unwrap();
    let items = as_values(bb.clone());

    let dumped = dump_many(&items, Some(&Context::new().with("value", "foo"))).unwrap();
    for item in &dumped {
        assert_eq!(item["a"]["test_context_field"], json!(false));
    }
    for b in &bb {
        assert!(b.context().ptr_eq(&context));
        assert!(b.get_model("a").unwrap().context().ptr_eq(&context));
    }

    let own = dump_many(&items, None).unwrap();
    assert_eq!(own[0]["a"]["test_context_field"], json!(true));
}

#[test]
fn test_dump_many_text() {
    let bb = models().b.load_many(many_data(), LoadOptions::new()).unwrap();
    let items = as_values(bb);
    let json_text = dump_many_json(&items, None).unwrap();
    assert_eq!(serde_json::from_str::<JsonValue>(&json_text).unwrap(), many_data());
    let yaml_text = dump_many_yaml(&items, None).unwrap();
    assert_eq!(serde_yaml::from_str::<JsonValue>(&yaml_text).unwrap(), many_data());
}
