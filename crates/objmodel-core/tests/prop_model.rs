//! Property tests: loading a dump gives back an equal instance

use objmodel_core::{fields, nested_models, LoadOptions, ModelBuilder, ModelClass, ModelRegistry};
use proptest::prelude::*;
use serde_json::{json, Value as JsonValue};
use std::sync::OnceLock;

fn order_class() -> &'static ModelClass {
    static CLASS: OnceLock<ModelClass> = OnceLock::new();
    CLASS.get_or_init(|| {
        let registry = ModelRegistry::new();
        let line = ModelBuilder::new("Line")
            .registry(&registry)
            .field("sku", fields::string().required())
            .field("qty", fields::integer())
            .build()
            .unwrap();
        ModelBuilder::new("Order")
            .registry(&registry)
            .field("id", fields::integer().required())
            .field("note", fields::string().allow_none(true))
            .field("paid", fields::boolean())
            .field("lines", nested_models(&line))
            .build()
            .unwrap()
    })
}

fn line() -> impl Strategy<Value = JsonValue> {
    ("[a-z]{1,8}", proptest::option::of(0i64..1000)).prop_map(|(sku, qty)| {
        let mut map = serde_json::Map::new();
        map.insert("sku".to_string(), json!(sku));
        if let Some(qty) = qty {
            map.insert("qty".to_string(), json!(qty));
        }
        JsonValue::Object(map)
    })
}

fn order() -> impl Strategy<Value = JsonValue> {
    (
        any::<i64>(),
        proptest::option::of(proptest::option::of("[ -~]{0,16}")),
        proptest::option::of(any::<bool>()),
        proptest::collection::vec(line(), 0..4),
    )
        .prop_map(|(id, note, paid, lines)| {
            let mut map = serde_json::Map::new();
            map.insert("id".to_string(), json!(id));
            if let Some(note) = note {
                map.insert("note".to_string(), json!(note));
            }
            if let Some(paid) = paid {
                map.insert("paid".to_string(), json!(paid));
            }
            map.insert("lines".to_string(), JsonValue::Array(lines));
            JsonValue::Object(map)
        })
}

proptest! {
    #[test]
    fn prop_dump_reloads_equal(data in order()) {
        let class = order_class();
        let model = class.load_one(data.clone(), LoadOptions::new()).unwrap();
        let dumped = JsonValue::Object(model.dump().unwrap());
        prop_assert_eq!(&dumped, &data);

        let again = class.load_one(dumped, LoadOptions::new()).unwrap();
        prop_assert_eq!(again, model);
    }

    #[test]
    fn prop_copy_is_equal(data in order()) {
        let model = order_class().load_one(data, LoadOptions::new()).unwrap();
        let copy = model.copy().unwrap();
        prop_assert!(!copy.ptr_eq(&model));
        prop_assert_eq!(copy, model);
    }
}
