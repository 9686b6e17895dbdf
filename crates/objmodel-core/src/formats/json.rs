//! JSON text

use crate::class::{Loaded, ModelClass};
use crate::error::Result;
use crate::instance::Model;
use objmodel_schema::{LoadOptions, Value};
use serde_json::Value as JsonValue;
use tracing::debug;

impl ModelClass {
    /// Parse `text` as JSON and load it
    pub fn load_json(&self, text: &str, options: LoadOptions) -> Result<Loaded> {
        let data: JsonValue = serde_json::from_str(text)?;
        debug!(model = %self.name(), bytes = text.len(), "decoded JSON input");
        self.load(Value::from(data), options)
    }
}

impl Model {
    /// Dump as compact JSON
    pub fn dump_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&JsonValue::Object(self.dump()?))?)
    }

    pub fn dump_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&JsonValue::Object(self.dump()?))?)
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::ModelBuilder;
    use crate::error::ModelError;
    use crate::registry::ModelRegistry;
    use objmodel_schema::{fields, LoadOptions};

    #[test]
    fn test_json_round_trip() {
        let registry = ModelRegistry::new();
        let class = ModelBuilder::new("Point")
            .registry(&registry)
            .field("x", fields::integer())
            .field("y", fields::integer())
            .build()
            .unwrap();
        let model = class
            .load_json(r#"{"x": 1, "y": "2"}"#, LoadOptions::new())
            .unwrap()
            .into_one()
            .unwrap();
        assert_eq!(model.dump_json().unwrap(), r#"{"x":1,"y":2}"#);

        let many = class
            .load_json(r#"[{"x": 1}, {"y": 2}]"#, LoadOptions::new().many(true))
            .unwrap();
        assert_eq!(many.len(), 2);
    }

    #[test]
    fn test_bad_json_is_json_error() {
        let registry = ModelRegistry::new();
        let class = ModelBuilder::new("Point").registry(&registry).build().unwrap();
        let err = class.load_json("{", LoadOptions::new()).unwrap_err();
        assert!(matches!(err, ModelError::Json { .. }));
    }
}
