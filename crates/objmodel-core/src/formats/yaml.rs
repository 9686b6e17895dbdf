//! YAML text

use crate::class::{Loaded, ModelClass};
use crate::error::Result;
use crate::instance::Model;
use objmodel_schema::{LoadOptions, Value};
use serde_json::Value as JsonValue;
use tracing::debug;

impl ModelClass {
    /// Parse `text` as YAML and load it. Mapping keys must be strings.
    pub fn load_yaml(&self, text: &str, options: LoadOptions) -> Result<Loaded> {
        let data: JsonValue = serde_yaml::from_str(text)?;
        debug!(model = %self.name(), bytes = text.len(), "decoded YAML input");
        self.load(Value::from(data), options)
    }
}

impl Model {
    /// Dump as block-style YAML
    pub fn dump_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&JsonValue::Object(self.dump()?))?)
    }
}
