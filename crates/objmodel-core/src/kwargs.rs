//! Keyword arguments for direct construction
//!
//! Direct construction takes field values and the meta keywords
//! `context`, `partial`, `many` and `unknown` in one bag. The meta keywords
//! become [`LoadOptions`]; everything else is load input.

use crate::error::{ModelError, Result};
use objmodel_schema::{Context, LoadOptions, Partial, UnknownPolicy, Value, ValueMap};

const CONTEXT: &str = "context";
const PARTIAL: &str = "partial";
const MANY: &str = "many";
const UNKNOWN: &str = "unknown";

/// Field values plus load options
#[derive(Debug, Clone, Default)]
pub struct Kwargs {
    fields: ValueMap,
    options: LoadOptions,
}

impl Kwargs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split a raw keyword mapping, pulling out the meta keywords
    pub fn from_map(mut map: ValueMap) -> Result<Self> {
        let mut options = LoadOptions::new();

        if let Some(value) = map.shift_remove(CONTEXT) {
            options.context = match value {
                Value::Null => None,
                Value::Map(_) => value
                    .to_json()
                    .and_then(Context::from_json)
                    .map(Some)
                    .ok_or_else(|| keyword_error(CONTEXT, "must contain plain data"))?,
                other => return Err(keyword_error(CONTEXT, expected("a mapping", &other))),
            };
        }

        if let Some(value) = map.shift_remove(PARTIAL) {
            options.partial = match value {
                Value::Null => Partial::Off,
                Value::Bool(all) => Partial::from(all),
                Value::List(items) => {
                    let names = items
                        .iter()
                        .map(|item| item.as_str().map(str::to_string))
                        .collect::<Option<Vec<_>>>()
                        .ok_or_else(|| keyword_error(PARTIAL, "field names must be strings"))?;
                    Partial::fields(names)
                }
                other => {
                    return Err(keyword_error(PARTIAL, expected("a bool or a list of names", &other)))
                }
            };
        }

        if let Some(value) = map.shift_remove(MANY) {
            options.many = match value {
                Value::Null => false,
                Value::Bool(many) => many,
                other => return Err(keyword_error(MANY, expected("a bool", &other))),
            };
        }

        if let Some(value) = map.shift_remove(UNKNOWN) {
            options.unknown = match value {
                Value::Null => None,
                Value::Str(policy) => Some(
                    policy
                        .parse::<UnknownPolicy>()
                        .map_err(|message| keyword_error(UNKNOWN, message))?,
                ),
                other => return Err(keyword_error(UNKNOWN, expected("a string", &other))),
            };
        }

        Ok(Self {
            fields: map,
            options,
        })
    }

    /// Add a field value
    pub fn set<N: Into<String>, V: Into<Value>>(mut self, name: N, value: V) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn context(mut self, context: Context) -> Self {
        self.options.context = Some(context);
        self
    }

    pub fn partial(mut self, partial: bool) -> Self {
        self.options.partial = Partial::from(partial);
        self
    }

    pub fn partial_fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.partial = Partial::fields(names);
        self
    }

    pub fn many(mut self, many: bool) -> Self {
        self.options.many = many;
        self
    }

    pub fn unknown(mut self, unknown: UnknownPolicy) -> Self {
        self.options.unknown = Some(unknown);
        self
    }

    pub fn fields(&self) -> &ValueMap {
        &self.fields
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    pub fn into_parts(self) -> (ValueMap, LoadOptions) {
        (self.fields, self.options)
    }
}

fn keyword_error<M: Into<String>>(keyword: &str, message: M) -> ModelError {
    ModelError::Keyword {
        keyword: keyword.to_string(),
        message: message.into(),
    }
}

fn expected(what: &str, got: &Value) -> String {
    format!("expected {}, got {}", what, got.type_label())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: serde_json::Value) -> ValueMap {
        match Value::from(value) {
            Value::Map(map) => map,
            other => panic!("not a mapping: {:?}", other),
        }
    }

    #[test]
    fn test_meta_keywords_are_extracted() {
        let kwargs = Kwargs::from_map(map(json!({
            "test_field": "foo",
            "context": {"value": "bar"},
            "partial": ["a.test_field"],
            "many": false,
            "unknown": "EXCLUDE",
        })))
        .unwrap();
        assert_eq!(kwargs.fields().keys().collect::<Vec<_>>(), vec!["test_field"]);
        let options = kwargs.options();
        assert_eq!(
            options.context.as_ref().and_then(|c| c.get("value")),
            Some(json!("bar"))
        );
        assert_eq!(options.partial, Partial::fields(["a.test_field"]));
        assert!(!options.many);
        assert_eq!(options.unknown, Some(UnknownPolicy::Exclude));
    }

    #[test]
    fn test_bad_keyword_shapes() {
        let err = Kwargs::from_map(map(json!({"many": "yes"}))).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid keyword argument 'many': expected a bool, got string"
        );
        let err = Kwargs::from_map(map(json!({"unknown": "sometimes"}))).unwrap_err();
        assert!(matches!(err, ModelError::Keyword { ref keyword, .. } if keyword == "unknown"));
        assert!(Kwargs::from_map(map(json!({"partial": [1]}))).is_err());
        assert!(Kwargs::from_map(map(json!({"context": 3}))).is_err());
    }

    #[test]
    fn test_builder_methods() {
        let context = Context::new().with("k", 1);
        let (fields, options) = Kwargs::new()
            .set("a", 1)
            .context(context.clone())
            .partial(true)
            .into_parts();
        assert_eq!(fields.get("a"), Some(&Value::Int(1)));
        assert!(options.context.unwrap().ptr_eq(&context));
        assert_eq!(options.partial, Partial::All);
    }
}
