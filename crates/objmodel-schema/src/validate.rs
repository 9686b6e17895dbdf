//! Field validators

use crate::error::{ErrorMessages, ValidationError};
use crate::value::Value;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Closure run against a deserialized value
pub type ValidateFn = Arc<dyn Fn(&Value) -> Result<(), ValidationError> + Send + Sync>;

/// A named check applied after a field has been coerced
#[derive(Clone)]
pub struct Validator {
    name: String,
    check: ValidateFn,
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator").field("name", &self.name).finish()
    }
}

impl Validator {
    pub fn new<N, F>(name: N, check: F) -> Self
    where
        N: Into<String>,
        F: Fn(&Value) -> Result<(), ValidationError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Length bounds for strings, lists and mappings
    pub fn length(min: Option<usize>, max: Option<usize>) -> Self {
        Self::new("length", move |value| {
            let len = match value {
                Value::Str(s) => s.chars().count(),
                Value::List(items) => items.len(),
                Value::Map(map) => map.len(),
                _ => return Ok(()),
            };
            let message = match (min, max) {
                (Some(lo), Some(hi)) if len < lo || len > hi => {
                    if lo == hi {
                        format!("Length must be {}.", lo)
                    } else {
                        format!("Length must be between {} and {}.", lo, hi)
                    }
                }
                (Some(lo), None) if len < lo => format!("Shorter than minimum length {}.", lo),
                (None, Some(hi)) if len > hi => format!("Longer than maximum length {}.", hi),
                _ => return Ok(()),
            };
            Err(ValidationError::new(message))
        })
    }

    /// Inclusive numeric bounds
    pub fn range(min: Option<f64>, max: Option<f64>) -> Self {
        Self::new("range", move |value| {
            let Some(n) = value.as_f64() else {
                return Ok(());
            };
            let too_low = min.is_some_and(|lo| n < lo);
            let too_high = max.is_some_and(|hi| n > hi);
            if !too_low && !too_high {
                return Ok(());
            }
            let message = match (min, max) {
                (Some(lo), Some(hi)) => format!(
                    "Must be greater than or equal to {} and less than or equal to {}.",
                    lo, hi
                ),
                (Some(lo), None) => format!("Must be greater than or equal to {}.", lo),
                (None, Some(hi)) => format!("Must be less than or equal to {}.", hi),
                (None, None) => return Ok(()),
            };
            Err(ValidationError::new(message))
        })
    }

    /// Value must equal one of `choices`
    pub fn one_of(choices: Vec<Value>) -> Self {
        Self::new("one_of", move |value| {
            if choices.iter().any(|choice| choice == value) {
                return Ok(());
            }
            let rendered: Vec<String> = choices.iter().map(render).collect();
            Err(ValidationError::new(format!(
                "Must be one of: {}.",
                rendered.join(", ")
            )))
        })
    }

    /// Strings must match `pattern` somewhere; anchor it to match whole
    pub fn regexp(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(pattern)?;
        Ok(Self::new("regexp", move |value| match value {
            Value::Str(s) if !regex.is_match(s) => Err(ValidationError::new(
                "String does not match expected pattern.",
            )),
            _ => Ok(()),
        }))
    }

    pub fn check(&self, value: &Value) -> Result<(), ErrorMessages> {
        (self.check)(value).map_err(ValidationError::into_messages)
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::Str(s) => s.clone(),
        other => other
            .to_json()
            .map(|json| json.to_string())
            .unwrap_or_else(|| other.type_label().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_bounds() {
        let validator = Validator::length(Some(2), None);
        assert!(validator.check(&Value::from("ab")).is_ok());
        assert_eq!(
            validator.check(&Value::from("a")),
            Err(ErrorMessages::message("Shorter than minimum length 2."))
        );
        assert!(Validator::length(Some(1), Some(3))
            .check(&Value::List(vec![]))
            .is_err());
    }

    #[test]
    fn test_range_message() {
        let validator = Validator::range(Some(0.0), Some(10.0));
        assert!(validator.check(&Value::Int(10)).is_ok());
        assert_eq!(
            validator.check(&Value::Int(11)),
            Err(ErrorMessages::message(
                "Must be greater than or equal to 0 and less than or equal to 10."
            ))
        );
    }

    #[test]
    fn test_one_of() {
        let validator = Validator::one_of(vec![Value::from("a"), Value::from("b")]);
        assert!(validator.check(&Value::from("b")).is_ok());
        assert_eq!(
            validator.check(&Value::from("c")),
            Err(ErrorMessages::message("Must be one of: a, b."))
        );
    }

    #[test]
    fn test_regexp() {
        let validator = Validator::regexp(r"^[a-z]+-\d+$").unwrap();
        assert_eq!(validator.name(), "regexp");
        assert!(validator.check(&Value::from("item-42")).is_ok());
        assert!(validator.check(&Value::Int(3)).is_ok());
        assert_eq!(
            validator.check(&Value::from("Item-42")),
            Err(ErrorMessages::message("String does not match expected pattern."))
        );
        assert!(Validator::regexp("(unclosed").is_err());
    }
}
