//! INI text
//!
//! Top-level scalar fields live in the `DEFAULT` section and every field
//! holding a mapping becomes a section of its own, so only one level of
//! nesting is representable. Section and key names keep their case and
//! section values are not merged with the defaults.

use crate::class::ModelClass;
use crate::error::{ModelError, Result};
use crate::instance::Model;
use indexmap::IndexMap;
use objmodel_schema::{LoadOptions, Value, ValueMap};
use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::debug;

/// Name of the section holding top-level scalars
pub const DEFAULT_SECTION: &str = "DEFAULT";

type Section = IndexMap<String, String>;

/// Parse INI text into plain data: one mapping per section, with the
/// `DEFAULT` entries at the top level.
///
/// Lines starting with `#` or `;` are comments. Keys are separated from
/// values by the first `=` or `:`. Indented lines continue the previous
/// value; a blank line ends it.
pub fn parse_ini(text: &str) -> Result<ValueMap> {
    let mut defaults = Section::new();
    let mut sections: IndexMap<String, Section> = IndexMap::new();
    let mut current: Option<String> = None;
    let mut last_key: Option<String> = None;

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            last_key = None;
            continue;
        }
        if trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        if raw.starts_with(char::is_whitespace) {
            if let (Some(section), Some(key)) = (current.as_deref(), last_key.as_deref()) {
                let target = section_mut(&mut defaults, &mut sections, section);
                if let Some(value) = target.get_mut(key) {
                    value.push('\n');
                    value.push_str(trimmed);
                    continue;
                }
            }
        }

        if let Some(header) = trimmed.strip_prefix('[') {
            let name = header
                .strip_suffix(']')
                .ok_or_else(|| ini_error(line, "unterminated section header"))?
                .trim();
            if name.is_empty() {
                return Err(ini_error(line, "empty section name"));
            }
            if name != DEFAULT_SECTION {
                if sections.contains_key(name) {
                    return Err(ini_error(line, format!("duplicate section '{}'", name)));
                }
                sections.insert(name.to_string(), Section::new());
            }
            current = Some(name.to_string());
            last_key = None;
            continue;
        }

        let split = trimmed
            .find(|c| c == '=' || c == ':')
            .ok_or_else(|| ini_error(line, format!("expected 'key = value', got '{}'", trimmed)))?;
        let key = trimmed[..split].trim();
        let value = trimmed[split + 1..].trim();
        if key.is_empty() {
            return Err(ini_error(line, "empty key"));
        }
        let section = current
            .as_deref()
            .ok_or_else(|| ini_error(line, format!("key '{}' outside any section", key)))?;
        let target = section_mut(&mut defaults, &mut sections, section);
        if target.contains_key(key) {
            return Err(ini_error(
                line,
                format!("duplicate key '{}' in section '{}'", key, section),
            ));
        }
        target.insert(key.to_string(), value.to_string());
        last_key = Some(key.to_string());
    }

    let mut data = ValueMap::new();
    for (name, section) in sections {
        data.insert(name, Value::Map(into_values(section)));
    }
    data.extend(into_values(defaults));
    Ok(data)
}

/// Render dumped data as INI text. Mapping values become sections; every
/// other value goes to `DEFAULT`, which is left out when empty.
///
/// Lists cannot be read back from INI and mappings inside a section would
/// need a second level of nesting, so both are rejected with
/// [`ModelError::IniValue`].
pub fn write_ini(data: &JsonMap<String, JsonValue>) -> Result<String> {
    let mut defaults = Vec::new();
    let mut sections = Vec::new();
    for (key, value) in data {
        match value {
            JsonValue::Object(section) => {
                for (inner, value) in section {
                    check_scalar(&format!("{}.{}", key, inner), value)?;
                }
                sections.push((key, section));
            }
            other => {
                check_scalar(key, other)?;
                defaults.push((key, other));
            }
        }
    }

    let mut out = String::new();
    if !defaults.is_empty() {
        write_section(&mut out, DEFAULT_SECTION, defaults);
    }
    for (name, section) in sections {
        write_section(&mut out, name, section.iter());
    }
    Ok(out.trim().to_string())
}

impl ModelClass {
    /// Parse `text` as INI and load one instance
    pub fn load_ini(&self, text: &str, options: LoadOptions) -> Result<Model> {
        let data = parse_ini(text)?;
        debug!(model = %self.name(), sections = data.len(), "decoded INI input");
        self.load_one(Value::Map(data), options)
    }
}

impl Model {
    pub fn dump_ini(&self) -> Result<String> {
        write_ini(&self.dump()?)
    }
}

fn section_mut<'a>(
    defaults: &'a mut Section,
    sections: &'a mut IndexMap<String, Section>,
    name: &str,
) -> &'a mut Section {
    if name == DEFAULT_SECTION {
        return defaults;
    }
    sections.entry(name.to_string()).or_default()
}

fn into_values(section: Section) -> ValueMap {
    section
        .into_iter()
        .map(|(key, value)| (key, Value::Str(value)))
        .collect()
}

fn write_section<'a, I>(out: &mut String, name: &str, entries: I)
where
    I: IntoIterator<Item = (&'a String, &'a JsonValue)>,
{
    out.push_str(&format!("[{}]\n", name));
    for (key, value) in entries {
        out.push_str(&format!("{} = {}\n", key, render(value).replace('\n', "\n\t")));
    }
    out.push('\n');
}

fn check_scalar(key: &str, value: &JsonValue) -> Result<()> {
    let kind = match value {
        JsonValue::Array(_) => "lists",
        JsonValue::Object(_) => "nested sections",
        _ => return Ok(()),
    };
    Err(ModelError::IniValue {
        key: key.to_string(),
        message: format!("{} are not supported", kind),
    })
}

fn render(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn ini_error<M: Into<String>>(line: usize, message: M) -> ModelError {
    ModelError::Ini {
        line,
        message: message.into(),
    }
}
