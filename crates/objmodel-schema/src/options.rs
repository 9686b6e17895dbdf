//! Load options and per-schema configuration

use crate::context::Context;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// What to do with input keys that match no declared field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownPolicy {
    /// Report each unknown key as a validation error
    #[default]
    Raise,
    /// Drop unknown keys silently
    Exclude,
    /// Keep unknown keys in the loaded data
    Include,
}

impl fmt::Display for UnknownPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnknownPolicy::Raise => write!(f, "raise"),
            UnknownPolicy::Exclude => write!(f, "exclude"),
            UnknownPolicy::Include => write!(f, "include"),
        }
    }
}

impl FromStr for UnknownPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "raise" => Ok(UnknownPolicy::Raise),
            "exclude" => Ok(UnknownPolicy::Exclude),
            "include" => Ok(UnknownPolicy::Include),
            _ => Err(format!("Must be one of: raise, exclude, include. Got '{}'.", s)),
        }
    }
}

/// Which missing fields a load tolerates
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Partial {
    /// Required fields must be present
    #[default]
    Off,
    /// Any field may be absent; load defaults are not applied
    All,
    /// Only the listed fields (dotted paths reach into nested schemas)
    Fields(BTreeSet<String>),
}

impl Partial {
    /// Build a field-list partial from names such as `"a"` or `"a.test_field"`
    pub fn fields<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Partial::Fields(names.into_iter().map(Into::into).collect())
    }

    pub fn is_off(&self) -> bool {
        matches!(self, Partial::Off)
    }

    /// Whether `field` may be absent without applying defaults or raising
    pub fn allows_missing(&self, field: &str) -> bool {
        match self {
            Partial::Off => false,
            Partial::All => true,
            Partial::Fields(names) => names.contains(field),
        }
    }

    /// The partial setting seen by the nested schema under `field`
    pub fn for_nested(&self, field: &str) -> Partial {
        match self {
            Partial::Off => Partial::Off,
            Partial::All => Partial::All,
            Partial::Fields(names) => {
                let prefix = format!("{}.", field);
                let nested: BTreeSet<String> = names
                    .iter()
                    .filter_map(|name| name.strip_prefix(&prefix).map(str::to_string))
                    .collect();
                if nested.is_empty() {
                    Partial::Off
                } else {
                    Partial::Fields(nested)
                }
            }
        }
    }
}

impl From<bool> for Partial {
    fn from(value: bool) -> Self {
        if value {
            Partial::All
        } else {
            Partial::Off
        }
    }
}

/// Per-schema configuration, the `Meta` block of a definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaMeta {
    /// Default unknown-field policy
    pub unknown: UnknownPolicy,
    /// Dump keys in declaration order; otherwise sorted by key
    pub ordered: bool,
    /// Fields removed from both load and dump
    pub exclude: Vec<String>,
    /// Fields only read on load
    pub load_only: Vec<String>,
    /// Fields only written on dump
    pub dump_only: Vec<String>,
}

impl Default for SchemaMeta {
    fn default() -> Self {
        Self {
            unknown: UnknownPolicy::Raise,
            ordered: true,
            exclude: Vec::new(),
            load_only: Vec::new(),
            dump_only: Vec::new(),
        }
    }
}

impl SchemaMeta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unknown(mut self, unknown: UnknownPolicy) -> Self {
        self.unknown = unknown;
        self
    }

    pub fn ordered(mut self, ordered: bool) -> Self {
        self.ordered = ordered;
        self
    }

    pub fn exclude<I: IntoIterator<Item = S>, S: Into<String>>(mut self, names: I) -> Self {
        self.exclude.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn load_only<I: IntoIterator<Item = S>, S: Into<String>>(mut self, names: I) -> Self {
        self.load_only.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn dump_only<I: IntoIterator<Item = S>, S: Into<String>>(mut self, names: I) -> Self {
        self.dump_only.extend(names.into_iter().map(Into::into));
        self
    }
}

/// Per-call load configuration
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Context shared by every instance the load produces; a fresh empty
    /// context when `None`
    pub context: Option<Context>,
    /// Expect a list and produce one result per item
    pub many: bool,
    pub partial: Partial,
    /// Overrides the schema's unknown policy for this load, nested schemas included
    pub unknown: Option<UnknownPolicy>,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    pub fn many(mut self, many: bool) -> Self {
        self.many = many;
        self
    }

    pub fn partial(mut self, partial: bool) -> Self {
        self.partial = Partial::from(partial);
        self
    }

    pub fn partial_fields<I: IntoIterator<Item = S>, S: Into<String>>(mut self, names: I) -> Self {
        self.partial = Partial::fields(names);
        self
    }

    pub fn unknown(mut self, unknown: UnknownPolicy) -> Self {
        self.unknown = Some(unknown);
        self
    }
}
