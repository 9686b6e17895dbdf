//! Lifecycle hooks, error handlers and field-bind callbacks

use super::BoundSchema;
use crate::context::Context;
use crate::error::ValidationError;
use crate::fields::Field;
use crate::options::Partial;
use crate::value::Value;
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::fmt;
use std::sync::Arc;

/// What a hook sees besides the value it transforms
pub struct HookContext<'a> {
    pub schema: &'a Arc<BoundSchema>,
    pub many: bool,
}

impl HookContext<'_> {
    pub fn context(&self) -> Context {
        self.schema.context()
    }

    pub fn partial(&self) -> &Partial {
        self.schema.partial()
    }
}

/// Hook transforming one item
pub type ValueHookFn =
    Arc<dyn Fn(Value, &HookContext<'_>) -> Result<Value, ValidationError> + Send + Sync>;

/// Hook transforming one dumped mapping
pub type DumpHookFn = Arc<
    dyn Fn(JsonMap<String, JsonValue>, &HookContext<'_>) -> Result<JsonMap<String, JsonValue>, ValidationError>
        + Send
        + Sync,
>;

/// Observes every failed load with the original input
pub type ErrorHandler = Arc<dyn Fn(&ValidationError, &Value, &HookContext<'_>) + Send + Sync>;

/// Adjusts each field when a schema is derived
pub type BindFieldFn = Arc<dyn Fn(&str, &mut Field) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    PreLoad,
    PostLoad,
    PreDump,
    PostDump,
}

/// A processing hook. Hooks are stored by name so derived schemas can
/// override them.
#[derive(Clone)]
pub enum Hook {
    PreLoad(ValueHookFn),
    PostLoad(ValueHookFn),
    PreDump(ValueHookFn),
    PostDump(DumpHookFn),
}

impl Hook {
    pub fn pre_load<F>(f: F) -> Self
    where
        F: Fn(Value, &HookContext<'_>) -> Result<Value, ValidationError> + Send + Sync + 'static,
    {
        Hook::PreLoad(Arc::new(f))
    }

    pub fn post_load<F>(f: F) -> Self
    where
        F: Fn(Value, &HookContext<'_>) -> Result<Value, ValidationError> + Send + Sync + 'static,
    {
        Hook::PostLoad(Arc::new(f))
    }

    pub fn pre_dump<F>(f: F) -> Self
    where
        F: Fn(Value, &HookContext<'_>) -> Result<Value, ValidationError> + Send + Sync + 'static,
    {
        Hook::PreDump(Arc::new(f))
    }

    pub fn post_dump<F>(f: F) -> Self
    where
        F: Fn(JsonMap<String, JsonValue>, &HookContext<'_>) -> Result<JsonMap<String, JsonValue>, ValidationError>
            + Send
            + Sync
            + 'static,
    {
        Hook::PostDump(Arc::new(f))
    }

    pub fn kind(&self) -> HookKind {
        match self {
            Hook::PreLoad(_) => HookKind::PreLoad,
            Hook::PostLoad(_) => HookKind::PostLoad,
            Hook::PreDump(_) => HookKind::PreDump,
            Hook::PostDump(_) => HookKind::PostDump,
        }
    }

    /// The item-transforming function of a load or pre-dump hook
    pub(crate) fn value_fn(&self) -> Option<&ValueHookFn> {
        match self {
            Hook::PreLoad(f) | Hook::PostLoad(f) | Hook::PreDump(f) => Some(f),
            Hook::PostDump(_) => None,
        }
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hook::{:?}", self.kind())
    }
}
