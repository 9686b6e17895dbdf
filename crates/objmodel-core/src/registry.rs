//! Name lookup for model classes
//!
//! Nested fields declared by name resolve against a registry at load time,
//! which allows forward and circular references. Every built class is
//! registered; the global registry is used unless a builder names another.

use crate::class::ModelClass;
use objmodel_schema::fields::SchemaResolver;
use objmodel_schema::ValidationError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};
use tracing::{debug, warn};

type ClassMap = RwLock<HashMap<String, ModelClass>>;

/// Shared handle to a set of named model classes
#[derive(Clone, Default)]
pub struct ModelRegistry {
    classes: Arc<ClassMap>,
}

static GLOBAL: OnceLock<ModelRegistry> = OnceLock::new();

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide default registry
    pub fn global() -> &'static ModelRegistry {
        GLOBAL.get_or_init(ModelRegistry::new)
    }

    /// Register `class` under its name, returning the class it replaced
    pub fn register(&self, class: ModelClass) -> Option<ModelClass> {
        let name = class.name().to_string();
        let previous = self.classes.write().insert(name.clone(), class);
        if previous.is_some() {
            warn!(model = %name, "replaced registered model class");
        } else {
            debug!(model = %name, "registered model class");
        }
        previous
    }

    pub fn unregister(&self, name: &str) -> Option<ModelClass> {
        self.classes.write().remove(name)
    }

    pub fn get(&self, name: &str) -> Option<ModelClass> {
        self.classes.read().get(name).cloned()
    }

    /// Like [`get`](Self::get), failing the way a load does
    pub fn resolve(&self, name: &str) -> Result<ModelClass, ValidationError> {
        self.get(name).ok_or_else(|| ValidationError::new(not_found(name)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.read().contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.classes.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.classes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.read().is_empty()
    }

    /// Schema resolver for deferred nested fields. Holds the registry weakly
    /// since registered classes own the fields that hold the resolver.
    pub(crate) fn resolver(&self) -> SchemaResolver {
        let classes: Weak<ClassMap> = Arc::downgrade(&self.classes);
        Arc::new(move |name: &str| {
            classes
                .upgrade()
                .and_then(|classes| classes.read().get(name).map(|class| class.schema().clone()))
                .ok_or_else(|| not_found(name))
        })
    }
}

fn not_found(name: &str) -> String {
    format!("The class '{}' not found", name)
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("classes", &self.names())
            .finish()
    }
}
