//! Schema definitions and derivation
//!
//! A [`Schema`] is immutable once derived. Loading and dumping go through a
//! [`BoundSchema`], which adds the per-call state (context, partial, unknown
//! override).
//!
//! Copyright (c) 2025 Objmodel Team
//! Licensed under the Apache-2.0 license

mod bound;
mod hooks;

pub use bound::BoundSchema;
pub use hooks::{
    BindFieldFn, DumpHookFn, ErrorHandler, Hook, HookContext, HookKind, ValueHookFn,
};

use crate::error::{SchemaError, ValidationError};
use crate::fields::{Field, SchemaMethod};
use crate::options::SchemaMeta;
use crate::value::Value;
use indexmap::IndexMap;
use std::any::Any;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};
use tracing::debug;

/// Everything a schema declares itself, before merging with its bases
#[derive(Clone, Default)]
pub struct SchemaDefinition {
    pub fields: IndexMap<String, Field>,
    pub hooks: IndexMap<String, Hook>,
    pub methods: IndexMap<String, SchemaMethod>,
    pub meta: Option<SchemaMeta>,
    pub error_handler: Option<ErrorHandler>,
    pub on_bind_field: Option<BindFieldFn>,
}

impl SchemaDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field<N: Into<String>>(mut self, name: N, field: Field) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    pub fn hook<N: Into<String>>(mut self, name: N, hook: Hook) -> Self {
        self.hooks.insert(name.into(), hook);
        self
    }

    pub fn method<N: Into<String>>(mut self, name: N, method: SchemaMethod) -> Self {
        self.methods.insert(name.into(), method);
        self
    }

    pub fn meta(mut self, meta: SchemaMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn handle_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(&ValidationError, &Value, &HookContext<'_>) + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    pub fn on_bind_field<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, &mut Field) + Send + Sync + 'static,
    {
        self.on_bind_field = Some(Arc::new(callback));
        self
    }
}

impl fmt::Debug for SchemaDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaDefinition")
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("hooks", &self.hooks.keys().collect::<Vec<_>>())
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("meta", &self.meta)
            .finish()
    }
}

/// A derived schema: own declarations merged over those of its bases
pub struct Schema {
    name: String,
    bases: Vec<Arc<Schema>>,
    declared_fields: IndexMap<String, Field>,
    fields: IndexMap<String, Field>,
    hooks: IndexMap<String, Hook>,
    methods: IndexMap<String, SchemaMethod>,
    meta: SchemaMeta,
    error_handler: Option<ErrorHandler>,
    on_bind_field: Option<BindFieldFn>,
    owner: OnceLock<Weak<dyn Any + Send + Sync>>,
}

static ROOT: OnceLock<Arc<Schema>> = OnceLock::new();

impl Schema {
    /// The base every schema derives from
    pub fn root() -> Arc<Schema> {
        ROOT.get_or_init(|| {
            Arc::new(Schema {
                name: "Schema".to_string(),
                bases: Vec::new(),
                declared_fields: IndexMap::new(),
                fields: IndexMap::new(),
                hooks: IndexMap::new(),
                methods: IndexMap::new(),
                meta: SchemaMeta::default(),
                error_handler: None,
                on_bind_field: None,
                owner: OnceLock::new(),
            })
        })
        .clone()
    }

    /// Derive a new schema.
    ///
    /// Bases are merged from last to first, then the definition on top, so
    /// earlier bases win over later ones and the definition wins over all.
    /// A redeclared name keeps the position it first appeared at.
    pub fn derive<N: Into<String>>(
        name: N,
        bases: Vec<Arc<Schema>>,
        definition: SchemaDefinition,
    ) -> Result<Arc<Schema>, SchemaError> {
        let name = name.into();
        let bases = if bases.is_empty() {
            vec![Schema::root()]
        } else {
            bases
        };

        let mut declared_fields = IndexMap::new();
        let mut hooks = IndexMap::new();
        let mut methods = IndexMap::new();
        for base in bases.iter().rev() {
            for (key, field) in &base.declared_fields {
                declared_fields.insert(key.clone(), field.clone());
            }
            for (key, hook) in &base.hooks {
                hooks.insert(key.clone(), hook.clone());
            }
            for (key, method) in &base.methods {
                methods.insert(key.clone(), method.clone());
            }
        }
        declared_fields.extend(definition.fields);
        hooks.extend(definition.hooks);
        methods.extend(definition.methods);

        let meta = match definition.meta {
            Some(meta) => meta,
            None => bases[0].meta.clone(),
        };
        let error_handler = definition
            .error_handler
            .or_else(|| bases.iter().find_map(|base| base.error_handler.clone()));
        let on_bind_field = definition
            .on_bind_field
            .or_else(|| bases.iter().find_map(|base| base.on_bind_field.clone()));

        let listed = meta
            .exclude
            .iter()
            .chain(&meta.load_only)
            .chain(&meta.dump_only);
        let invalid: Vec<&str> = listed
            .filter(|field| !declared_fields.contains_key(field.as_str()))
            .map(String::as_str)
            .collect();
        if !invalid.is_empty() {
            return Err(SchemaError::invalid_definition(
                &name,
                format!("Invalid fields: {}", invalid.join(", ")),
            ));
        }

        for (field_name, field) in &declared_fields {
            for (role, method) in field.kind().method_names() {
                let defined = methods
                    .get(method)
                    .is_some_and(|m: &SchemaMethod| m.role() == role);
                if !defined {
                    return Err(SchemaError::MissingMethod {
                        schema: name.clone(),
                        field: field_name.clone(),
                        method: method.to_string(),
                    });
                }
            }
        }

        let mut fields = declared_fields.clone();
        if let Some(callback) = &on_bind_field {
            for (field_name, field) in fields.iter_mut() {
                callback(field_name, field);
            }
        }

        debug!(
            schema = %name,
            bases = bases.len(),
            fields = fields.len(),
            hooks = hooks.len(),
            "derived schema"
        );

        Ok(Arc::new(Schema {
            name,
            bases,
            declared_fields,
            fields,
            hooks,
            methods,
            meta,
            error_handler,
            on_bind_field,
            owner: OnceLock::new(),
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bases(&self) -> &[Arc<Schema>] {
        &self.bases
    }

    /// All fields, in declaration order
    pub fn fields(&self) -> &IndexMap<String, Field> {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn hooks(&self) -> &IndexMap<String, Hook> {
        &self.hooks
    }

    /// Hooks of one kind, in merged declaration order
    pub fn hooks_of(&self, kind: HookKind) -> impl Iterator<Item = (&str, &Hook)> {
        self.hooks
            .iter()
            .filter(move |(_, hook)| hook.kind() == kind)
            .map(|(name, hook)| (name.as_str(), hook))
    }

    pub fn has_hooks(&self, kind: HookKind) -> bool {
        self.hooks_of(kind).next().is_some()
    }

    pub fn method(&self, name: &str) -> Option<&SchemaMethod> {
        self.methods.get(name)
    }

    pub fn meta(&self) -> &SchemaMeta {
        &self.meta
    }

    pub fn error_handler(&self) -> Option<&ErrorHandler> {
        self.error_handler.as_ref()
    }

    /// Fields read during load
    pub fn load_fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields
            .iter()
            .filter(|(name, field)| {
                !field.options().dump_only
                    && !self.meta.exclude.contains(*name)
                    && !self.meta.dump_only.contains(*name)
            })
            .map(|(name, field)| (name.as_str(), field))
    }

    /// Fields written during dump
    pub fn dump_fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields
            .iter()
            .filter(|(name, field)| {
                !field.options().load_only
                    && !self.meta.exclude.contains(*name)
                    && !self.meta.load_only.contains(*name)
            })
            .map(|(name, field)| (name.as_str(), field))
    }

    /// Whether `self` is `other` or derives from it, directly or not
    pub fn is_derived_from(&self, other: &Schema) -> bool {
        std::ptr::eq(self, other) || self.bases.iter().any(|base| base.is_derived_from(other))
    }

    /// Attach the object this schema was synthesized for
    pub fn bind_owner(&self, owner: Weak<dyn Any + Send + Sync>) -> Result<(), SchemaError> {
        self.owner
            .set(owner)
            .map_err(|_| SchemaError::OwnerAlreadyBound {
                schema: self.name.clone(),
            })
    }

    /// The bound owner, while it is alive
    pub fn owner(&self) -> Option<Arc<dyn Any + Send + Sync>> {
        self.owner.get().and_then(Weak::upgrade)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("meta", &self.meta)
            .finish()
    }
}
