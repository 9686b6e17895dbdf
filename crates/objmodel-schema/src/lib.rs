//! Objmodel Schema - field coercion and the load/dump pipeline
//!
//! This crate is the schema engine underneath `objmodel-core`. A
//! [`Schema`] is derived from a [`SchemaDefinition`] and zero or more base
//! schemas; a [`BoundSchema`] carries the per-call state and runs the
//! pipelines:
//!
//! - **Load**: pre-load hooks, per-field coercion and validation, unknown-key
//!   policy, post-load hooks. Errors are collected per field.
//! - **Validate**: the load pipeline without post-load hooks, returning the
//!   error detail.
//! - **Dump**: pre-dump hooks, per-field serialization (missing attributes
//!   are omitted or replaced by the dump default), post-dump hooks.
//!
//! ## Quick Start
//!
//! ```rust
//! use objmodel_schema::{fields, BoundSchema, Schema, SchemaDefinition, Value};
//! use serde_json::json;
//!
//! let schema = Schema::derive(
//!     "UserSchema",
//!     vec![],
//!     SchemaDefinition::new()
//!         .field("name", fields::string().required())
//!         .field("age", fields::integer()),
//! )
//! .unwrap();
//!
//! let bound = BoundSchema::new(schema);
//! let loaded = bound.load(Value::from(json!({"name": "Ada", "age": "36"})), false).unwrap();
//! assert_eq!(loaded.to_json(), Some(json!({"name": "Ada", "age": 36})));
//!
//! let err = bound.load(Value::from(json!({"age": 1})), false).unwrap_err();
//! assert!(err.contains_field("name"));
//! ```
//!
//! Copyright (c) 2025 Objmodel Team
//! Licensed under the Apache-2.0 license

pub mod context;
pub mod error;
pub mod fields;
pub mod options;
pub mod schema;
pub mod validate;
pub mod value;

// Re-export commonly used types for convenience
pub use context::Context;
pub use error::{ErrorMessages, SchemaError, ValidationError, ValidationResult, SCHEMA_KEY};
pub use fields::{
    DefaultValue, DumpContext, Field, FieldKind, FieldOptions, LoadContext, MethodRole,
    NestedTarget, SchemaMethod,
};
pub use options::{LoadOptions, Partial, SchemaMeta, UnknownPolicy};
pub use schema::{BoundSchema, Hook, HookContext, HookKind, Schema, SchemaDefinition};
pub use validate::Validator;
pub use value::{Attributes, ObjectRef, SchemaObject, Value, ValueMap};
