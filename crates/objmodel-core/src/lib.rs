//! Objmodel Core - declarative object models over a schema engine
//!
//! A model is declared once with [`ModelBuilder`]: its fields, hooks,
//! methods and `Meta` options. Building it synthesizes a schema (inheriting
//! from the parents' schemas), binds the schema back to the class and
//! registers the class by name. From then on the class is the entry point
//! for every load and each [`Model`] instance dumps itself.
//!
//! - **Construction**: loading validates the input and builds instances in
//!   a post-load hook, so nested models come back as instances too.
//! - **Partial tracking**: fields absent at load time stay missing and are
//!   left out of dumps until assigned.
//! - **Context**: one shared [`Context`] handle reaches every instance of a
//!   loaded tree and can be replaced from the root.
//! - **Formats**: JSON, YAML and INI adapters plus [`dump_many`] for mixed
//!   collections.
//!
//! ## Quick Start
//!
//! ```rust
//! use objmodel_core::{fields, nested_model, Kwargs, LoadOptions, ModelBuilder, ModelRegistry};
//! use serde_json::json;
//!
//! let registry = ModelRegistry::new();
//! let address = ModelBuilder::new("Address")
//!     .registry(&registry)
//!     .field("city", fields::string().required())
//!     .build()
//!     .unwrap();
//! let person = ModelBuilder::new("Person")
//!     .registry(&registry)
//!     .field("name", fields::string())
//!     .field("address", nested_model(&address))
//!     .build()
//!     .unwrap();
//!
//! let ada = person
//!     .load_one(json!({"name": "Ada", "address": {"city": "London"}}), LoadOptions::new())
//!     .unwrap();
//! assert!(ada.get_model("address").unwrap().is_instance_of(&address));
//! assert_eq!(ada.dump_json().unwrap(), r#"{"name":"Ada","address":{"city":"London"}}"#);
//!
//! let partial = person.construct(Kwargs::new().set("name", "Bob")).unwrap();
//! assert_eq!(partial.missing_fields(), vec!["address".to_string()]);
//! ```
//!
//! Copyright (c) 2025 Objmodel Team
//! Licensed under the Apache-2.0 license

pub mod body;
pub mod builder;
pub mod class;
pub mod error;
pub mod formats;
pub mod instance;
pub mod kwargs;
pub mod many;
pub mod nested;
pub mod registry;
mod synth;
pub mod tracker;

// Re-export commonly used types for convenience
pub use body::{ClassBody, ClassMember};
pub use builder::ModelBuilder;
pub use class::{InitFn, Loaded, ModelClass};
pub use error::{ModelError, Result};
pub use instance::Model;
pub use kwargs::Kwargs;
pub use many::{dump_many, dump_many_json, dump_many_yaml};
pub use nested::{nested_model, nested_model_named, nested_models, nested_models_named, NestedModel};
pub use registry::ModelRegistry;
pub use synth::MAKE_OBJECT_HOOK;
pub use tracker::{DumpModeGuard, FieldTracker};

pub use objmodel_schema::{
    fields, Attributes, Context, ErrorMessages, Field, Hook, HookContext, LoadOptions, Partial,
    SchemaMeta, UnknownPolicy, ValidationError, Value, ValueMap,
};
