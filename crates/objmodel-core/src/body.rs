//! Class bodies and field harvesting
//!
//! A [`ClassBody`] is the ordered list of members a model declares. The
//! harvester sorts them into what goes into the schema definition (fields,
//! hooks, `Meta`, error handler, field-bind callback and the methods that
//! method fields name) and what stays on the class (attributes, methods).

use crate::error::{ModelError, Result};
use indexmap::IndexMap;
use objmodel_schema::schema::{BindFieldFn, ErrorHandler};
use objmodel_schema::{
    Field, Hook, MethodRole, SchemaDefinition, SchemaError, SchemaMeta, SchemaMethod, Value,
    ValueMap,
};
use std::fmt;
use tracing::trace;

/// Member name under which the `Meta` block is declared
pub const META: &str = "Meta";
/// Member name of the field-bind callback
pub const ON_BIND_FIELD: &str = "on_bind_field";
/// Member name of the error handler
pub const HANDLE_ERROR: &str = "handle_error";

/// One declaration in a model body
#[derive(Clone)]
pub enum ClassMember {
    Field(Field),
    Hook(Hook),
    Method(SchemaMethod),
    Meta(SchemaMeta),
    OnBindField(BindFieldFn),
    HandleError(ErrorHandler),
    Attribute(Value),
}

impl fmt::Debug for ClassMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassMember::Field(field) => f.debug_tuple("Field").field(field).finish(),
            ClassMember::Hook(hook) => f.debug_tuple("Hook").field(hook).finish(),
            ClassMember::Method(method) => f.debug_tuple("Method").field(method).finish(),
            ClassMember::Meta(meta) => f.debug_tuple("Meta").field(meta).finish(),
            ClassMember::OnBindField(_) => f.write_str("OnBindField"),
            ClassMember::HandleError(_) => f.write_str("HandleError"),
            ClassMember::Attribute(value) => f.debug_tuple("Attribute").field(value).finish(),
        }
    }
}

/// Ordered model body. Redeclaring a name replaces the member in place.
#[derive(Debug, Clone, Default)]
pub struct ClassBody {
    members: IndexMap<String, ClassMember>,
}

impl ClassBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<N: Into<String>>(&mut self, name: N, member: ClassMember) -> Option<ClassMember> {
        self.members.insert(name.into(), member)
    }

    pub fn get(&self, name: &str) -> Option<&ClassMember> {
        self.members.get(name)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ClassMember)> {
        self.members.iter().map(|(name, member)| (name.as_str(), member))
    }
}

/// A body sorted into schema and class parts
pub(crate) struct Harvested {
    pub(crate) definition: SchemaDefinition,
    pub(crate) attributes: ValueMap,
    pub(crate) methods: IndexMap<String, SchemaMethod>,
}

impl fmt::Debug for Harvested {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Harvested")
            .field("fields", &self.definition.fields.keys().collect::<Vec<_>>())
            .field("hooks", &self.definition.hooks.keys().collect::<Vec<_>>())
            .field("attributes", &self.attributes)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Sort `body` for the model `model`.
///
/// Declared fields leave a null class attribute behind. Every method a
/// method field names must be defined in the same body with the matching
/// role.
pub(crate) fn harvest(model: &str, body: ClassBody) -> Result<Harvested> {
    let mut definition = SchemaDefinition::new();
    let mut attributes = ValueMap::new();
    let mut methods = IndexMap::new();
    let mut referenced: Vec<(String, MethodRole, String)> = Vec::new();

    for (name, member) in body.members {
        match member {
            ClassMember::Field(field) => {
                referenced.extend(
                    field
                        .kind()
                        .method_names()
                        .into_iter()
                        .map(|(role, method)| (name.clone(), role, method.to_string())),
                );
                attributes.insert(name.clone(), Value::Null);
                definition.fields.insert(name, field);
            }
            ClassMember::Hook(hook) => {
                definition.hooks.insert(name, hook);
            }
            ClassMember::Method(method) => {
                methods.insert(name, method);
            }
            ClassMember::Meta(meta) => definition.meta = Some(meta),
            ClassMember::OnBindField(callback) => definition.on_bind_field = Some(callback),
            ClassMember::HandleError(handler) => definition.error_handler = Some(handler),
            ClassMember::Attribute(value) => {
                attributes.insert(name, value);
            }
        }
    }

    for (field, role, method) in referenced {
        match methods.get(&method) {
            Some(found) if found.role() == role => {
                trace!(model, field = %field, method = %method, "harvested method");
                definition.methods.insert(method, found.clone());
            }
            _ => {
                return Err(ModelError::Definition {
                    model: model.to_string(),
                    source: SchemaError::MissingMethod {
                        schema: format!("{}Schema", model),
                        field,
                        method,
                    },
                })
            }
        }
    }

    Ok(Harvested {
        definition,
        attributes,
        methods,
    })
}
