//! Text formats
//!
//! Models load from and dump to JSON, YAML and INI text. Each format is a
//! thin layer over [`ModelClass::load`](crate::ModelClass::load) and
//! [`Model::dump`](crate::Model::dump): text is decoded into plain data
//! first and the schema does the rest.

mod ini;
mod json;
mod yaml;

pub use ini::{parse_ini, write_ini, DEFAULT_SECTION};
