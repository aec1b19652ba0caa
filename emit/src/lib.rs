//! Code and data emitters for ASDL schemas.
//!
//! Every single-schema emitter is a [`asdl_schema_core::Visitor`]:
//!
//! - [`print_module`] prints canonical ASDL source.
//! - [`PythonGenerator`] writes a module of Python dataclasses and enums.
//! - [`GraphQlGenerator`] writes GraphQL SDL type definitions.
//!
//! [`StubGenerator`] instead consumes a merged multi-version module and writes
//! a Python typing stub whose differences are guarded by version checks.
//!
//! Structured dumps go through [`dump`] / [`format_module`]; generated files
//! can be stamped with [`generated_header`]. [`EmitConfig`] holds the shared
//! naming and layout settings and loads from YAML.

mod asdl;
mod config;
mod dump;
mod error;
mod graphql;
mod header;
mod python;
mod stub;

pub use asdl::print_module;
pub use config::EmitConfig;
pub use dump::{DumpFormat, SchemaFormat, dump, format_module};
pub use error::{EmitError, Result};
pub use graphql::GraphQlGenerator;
pub use header::{SourceInput, generated_header, input_digest};
pub use python::{PythonGenerator, annotation};
pub use stub::StubGenerator;
