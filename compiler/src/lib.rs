//! polyglot-compiler
//!
//! This crate implements:
//!  1) Typed views over the JSON tree a protobuf parser emits (`ast`),
//!  2) The schema IR builder that flattens that tree (`ir`, `types`),
//!  3) A schema verifier (duplicate types and ids, undefined types, recursive
//!     messages, enum sizes),
//!  4) Code generation (`generate_rust` → `String`) against the `polyglot`
//!     runtime,
//!  5) The build-plugin driver (`plugin`) and error types (`CompileError`).

pub mod ast;
pub mod error;
pub mod gen_rust;
pub mod ir;
pub mod plugin;
pub mod types;
pub mod utils;
pub mod verifier;

pub use error::CompileError;
pub use gen_rust::{generate_rust, GeneratorOptions};
pub use ir::build;
pub use types::SchemaIr;
pub use verifier::{check_schema, verify, verify_schema, Diagnostic};

/// Builds the IR for a parsed schema tree and generates Rust source for it.
pub fn compile_tree(tree: &serde_json::Value, options: &GeneratorOptions) -> String {
    generate_rust(&ir::build_from_value(tree), options)
}

/// Like [`compile_tree`], for a schema tree given as JSON text.
pub fn compile_json(json: &str, options: &GeneratorOptions) -> Result<String, CompileError> {
    let tree: serde_json::Value = serde_json::from_str(json)?;
    Ok(compile_tree(&tree, options))
}
