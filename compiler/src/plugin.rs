//! The build-plugin driver: a host hands over parsed schema trees and gets
//! back one generated Rust file per schema.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::CompileError;
use crate::gen_rust::{generate_rust, GeneratorOptions};
use crate::{ir, verifier};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SchemaFile {
    /// Path of the schema as the host knows it, e.g. `api/v1/user.proto`.
    pub path: String,
    /// The parsed schema tree.
    pub tree: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenerateRequest {
    pub files:   Vec<SchemaFile>,
    #[serde(default)]
    pub options: GeneratorOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub name:    String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub files: Vec<GeneratedFile>,
}

/// The schema path with its extension replaced by `rs`.
pub fn output_path(path: &str) -> String {
    Path::new(path).with_extension("rs").to_string_lossy().into_owned()
}

/// Generates every requested file, independently and in request order.
pub fn generate(request: &GenerateRequest) -> GenerateResponse {
    let files = request
        .files
        .iter()
        .map(|file| {
            let schema = ir::build_from_value(&file.tree);
            for diagnostic in verifier::verify(&schema) {
                warn!(path = %file.path, "{}", diagnostic);
            }
            let name = output_path(&file.path);
            debug!(path = %file.path, output = %name, "generating");
            GeneratedFile {
                content: generate_rust(&schema, &request.options),
                name,
            }
        })
        .collect();
    GenerateResponse { files }
}

/// Parses a request as a host sends it and generates its files. A `runtime`
/// given here replaces the runtime path in the request's options.
pub fn run(request: &str, runtime: Option<String>) -> Result<GenerateResponse, CompileError> {
    let mut request: GenerateRequest = serde_json::from_str(request)?;
    if let Some(runtime) = runtime {
        request.options.runtime_path = runtime;
    }
    Ok(generate(&request))
}

#[test]
fn replaces_extension() {
    assert_eq!(output_path("api/v1/user.proto"), "api/v1/user.rs");
    assert_eq!(output_path("user"), "user.rs");
}

#[test]
fn generates_each_file_in_order() {
    let request: GenerateRequest = serde_json::from_value(serde_json::json!({
        "files": [
            { "path": "b.proto", "tree": { "nested": { "B": { "fields": {} } } } },
            { "path": "a.proto", "tree": 42 }
        ],
        "options": { "runtimePath": "::rt" }
    }))
    .unwrap();
    let response = generate(&request);
    let names: Vec<&str> = response.files.iter().map(|file| file.name.as_str()).collect();
    assert_eq!(names, ["b.rs", "a.rs"]);
    assert!(response.files[0].content.contains("impl ::rt::Message for B {"));
    assert!(!response.files[1].content.contains("pub struct"));
}

#[test]
fn runtime_override_wins_over_the_request() {
    let request = r#"{
        "files": [{ "path": "user.proto", "tree": { "nested": { "User": { "fields": {} } } } }],
        "options": { "runtimePath": "::from_request" }
    }"#;

    let response = run(request, None).unwrap();
    assert!(response.files[0].content.contains("impl ::from_request::Message for User {"));

    let response = run(request, Some("crate::rt".to_string())).unwrap();
    assert_eq!(response.files[0].name, "user.rs");
    assert!(response.files[0].content.contains("impl crate::rt::Message for User {"));
    assert!(!response.files[0].content.contains("from_request"));
}

#[test]
fn run_rejects_malformed_requests() {
    assert!(matches!(run("{ \"files\": 3 }", None), Err(CompileError::Json(_))));
    let response = run(r#"{ "files": [] }"#, None).unwrap();
    assert!(response.files.is_empty());
}
