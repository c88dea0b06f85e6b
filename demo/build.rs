use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use polyglot_compiler::{compile_json, GeneratorOptions};

// Generates `$OUT_DIR/<stem>.rs` for every `schemas/<stem>.json`.
fn main() -> Result<(), Box<dyn Error>> {
    let out_dir = PathBuf::from(std::env::var("OUT_DIR")?);
    let schemas = Path::new("schemas");
    println!("cargo:rerun-if-changed={}", schemas.display());

    let options = GeneratorOptions::default();
    for entry in fs::read_dir(schemas)? {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        let Some(stem) = path.file_stem() else {
            continue;
        };
        println!("cargo:rerun-if-changed={}", path.display());

        let rust_code = compile_json(&fs::read_to_string(&path)?, &options)?;
        fs::write(out_dir.join(stem).with_extension("rs"), rust_code)?;
    }
    Ok(())
}
