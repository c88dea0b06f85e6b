use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use polyglot::decode_to_json;
use polyglot_compiler::error::CompileError;
use polyglot_compiler::plugin;
use polyglot_compiler::{generate_rust, ir, verifier, GeneratorOptions};

#[derive(Parser)]
#[command(name = "polyglot-gen")]
#[command(about = "Generate Rust from parsed protobuf schemas, or inspect Polyglot buffers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate Rust code from one parsed schema tree (JSON)
    Generate {
        /// Input schema tree, as emitted by a protobuf parser's `toJSON()`
        #[arg(short, long)]
        input: PathBuf,

        /// Output `.rs` file (defaults to the input path with extension `rs`)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Path generated code uses to reach the runtime crate
        #[arg(short, long, default_value = "::polyglot")]
        runtime: String,

        /// Fail instead of warning when the verifier reports a problem
        #[arg(long)]
        deny_warnings: bool,
    },

    /// Act as a build plugin: read a JSON generate request on stdin and
    /// write the JSON response on stdout
    Plugin {
        /// Overrides the runtime path given in the request
        #[arg(short, long)]
        runtime: Option<String>,
    },

    /// Print the schema IR built from a parsed schema tree as JSON
    Ir {
        /// Input schema tree
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Decode a schema-less Polyglot buffer to JSON (printed to stdout)
    Inspect {
        /// Input binary file
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() -> Result<(), CompileError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            input,
            output,
            runtime,
            deny_warnings,
        } => {
            let text = fs::read_to_string(&input)?;
            let tree: serde_json::Value = serde_json::from_str(&text)?;
            let schema = ir::build_from_value(&tree);
            verifier::check_schema(&schema, deny_warnings)?;

            let options = GeneratorOptions {
                runtime_path: runtime,
            };
            let rust_code = generate_rust(&schema, &options);
            let out_path = output.unwrap_or_else(|| input.with_extension("rs"));
            fs::write(&out_path, rust_code)?;
            info!(
                messages = schema.messages.len(),
                enums = schema.enums.len(),
                "generated {} → {}",
                input.display(),
                out_path.display()
            );
            Ok(())
        }

        Commands::Plugin { runtime } => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            let response = plugin::run(&text, runtime)?;
            let mut stdout = io::stdout().lock();
            serde_json::to_writer(&mut stdout, &response)?;
            writeln!(stdout)?;
            info!(files = response.files.len(), "plugin response written");
            Ok(())
        }

        Commands::Ir { input } => {
            let text = fs::read_to_string(&input)?;
            let tree: serde_json::Value = serde_json::from_str(&text)?;
            let schema = ir::build_from_value(&tree);
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(())
        }

        Commands::Inspect { input } => {
            let data = fs::read(&input)?;
            let json = decode_to_json(&data)?;
            println!("{}", json);
            Ok(())
        }
    }
}
