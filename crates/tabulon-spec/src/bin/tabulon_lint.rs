use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tabulon_spec::Manifest;

/// Validate tabulon manifests.
#[derive(Debug, Parser)]
#[command(name = "tabulon-lint", version, about)]
struct Cli {
    /// Manifest files to check.
    #[arg(required_unless_present = "schema")]
    manifests: Vec<PathBuf>,

    /// Print the manifest JSON Schema and exit.
    #[arg(long)]
    schema: bool,

    /// Also link the manifest (type references, union variants).
    #[arg(long)]
    resolve: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.schema {
        println!("{}", tabulon_spec::generate_schema_json_pretty());
        return Ok(());
    }

    let mut failed = 0usize;
    for path in &cli.manifests {
        let manifest = Manifest::from_path(path)
            .with_context(|| format!("failed to load {}", path.display()))?;
        let outcome = if cli.resolve {
            manifest.resolve().map(|_| ())
        } else {
            manifest.validate().map_err(Into::into)
        };
        match outcome {
            Ok(()) => println!("{}: ok", path.display()),
            Err(err) => {
                failed += 1;
                eprintln!("{}: {err}", path.display());
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} manifest(s) failed validation");
    }
    Ok(())
}
