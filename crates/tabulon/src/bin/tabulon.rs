use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tabulon::{CompileOptions, Compiler, EncodeOptions, Format, Manifest, Workbook, encode};

/// Compile spreadsheet sheets into typed documents.
#[derive(Debug, Parser)]
#[command(name = "tabulon", version, about)]
struct Cli {
    /// Log more (`-v` debug, `-vv` trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build sheets and write one document per sheet.
    Compile(CompileArgs),
    /// Validate manifests without reading any sheet.
    Lint(LintArgs),
}

#[derive(Debug, Args)]
struct CompileArgs {
    /// Schema manifest (YAML).
    #[arg(long)]
    schema: PathBuf,

    /// Directory of `*.csv` sheets.
    #[arg(long)]
    input: PathBuf,

    /// Output directory, created when missing.
    #[arg(long)]
    output: PathBuf,

    /// json, text or binary.
    #[arg(long, default_value = "json")]
    format: Format,

    /// Compile only these sheets (repeatable).
    #[arg(long = "sheet")]
    sheets: Vec<String>,

    /// Write JSON and text without indentation.
    #[arg(long)]
    compact: bool,

    /// JSON: write zero-valued and unset fields.
    #[arg(long)]
    emit_defaults: bool,

    /// JSON: keep declared field names instead of lowerCamelCase.
    #[arg(long)]
    proto_names: bool,

    /// Build sheets one at a time.
    #[arg(long)]
    sequential: bool,
}

#[derive(Debug, Args)]
struct LintArgs {
    /// Manifest files to check.
    #[arg(required = true)]
    manifests: Vec<PathBuf>,

    /// Also link the manifest (type references, union variants).
    #[arg(long)]
    resolve: bool,
}

fn init_logging(verbose: u8) {
    #[cfg(feature = "tracing")]
    {
        use tracing_subscriber::EnvFilter;

        let default = match verbose {
            0 => "tabulon=warn,warn",
            1 => "tabulon=debug,tabulon_core=debug,tabulon_workbook=debug,warn",
            _ => "tabulon=trace,tabulon_core=trace,tabulon_workbook=trace,warn",
        };
        tracing_subscriber::fmt()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
            .init();
    }
    #[cfg(not(feature = "tracing"))]
    let _ = verbose;
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.command {
        Command::Compile(args) => compile(args),
        Command::Lint(args) => lint(args),
    }
}

fn compile(args: CompileArgs) -> Result<()> {
    let manifest = Manifest::from_path(&args.schema)
        .with_context(|| format!("failed to load {}", args.schema.display()))?;
    let schema = Arc::new(
        manifest
            .resolve()
            .with_context(|| format!("invalid manifest {}", args.schema.display()))?,
    );
    let workbook = Arc::new(
        Workbook::open_dir(&args.input)
            .with_context(|| format!("failed to read sheets from {}", args.input.display()))?,
    );
    fs::create_dir_all(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;

    let compiler = Compiler::new(
        schema,
        workbook,
        CompileOptions {
            parallel: !args.sequential,
            ..CompileOptions::default()
        },
    );
    let encode_options = EncodeOptions {
        pretty: !args.compact,
        emit_defaults: args.emit_defaults,
        proto_names: args.proto_names,
    };

    let outcomes = if args.sheets.is_empty() {
        compiler.compile_all()
    } else {
        args.sheets
            .iter()
            .map(|sheet| tabulon::SheetOutcome {
                sheet: sheet.clone(),
                result: compiler.compile_sheet(sheet),
            })
            .collect()
    };

    let mut failed = 0usize;
    for outcome in outcomes {
        let doc = match outcome.result {
            Ok(doc) => doc,
            Err(err) => {
                failed += 1;
                eprintln!("{}: {err}", outcome.sheet);
                continue;
            }
        };
        match write_document(&args.output, &doc, args.format, &encode_options) {
            Ok(path) => println!("{}: wrote {}", outcome.sheet, path.display()),
            Err(err) => {
                failed += 1;
                eprintln!("{}: {err:#}", outcome.sheet);
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} sheet(s) failed to compile");
    }
    Ok(())
}

fn write_document(
    dir: &Path,
    doc: &tabulon::Document,
    format: Format,
    options: &EncodeOptions,
) -> Result<PathBuf> {
    let bytes = encode(doc, format, options)?;
    let path = dir.join(format!("{}.{}", doc.schema.name, format.extension()));
    fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

fn lint(args: LintArgs) -> Result<()> {
    let mut failed = 0usize;
    for path in &args.manifests {
        let manifest = Manifest::from_path(path)
            .with_context(|| format!("failed to load {}", path.display()))?;
        let outcome = if args.resolve {
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
