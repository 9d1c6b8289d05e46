//! svcgen: compile annotated service interfaces into route references and
//! IR dumps.
//!
//! `svcgen -o gen -f json -f markdown api/*.go` parses every input, builds
//! one transport model, and writes `transport.json` and `transport.md` into
//! `gen/`. With a single format and no `--output`, the artifact goes to
//! stdout.

use anyhow::{Context, Result};
use clap::Parser;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use svcgen::model::Module;
use svcgen::{build, parser, render, BuildOptions};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "svcgen",
    version,
    about = "Compile annotated service interfaces into a shared transport model"
)]
struct Cli {
    /// Input files, directories or glob patterns (.go, .json).
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Output directory. Required for more than one format.
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Output format: json (default), markdown. Can be repeated.
    #[arg(short = 'f', long = "format", default_values_t = vec!["json".to_string()])]
    formats: Vec<String>,

    /// Base name of written artifacts.
    #[arg(long, default_value = "transport")]
    name: String,

    /// Only model these interfaces. Prefix with ! to exclude instead.
    /// Can be specified multiple times. E.g. --iface '!Internal'
    #[arg(long)]
    iface: Vec<String>,

    /// Base import path of the source tree, passed through to renderers.
    #[arg(long, default_value = "")]
    module: String,

    /// Log every modeled service and method.
    #[arg(short = 'v', long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors.
    #[arg(short = 'q', long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let renderers = cli
        .formats
        .iter()
        .map(|f| render::create_renderer(f))
        .collect::<Result<Vec<_>>>()?;
    if cli.output.is_none() && renderers.len() > 1 {
        anyhow::bail!("--output is required when more than one format is given");
    }

    let input_files = collect_inputs(&cli.inputs)?;
    if input_files.is_empty() {
        anyhow::bail!("no input files found");
    }

    let mut files = Vec::with_capacity(input_files.len());
    for path in &input_files {
        let content = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        files.push(parser::parse_file(path, &content)?);
    }

    let mut options = BuildOptions::from_selection(&cli.iface);
    options.module = Module { path: cli.module.clone() };
    options.version = env!("CARGO_PKG_VERSION").to_string();

    let transport = build(files, &options)?;
    tracing::info!(
        services = transport.services.len(),
        types = transport.types().len(),
        "model built"
    );

    let report = render::render_all(&transport, &renderers);

    match cli.output.as_deref() {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create output directory: {}", dir.display()))?;
            for artifact in report.artifacts() {
                let path = dir.join(format!("{}.{}", cli.name, artifact.extension));
                fs::write(&path, &artifact.content)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                tracing::info!(path = %path.display(), "wrote artifact");
            }
        }
        None => {
            for artifact in report.artifacts() {
                print!("{}", artifact.content);
            }
        }
    }

    if !report.is_success() {
        let failures: Vec<String> = report.failures().map(ToString::to_string).collect();
        anyhow::bail!("{} renderer(s) failed: {}", failures.len(), failures.join("; "));
    }
    Ok(())
}

fn init_tracing(cli: &Cli) {
    let default = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

/// Resolve CLI inputs to source files. Files are taken as given,
/// directories are scanned one level deep, anything else is a glob.
fn collect_inputs(inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = BTreeSet::new();
    for input in inputs {
        let path = Path::new(input);
        if path.is_file() {
            files.insert(path.to_path_buf());
        } else if path.is_dir() {
            files.extend(scan_dir(path)?);
        } else {
            let mut matched = 0;
            for entry in glob::glob(input).with_context(|| format!("invalid glob pattern: {input}"))? {
                let found = entry.with_context(|| format!("failed to expand {input}"))?;
                if found.is_file() {
                    files.insert(found);
                    matched += 1;
                }
            }
            if matched == 0 {
                tracing::warn!(pattern = %input, "no files matched");
            }
        }
    }
    Ok(files.into_iter().collect())
}

fn scan_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let context = || format!("failed to read directory: {}", dir.display());
    let mut found = Vec::new();
    for entry in fs::read_dir(dir).with_context(context)? {
        let path = entry.with_context(context)?.path();
        if path.is_file() && is_supported(&path) {
            found.push(path);
        }
    }
    Ok(found)
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| parser::SUPPORTED_EXTENSIONS.contains(&ext))
}
