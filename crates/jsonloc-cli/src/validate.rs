//! # Validate Subcommand
//!
//! Validates every document below the configured roots against the schema
//! its directory maps to, then prints the summary as text or JSON.
//!
//! Settings come from the config file first and are overridden by flags.
//! With no directory mapping configured at all, `<name>.schema.json`
//! classifies directories named `<name>`.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use jsonloc_schema::{
    DirectoryTable, Orchestrator, SchemaError, SchemaRegistry, ValidationSummary, ValidatorSet,
};

use crate::config::Config;

/// Report format on stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Arguments for the `jsonloc validate` subcommand.
#[derive(Args, Debug, Default)]
pub struct ValidateArgs {
    /// Root directories to scan. Replaces `roots` from the config file.
    #[arg(value_name = "ROOT")]
    pub roots: Vec<PathBuf>,

    /// Directory holding the `*.schema.json` files.
    #[arg(long, value_name = "DIR")]
    pub schema_dir: Option<PathBuf>,

    /// Map a directory name to a schema file, e.g. `pages=page.schema.json`.
    /// Repeatable; adds to (and overrides) the config file's `directories`.
    #[arg(long = "map", value_name = "DIR=SCHEMA", value_parser = parse_mapping)]
    pub mappings: Vec<(String, String)>,

    /// Document extension (default `json`).
    #[arg(long = "ext", value_name = "EXT")]
    pub extension: Option<String>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

fn parse_mapping(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((dir, schema)) if !dir.is_empty() && !schema.is_empty() => {
            Ok((dir.to_string(), schema.to_string()))
        }
        _ => Err(format!("expected DIR=SCHEMA, got {raw:?}")),
    }
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 when every validated document passed, 1 otherwise.
/// Operational failures are returned as errors.
pub fn run_validate(args: &ValidateArgs, config: Config, verbose: u8) -> Result<u8> {
    let config = apply_overrides(config, args);
    let summary = validate_tree(&config)?;

    match args.format {
        OutputFormat::Text => print!("{}", render_text(&summary, verbose > 0)),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("failed to serialise summary")?
        ),
    }

    Ok(if summary.is_success() { 0 } else { 1 })
}

/// Fold command-line flags into the file configuration.
pub fn apply_overrides(mut config: Config, args: &ValidateArgs) -> Config {
    if !args.roots.is_empty() {
        config.roots = args.roots.clone();
    }
    if let Some(dir) = &args.schema_dir {
        config.schema_dir = dir.clone();
    }
    if let Some(ext) = &args.extension {
        config.extension = ext.clone();
    }
    for (dir, schema) in &args.mappings {
        config.directories.insert(dir.clone(), schema.clone());
    }
    config
}

/// Load schemas, build the classification table and run the orchestrator.
pub fn validate_tree(config: &Config) -> Result<ValidationSummary> {
    let registry = SchemaRegistry::new(&config.schema_dir).context("failed to load JSON schemas")?;
    tracing::info!(
        schema_dir = %config.schema_dir.display(),
        schema_count = registry.schema_count(),
        "loaded schema registry"
    );

    let table = if config.directories.is_empty() {
        DirectoryTable::from_registry(&registry)
    } else {
        config.directories.iter().collect()
    };
    if table.is_empty() {
        tracing::warn!("no directory is mapped to a schema; every document is unclassified");
    }

    let validators = compile_validators(&registry, &table)?;
    let summary = Orchestrator::new(&table, &validators)
        .with_extension(&config.extension)
        .with_excluded(config.exclude.iter().cloned())
        .run(config.roots.as_slice())
        .context("validation aborted")?;
    Ok(summary)
}

/// One validator per schema type the table uses. A type whose schema file
/// does not exist is skipped with a warning; a schema that fails to compile
/// is fatal.
fn compile_validators(registry: &SchemaRegistry, table: &DirectoryTable) -> Result<ValidatorSet> {
    let mut validators = ValidatorSet::new();
    for schema_type in table.schema_types() {
        match registry.compile(schema_type) {
            Ok(compiled) => {
                tracing::debug!(schema_type, schema_id = compiled.schema_id(), "compiled schema");
                validators.insert(schema_type, compiled);
            }
            Err(SchemaError::SchemaNotFound(_)) => {
                tracing::warn!(schema_type, "mapped schema not found in schema directory");
            }
            Err(e) => return Err(e).with_context(|| format!("failed to compile {schema_type}")),
        }
    }
    Ok(validators)
}

/// Human-readable report: one `FAIL:` block per failed document, then totals.
pub fn render_text(summary: &ValidationSummary, list_unclassified: bool) -> String {
    let mut out = String::new();

    for report in summary.failures() {
        let _ = writeln!(
            out,
            "FAIL: {} ({})",
            report.file_path.display(),
            report.schema_type
        );
        for diagnostic in &report.errors {
            let _ = writeln!(out, "  {}", diagnostic.rendered);
        }
    }

    if list_unclassified {
        for path in &summary.unclassified {
            let _ = writeln!(out, "SKIP: {}", path.display());
        }
    }

    let _ = writeln!(
        out,
        "Documents: {} validated, {} passed, {} failed ({} visited, {} unclassified)",
        summary.files_validated,
        summary.passed,
        summary.failed,
        summary.files_visited,
        summary.unclassified.len()
    );
    out
}
