//! # Locate Subcommand
//!
//! Resolves one JSON Pointer in one file and prints `file:line[:column]`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use jsonloc_core::{resolve, SourceLocation, StructuralPath};

/// Arguments for the `jsonloc locate` subcommand.
#[derive(Args, Debug)]
pub struct LocateArgs {
    /// JSON document to search.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// JSON Pointer to the value, e.g. `/sections/2/title`. Empty for the root.
    #[arg(value_name = "POINTER", default_value = "")]
    pub pointer: String,
}

/// Execute the locate subcommand.
///
/// Returns exit code: 0 when the location was found, 1 when it is unknown.
pub fn run_locate(args: &LocateArgs) -> Result<u8> {
    match locate(&args.file, &args.pointer)? {
        Some(location) => {
            println!("{}:{location}", args.file.display());
            Ok(0)
        }
        None => {
            println!("{}: location of {:?} unknown", args.file.display(), args.pointer);
            Ok(1)
        }
    }
}

/// Resolve `pointer` in the document at `file`.
pub fn locate(file: &Path, pointer: &str) -> Result<Option<SourceLocation>> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let path = StructuralPath::from_pointer(pointer);
    let location = resolve(&text, &path);
    tracing::debug!(file = %file.display(), pointer, found = location.is_some(), "resolved pointer");
    Ok(location)
}
