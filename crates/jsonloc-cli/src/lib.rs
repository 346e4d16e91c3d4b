//! # jsonloc-cli: Command-Line Front End
//!
//! Provides the `jsonloc` binary on top of `jsonloc-schema`.
//!
//! ## Subcommands
//!
//! - `jsonloc validate`: validate every document below the configured roots
//!   and print each error with the line it refers to.
//! - `jsonloc locate`: resolve a single JSON Pointer in a single file.
//!
//! ```bash
//! jsonloc validate content/ --schema-dir schemas --map pages=page.schema.json
//! jsonloc --config jsonloc.yaml validate --format json
//! jsonloc locate content/pages/home.json /sections/2/title
//! ```
//!
//! ## Exit codes
//!
//! `0` when every validated document passed, `1` when any failed (or a
//! location is unknown), `2` on an operational error. See [`exit_code`].

pub mod config;
pub mod locate;
pub mod validate;

use clap::ValueEnum;

/// Exit code for an operational failure (bad config, missing root, unusable
/// schema directory).
pub const EXIT_OPERATIONAL: u8 = 2;

/// Log line format on stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Process exit code for a subcommand outcome. Handlers return `0`/`1`
/// themselves; any error is operational.
pub fn exit_code(result: &anyhow::Result<u8>) -> u8 {
    match result {
        Ok(code) => *code,
        Err(_) => EXIT_OPERATIONAL,
    }
}
