//! # Configuration File
//!
//! Optional YAML file passed with `--config`:
//!
//! ```yaml
//! schema_dir: schemas
//! roots: [content]
//! extension: json
//! exclude: [.git, node_modules, target]
//! directories:
//!   pages: page.schema.json
//!   components: component.schema.json
//! ```
//!
//! Every key is optional. Relative `schema_dir` and `roots` resolve against
//! the directory holding the config file, not the working directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use jsonloc_schema::pipeline::DEFAULT_EXCLUDES;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding the `*.schema.json` files.
    pub schema_dir: PathBuf,
    /// Root directories to scan.
    pub roots: Vec<PathBuf>,
    /// Document extension, without the dot.
    pub extension: String,
    /// Directory names never descended into.
    pub exclude: Vec<String>,
    /// Directory name → schema filename. Empty means "derive by convention".
    pub directories: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_dir: PathBuf::from("schemas"),
            roots: vec![PathBuf::from(".")],
            extension: "json".to_string(),
            exclude: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
            directories: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Read and parse `path`, rebasing relative paths onto its directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        tracing::debug!(config = %path.display(), base = %base.display(), "loaded configuration");
        Ok(config.rebase(base))
    }

    /// Parse YAML text. An empty document yields the defaults.
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Make relative `schema_dir` and `roots` relative to `base` instead.
    pub fn rebase(mut self, base: &Path) -> Self {
        self.schema_dir = join_relative(base, &self.schema_dir);
        self.roots = self.roots.iter().map(|r| join_relative(base, r)).collect();
        self
    }
}

fn join_relative(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() || base.as_os_str().is_empty() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
