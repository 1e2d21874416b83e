//! Configuration types for known-canonical

use crate::error::{Error, Result};
use crate::types::Table;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Default UCSC download host prefix
pub const DEFAULT_BASE_URL: &str = "https://hgdownload.soe.ucsc.edu/goldenPath";

/// Default genome assembly
pub const DEFAULT_ASSEMBLY: &str = "hg19";

/// Output file name prefix; the assembly id is appended as the extension
pub const OUTPUT_PREFIX: &str = "knownGeneCanonical.txt";

/// Main configuration for a pipeline run
///
/// Every field has a default, so an empty TOML file is a valid config and
/// reproduces the hg19 run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Genome assembly identifier (default: "hg19")
    #[serde(default = "default_assembly")]
    pub assembly: String,

    /// Download host prefix; tables live under `{base_url}/{assembly}/database/`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Output file path (default: `knownGeneCanonical.txt.{assembly}`)
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// Parent directory for the per-run working directory
    ///
    /// Defaults to the directory of the output file so the final move is a
    /// same-filesystem rename.
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,

    /// Per-request timeout in seconds (None = no timeout)
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// User-Agent header sent with downloads
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Number of output lines echoed after a successful run (default: 5)
    #[serde(default = "default_preview_lines")]
    pub preview_lines: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            assembly: default_assembly(),
            base_url: default_base_url(),
            output: None,
            temp_dir: None,
            timeout_secs: None,
            user_agent: default_user_agent(),
            preview_lines: default_preview_lines(),
        }
    }
}

impl Config {
    /// Parse a config from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config {
            message: format!("invalid TOML: {}", e),
            key: None,
        })
    }

    /// Load a config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read config file '{}': {}", path.display(), e),
            key: None,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check that the config can drive a run
    pub fn validate(&self) -> Result<()> {
        let assembly = self.assembly.as_str();
        if assembly.is_empty() {
            return Err(Error::config("assembly must not be empty", "assembly"));
        }
        let plain = assembly
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if !plain || assembly == "." || assembly == ".." {
            return Err(Error::config(
                format!("assembly '{}' is not a plain identifier", assembly),
                "assembly",
            ));
        }

        let base = Url::parse(&self.base_url).map_err(|e| {
            Error::config(
                format!("base_url '{}' is not a valid URL: {}", self.base_url, e),
                "base_url",
            )
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::config(
                format!("base_url scheme '{}' is not http(s)", base.scheme()),
                "base_url",
            ));
        }

        if self.timeout_secs == Some(0) {
            return Err(Error::config("timeout_secs must be positive", "timeout_secs"));
        }

        if let Some(output) = &self.output
            && output.file_name().is_none()
        {
            return Err(Error::config(
                format!("output '{}' does not name a file", output.display()),
                "output",
            ));
        }

        Ok(())
    }

    /// Download URL of one upstream table
    pub fn table_url(&self, table: Table) -> Result<Url> {
        let raw = format!(
            "{}/{}/database/{}",
            self.base_url.trim_end_matches('/'),
            self.assembly,
            table.file_name()
        );
        Url::parse(&raw).map_err(|e| {
            Error::config(format!("invalid table URL '{}': {}", raw, e), "base_url")
        })
    }

    /// Final output path
    pub fn output_path(&self) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None => PathBuf::from(format!("{}.{}", OUTPUT_PREFIX, self.assembly)),
        }
    }

    /// Directory the working directory is created in
    pub fn work_parent(&self) -> PathBuf {
        if let Some(dir) = &self.temp_dir {
            return dir.clone();
        }
        match self.output_path().parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Per-request timeout
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

fn default_assembly() -> String {
    DEFAULT_ASSEMBLY.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

fn default_preview_lines() -> usize {
    5
}
