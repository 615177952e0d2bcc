//! Configuration file loading.
//!
//! codenanny reads `.codenanny.toml` (or `codenanny.toml`), found by walking up
//! from the current directory and stopping at the repository root.
//!
//! ```toml
//! package-linters = ["errcheck", "vet"]
//! dir-linters = ["goimports", "gofmt"]
//! fail-fast = true
//! timeout = 0
//!
//! [options]
//! mincyclo = 15
//! tests = false
//!
//! [linters.mylint]
//! command = "mylint -strict"
//! pattern = "PATH:LINE:MESSAGE"
//! ```

use crate::linters::registry::{Applicability, LinterDefinition, LinterRegistry, RegistryError};
use crate::linters::template::LintOptions;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const CONFIG_FILES: &[&str] = &[".codenanny.toml", "codenanny.toml"];

/// Errors that can occur when loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read config file at {path}: {source}")]
    IoError { source: io::Error, path: String },

    /// Failed to parse the configuration content
    #[error("Failed to parse config file at {path}: {message}")]
    ParseError { path: String, message: String },
}

/// Effective configuration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Linters run once per package
    #[serde(default = "default_package_linters")]
    pub package_linters: Vec<String>,

    /// Linters run once per directory
    #[serde(default = "default_dir_linters")]
    pub dir_linters: Vec<String>,

    /// Stop at the first failing linter (default: true)
    #[serde(default = "default_true")]
    pub fail_fast: bool,

    /// Timeout per linter execution in milliseconds, 0 for none (default: 0)
    #[serde(default)]
    pub timeout: u64,

    /// Values for template placeholders
    #[serde(default)]
    pub options: LintOptions,

    /// Custom linter definitions (override built-ins)
    #[serde(default)]
    pub linters: IndexMap<String, LinterDefinition>,
}

fn default_package_linters() -> Vec<String> {
    Applicability::default().package
}

fn default_dir_linters() -> Vec<String> {
    Applicability::default().directory
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            package_linters: default_package_linters(),
            dir_linters: default_dir_linters(),
            fail_fast: true,
            timeout: 0,
            options: LintOptions::default(),
            linters: IndexMap::new(),
        }
    }
}

impl Config {
    pub fn from_toml_str(content: &str, path: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::IoError {
            source,
            path: display.clone(),
        })?;
        log::debug!("[codenanny-config] Loaded {display}");
        Self::from_toml_str(&content, &display)
    }

    /// Load an explicit config file, or discover one upward from `start_dir`.
    /// Falls back to defaults when nothing is found.
    pub fn load(config_path: Option<&Path>, start_dir: &Path) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = config_path {
            return Ok((Self::from_file(path)?, Some(path.to_path_buf())));
        }
        match discover_config_upward(start_dir) {
            Some(path) => Ok((Self::from_file(&path)?, Some(path))),
            None => {
                log::debug!("[codenanny-config] No config file found, using defaults");
                Ok((Self::default(), None))
            }
        }
    }

    pub fn applicability(&self) -> Applicability {
        Applicability {
            package: self.package_linters.clone(),
            directory: self.dir_linters.clone(),
        }
    }

    pub fn registry(&self) -> Result<LinterRegistry, RegistryError> {
        LinterRegistry::new(&self.linters)
    }
}

/// Walk up from `start_dir` looking for a config file. The search stops at the
/// first directory containing `.git`.
pub fn discover_config_upward(start_dir: &Path) -> Option<PathBuf> {
    const MAX_DEPTH: usize = 100;

    let mut current = start_dir.to_path_buf();
    for _ in 0..MAX_DEPTH {
        log::debug!("[codenanny-config] Searching for config in: {}", current.display());
        for name in CONFIG_FILES {
            let candidate = current.join(name);
            if candidate.is_file() {
                log::debug!("[codenanny-config] Found config file: {}", candidate.display());
                return Some(candidate);
            }
        }
        if current.join(".git").exists() {
            break;
        }
        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => break,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linters::template::TargetStyle;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.package_linters, vec!["errcheck"]);
        assert_eq!(config.dir_linters, vec!["goimports"]);
        assert!(config.fail_fast);
        assert_eq!(config.timeout, 0);
        assert!(config.linters.is_empty());
    }

    #[test]
    fn test_empty_file_is_default() {
        let config = Config::from_toml_str("", "test.toml").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_deserialize_config() {
        let toml = r#"
package-linters = ["errcheck", "vet"]
dir-linters = ["gofmt"]
fail-fast = false
timeout = 60000

[options]
mincyclo = 15
min-confidence = 0.9
tests = false

[linters.mylint]
command = "mylint -strict"
pattern = "PATH:LINE:MESSAGE"
target = "go-files"
"#;

        let config = Config::from_toml_str(toml, "test.toml").expect("Failed to parse TOML");

        assert_eq!(config.package_linters, vec!["errcheck", "vet"]);
        assert_eq!(config.dir_linters, vec!["gofmt"]);
        assert!(!config.fail_fast);
        assert_eq!(config.timeout, 60_000);
        assert_eq!(config.options.mincyclo, Some(15));
        assert_eq!(config.options.min_confidence, Some(0.9));
        assert_eq!(config.options.tests, Some(false));

        let mylint = config.linters.get("mylint").expect("Missing custom linter");
        assert_eq!(mylint.target, TargetStyle::GoFiles);

        let registry = config.registry().unwrap();
        assert!(registry.contains("mylint"));
        assert_eq!(config.applicability().package, vec!["errcheck", "vet"]);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = Config::from_toml_str("pakage-linters = []\n", "bad.toml").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { ref path, .. } if path == "bad.toml"));
    }

    #[test]
    fn test_unknown_option_rejected() {
        assert!(Config::from_toml_str("[options]\ncyclo = 3\n", "bad.toml").is_err());
    }

    #[test]
    fn test_discover_upward_stops_at_git_root() {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path().join("repo");
        let nested = repo.join("pkg/a");
        fs::create_dir_all(&nested).unwrap();
        fs::create_dir(repo.join(".git")).unwrap();
        // Outside the repository, must not be picked up
        fs::write(dir.path().join(".codenanny.toml"), "").unwrap();

        assert_eq!(discover_config_upward(&nested), None);

        fs::write(repo.join("codenanny.toml"), "dir-linters = []\n").unwrap();
        assert_eq!(discover_config_upward(&nested), Some(repo.join("codenanny.toml")));

        let (config, path) = Config::load(None, &nested).unwrap();
        assert!(config.dir_linters.is_empty());
        assert_eq!(path, Some(repo.join("codenanny.toml")));
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let err = Config::load(Some(Path::new("/no/such/codenanny.toml")), Path::new(".")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError { .. }));
    }
}
