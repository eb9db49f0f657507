//! Generator configuration
//!
//! Values are resolved in three layers: built-in defaults, an optional
//! `.lsdgen.toml` file in the working directory (or the file named by the
//! `LSDGEN_CONFIG` environment variable), and command-line overrides.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = ".lsdgen.toml";

/// Environment variable that points at an explicit config file
pub const CONFIG_ENV_VAR: &str = "LSDGEN_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid ignore file {path}: {source}")]
    IgnoreFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Source directory of each package, relative to its root
    pub source: String,
    /// Directory that receives the generated components, relative to each package root
    pub destination: String,
    /// Extension of generated component files (without dot)
    pub extension: String,
    /// Location of the type index written by the analysis front end, relative to each package root
    pub type_index: String,
    /// Package directories (relative to the working directory) that must be skipped
    pub ignore_package_paths: Vec<String>,
    /// Exported names that must not become components
    pub ignore_components: Vec<String>,
    pub log_level: String,
    /// Custom JSON-LD prefix replacing the one derived from the package name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_prefix: Option<String>,
    /// Write a debug dump of the resolved external module state
    pub debug_state: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            source: "lib".to_string(),
            destination: "components".to_string(),
            extension: "jsonld".to_string(),
            type_index: ".lsdgen/types.json".to_string(),
            ignore_package_paths: Vec::new(),
            ignore_components: Vec::new(),
            log_level: "info".to_string(),
            module_prefix: None,
            debug_state: false,
        }
    }
}

/// Values passed on the command line; `None` keeps the configured value
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub source: Option<String>,
    pub destination: Option<String>,
    pub extension: Option<String>,
    pub ignore_file: Option<PathBuf>,
    pub log_level: Option<String>,
    pub module_prefix: Option<String>,
    pub debug_state: bool,
}

impl GeneratorConfig {
    /// Config file location for the given working directory
    pub fn path(cwd: &Path) -> PathBuf {
        if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
            let trimmed = env_path.trim();
            if !trimmed.is_empty() {
                return PathBuf::from(trimmed);
            }
        }
        cwd.join(CONFIG_FILE_NAME)
    }

    /// Load the config file for `cwd`, falling back to defaults when absent
    pub fn load(cwd: &Path) -> Result<Self, ConfigError> {
        Self::load_from_path(&Self::path(cwd))
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(GeneratorConfig::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Layer command-line values on top of this config
    ///
    /// The ignore file is a JSON array of component names, resolved against `cwd`.
    pub fn with_overrides(mut self, cwd: &Path, overrides: CliOverrides) -> Result<Self, ConfigError> {
        if let Some(source) = overrides.source {
            self.source = source;
        }
        if let Some(destination) = overrides.destination {
            self.destination = destination;
        }
        if let Some(extension) = overrides.extension {
            self.extension = extension;
        }
        if let Some(log_level) = overrides.log_level {
            self.log_level = log_level;
        }
        if overrides.module_prefix.is_some() {
            self.module_prefix = overrides.module_prefix;
        }
        if overrides.debug_state {
            self.debug_state = true;
        }
        if let Some(ignore_file) = overrides.ignore_file {
            let path = cwd.join(ignore_file);
            let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            self.ignore_components = serde_json::from_str(&content)
                .map_err(|source| ConfigError::IgnoreFile { path, source })?;
        }
        Ok(self)
    }

    /// Whether a package directory is excluded from generation
    pub fn is_package_ignored(&self, cwd: &Path, package_root: &Path) -> bool {
        self.ignore_package_paths
            .iter()
            .any(|ignored| package_root.starts_with(cwd.join(ignored)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_config_file() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let config = GeneratorConfig::load_from_path(&temp_dir.path().join(CONFIG_FILE_NAME));
        assert!(config.is_ok_and(|c| c == GeneratorConfig::default()));
    }

    #[test]
    fn test_config_file_then_cli_overrides() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);
        let Ok(()) = fs::write(
            &config_path,
            "source = \"src\"\nextension = \"json\"\ndebug_state = true\n",
        ) else {
            return;
        };
        let Ok(()) = fs::write(temp_dir.path().join("ignore.json"), r#"["A", "B"]"#) else {
            return;
        };

        let Ok(config) = GeneratorConfig::load_from_path(&config_path) else {
            panic!("config file should parse");
        };
        assert_eq!(config.source, "src");
        assert_eq!(config.extension, "json");
        assert_eq!(config.destination, "components");
        assert!(config.debug_state);

        let overrides = CliOverrides {
            extension: Some("jsonld".to_string()),
            module_prefix: Some("ex".to_string()),
            ignore_file: Some(PathBuf::from("ignore.json")),
            ..Default::default()
        };
        let Ok(config) = config.with_overrides(temp_dir.path(), overrides) else {
            panic!("overrides should apply");
        };
        assert_eq!(config.source, "src");
        assert_eq!(config.extension, "jsonld");
        assert_eq!(config.module_prefix.as_deref(), Some("ex"));
        assert_eq!(config.ignore_components, vec!["A", "B"]);
    }

    #[test]
    fn test_invalid_ignore_file() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let Ok(()) = fs::write(temp_dir.path().join("ignore.json"), "{ not json") else {
            return;
        };
        let overrides = CliOverrides {
            ignore_file: Some(PathBuf::from("ignore.json")),
            ..Default::default()
        };
        let result = GeneratorConfig::default().with_overrides(temp_dir.path(), overrides);
        assert!(matches!(result, Err(ConfigError::IgnoreFile { .. })));
    }

    #[test]
    fn test_ignored_package_paths() {
        let config = GeneratorConfig {
            ignore_package_paths: vec!["ignored1/".to_string()],
            ..Default::default()
        };
        let cwd = Path::new("/work");
        assert!(config.is_package_ignored(cwd, Path::new("/work/ignored1")));
        assert!(!config.is_package_ignored(cwd, Path::new("/work/kept")));
    }
}
