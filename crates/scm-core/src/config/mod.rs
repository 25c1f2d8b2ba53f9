//! # SCM Configuration
//!
//! Reads configuration files (JSON, plus YAML and TOML when the matching
//! features are enabled), follows their `includeFiles`, and merges everything
//! that was loaded into a single [`ScmConfig`].
//!
//! Merge rules, applied in load order:
//! - the first `configDir` wins;
//! - the last `dataDir`, `setuid` and `setgid` win;
//! - `components` are concatenated.
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use json_comments::StripComments;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::kernel::constants::{DATA_DIR_NAME, DEFAULT_CONFIG_DIR};
use crate::kernel::error::{Error, Result};

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ConfigFormat {
    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "yaml",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "toml",
        }
    }

    /// Determine format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                #[cfg(feature = "yaml-config")]
                "yaml" | "yml" => Some(ConfigFormat::Yaml),
                #[cfg(feature = "toml-config")]
                "toml" => Some(ConfigFormat::Toml),
                _ => None,
            })
    }

    /// Parse `data` as a configuration file in this format.
    /// JSON may carry `//` and `/* */` comments.
    pub fn parse(&self, data: &str) -> std::result::Result<ConfigFile, String> {
        match self {
            ConfigFormat::Json => {
                serde_json::from_reader(StripComments::new(data.as_bytes())).map_err(|e| e.to_string())
            }
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::from_str(data).map_err(|e| e.to_string()),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::from_str(data).map_err(|e| e.to_string()),
        }
    }
}

/// A user or group, by number or by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Numeric(u32),
    Name(String),
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Numeric(id) => write!(f, "{}", id),
            Id::Name(name) => f.write_str(name),
        }
    }
}

impl From<u32> for Id {
    fn from(id: u32) -> Self {
        Id::Numeric(id)
    }
}

impl From<&str> for Id {
    fn from(name: &str) -> Self {
        Id::Name(name.to_string())
    }
}

/// One configuration file as written on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setuid: Option<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setgid: Option<Id>,
    /// Further configuration files to load after this one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_files: Vec<PathBuf>,
    /// Raw component descriptors, validated later by the director
    #[serde(default)]
    pub components: Vec<Value>,
}

/// The merged result of every loaded configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct ScmConfig {
    /// Canonical configuration directory
    pub config_dir: PathBuf,
    /// Canonical data directory; created if it did not exist
    pub data_dir: PathBuf,
    pub setuid: Option<Id>,
    pub setgid: Option<Id>,
    pub components: Vec<Value>,
}

/// Collects configuration files in load order.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    configs: Vec<ConfigFile>,
    /// Include files already followed, to stop include loops
    included: HashSet<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an in-memory configuration (for example, command-line options)
    pub fn with_config(config: ConfigFile) -> Self {
        let mut loader = Self::new();
        loader.add(config);
        loader
    }

    /// Read and parse a configuration file.
    pub fn read_config(path: &Path) -> Result<ConfigFile> {
        let format = ConfigFormat::from_path(path).ok_or_else(|| Error::Config {
            path: path.to_path_buf(),
            message: "unsupported configuration file extension".to_string(),
        })?;
        let data = fs::read_to_string(path).map_err(|e| Error::io(e, "read config", path))?;
        format.parse(&data).map_err(|message| Error::Config {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Load a configuration file and its includes.
    ///
    /// A file that cannot be read or parsed is skipped with a warning and
    /// `false` is returned. So is a file that was already loaded.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        log::info!("Loading {} ...", path.display());
        let resolved = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if self.included.contains(&resolved) {
            log::warn!("config file {} already loaded, skipping", path.display());
            return false;
        }
        match Self::read_config(path) {
            Ok(config) => {
                self.included.insert(resolved);
                self.add(config);
                true
            }
            Err(err) => {
                log::warn!("couldn't load config file {}: {}", path.display(), err);
                false
            }
        }
    }

    /// Append a configuration, then every file it includes (recursively).
    ///
    /// An included file without its own `configDir` gets the directory it
    /// was loaded from. Relative include paths are resolved against the
    /// including configuration's `configDir` when it has one.
    pub fn add(&mut self, config: ConfigFile) {
        let base_dir = config.config_dir.clone();
        let includes = config.include_files.clone();
        self.configs.push(config);

        for include in includes {
            let path = match &base_dir {
                Some(dir) if include.is_relative() => dir.join(&include),
                _ => include,
            };
            let resolved = fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
            if !self.included.insert(resolved.clone()) {
                log::warn!("config file {} already included, skipping", path.display());
                continue;
            }

            match Self::read_config(&resolved) {
                Ok(mut included) => {
                    if included.config_dir.is_none() {
                        included.config_dir = resolved.parent().map(Path::to_path_buf);
                    }
                    self.add(included);
                }
                Err(err) => {
                    log::warn!("couldn't load config file {}: {}", path.display(), err);
                }
            }
        }
    }

    /// Loaded configurations, in load order
    pub fn configs(&self) -> &[ConfigFile] {
        &self.configs
    }

    /// Merge every loaded configuration into the final settings.
    ///
    /// The data directory is created if it does not exist yet, and both
    /// directories are canonicalized.
    pub fn merge(&self) -> Result<ScmConfig> {
        let mut config_dir: Option<PathBuf> = None;
        let mut data_dir: Option<PathBuf> = None;
        let mut setuid = None;
        let mut setgid = None;
        let mut components = Vec::new();

        for config in &self.configs {
            if config_dir.is_none() {
                config_dir = config.config_dir.clone();
            }
            if config.data_dir.is_some() {
                data_dir = config.data_dir.clone();
            }
            if config.setuid.is_some() {
                setuid = config.setuid.clone();
            }
            if config.setgid.is_some() {
                setgid = config.setgid.clone();
            }
            components.extend(config.components.iter().cloned());
        }

        let config_dir = config_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR));
        let data_dir = data_dir.unwrap_or_else(|| config_dir.join(DATA_DIR_NAME));

        let config_dir = fs::canonicalize(&config_dir)
            .map_err(|e| Error::io(e, "resolve config directory", &config_dir))?;
        fs::create_dir_all(&data_dir).map_err(|e| Error::io(e, "create data directory", &data_dir))?;
        let data_dir = fs::canonicalize(&data_dir)
            .map_err(|e| Error::io(e, "resolve data directory", &data_dir))?;

        log::debug!(
            "merged {} config(s): config_dir={}, data_dir={}, {} component(s)",
            self.configs.len(),
            config_dir.display(),
            data_dir.display(),
            components.len()
        );

        Ok(ScmConfig {
            config_dir,
            data_dir,
            setuid,
            setgid,
            components,
        })
    }
}
