//! # Configuration System
//!
//! YAML-based session configuration: which filter design classes to
//! offer, which input / plot / fixpoint widgets to expose, and how to
//! log. The schema is typed, so malformed values fail at parse time
//! with a clear error instead of surfacing later as odd behavior, and
//! duplicate entries collapse in the map instead of corrupting the
//! file.
//!
//! The file carries a format version. A mismatch triggers one attempt
//! to regenerate a fresh default file; a second mismatch is an error
//! the caller should treat as fatal, since it means the installation
//! cannot write its own configuration.
//!
//! ## Configuration Search Path
//!
//! Configuration is loaded from the first file found:
//! 1. Path specified via `RFDA_CONF` environment variable
//! 2. `./rfda.yaml` (current directory)
//! 3. `~/.config/rfda/rfda.yaml` (user config)
//! 4. `/etc/rfda/rfda.yaml` (system config)
//!
//! ## Example Configuration
//!
//! ```yaml
//! version: 4
//!
//! filter_designs:
//!   butterworth:
//!     fixpoint: [iir_df1]
//!   ma:
//!     fixpoint: [fir_df]
//!     options:
//!       comment: "keep for the FPGA flow"
//!
//! fixpoint_widgets: [fir_df, iir_df1]
//!
//! logging:
//!   level: info
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::logging::LogConfig;

/// Format version this build reads and writes.
pub const CONFIG_VERSION: u32 = 4;

/// Error type for configuration operations.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found
    NotFound(String),
    /// Failed to read or write the configuration file
    ReadError(String),
    /// Failed to parse configuration
    ParseError(String),
    /// Version still wrong after regenerating the file
    VersionMismatch { expected: u32, found: u32 },
    /// Invalid configuration value
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(msg) => write!(f, "config not found: {}", msg),
            ConfigError::ReadError(msg) => write!(f, "failed to read config: {}", msg),
            ConfigError::ParseError(msg) => write!(f, "failed to parse config: {}", msg),
            ConfigError::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "config version {} does not match required version {}",
                    found, expected
                )
            }
            ConfigError::ValidationError(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Per-design-class options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignOptions {
    /// Fixpoint widgets this class can feed. Names are checked against
    /// the session's `fixpoint_widgets` list when the registry builds.
    pub fixpoint: Vec<String>,
    /// Free-form key/value options passed through to the class.
    pub options: BTreeMap<String, String>,
}

/// Complete session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RfdaConfig {
    /// Configuration format version
    pub version: u32,
    /// Input widgets to expose
    pub input_widgets: Vec<String>,
    /// Plot widgets to expose
    pub plot_widgets: Vec<String>,
    /// Filter design classes to register (name -> options)
    pub filter_designs: BTreeMap<String, DesignOptions>,
    /// Fixpoint widgets available to design classes
    pub fixpoint_widgets: Vec<String>,
    /// Logging configuration
    pub logging: LogConfig,
}

impl Default for RfdaConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            input_widgets: string_vec(&["specs", "coeffs", "info", "fixpoint"]),
            plot_widgets: string_vec(&["h_f", "phi_f", "pz", "impz", "tran_fix"]),
            filter_designs: default_designs(),
            fixpoint_widgets: string_vec(&["fir_df", "iir_df1"]),
            logging: LogConfig::default(),
        }
    }
}

fn string_vec(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_designs() -> BTreeMap<String, DesignOptions> {
    let mut designs = BTreeMap::new();
    for (name, fixpoint) in [
        ("butterworth", &["iir_df1"][..]),
        ("fir_window", &["fir_df"]),
        ("ma", &["fir_df"]),
        ("manual_fir", &["fir_df"]),
        ("manual_iir", &["iir_df1"]),
    ] {
        designs.insert(
            name.to_string(),
            DesignOptions {
                fixpoint: string_vec(fixpoint),
                options: BTreeMap::new(),
            },
        );
    }
    designs
}

impl RfdaConfig {
    /// Load configuration from the default search path.
    ///
    /// Search order:
    /// 1. `RFDA_CONF` environment variable
    /// 2. `./rfda.yaml`
    /// 3. `~/.config/rfda/rfda.yaml`
    /// 4. `/etc/rfda/rfda.yaml`
    ///
    /// Returns the default config if no file is found.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var("RFDA_CONF") {
            if Path::new(&path).exists() {
                return Self::load_from(Path::new(&path));
            }
        }

        let paths = Self::config_search_paths();
        for path in &paths {
            if path.exists() {
                return Self::load_from(path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        Self::parse(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))
    }

    /// Load a versioned configuration file, regenerating it once if
    /// the version does not match.
    ///
    /// - Missing file: a default file is written and returned.
    /// - Unparseable file: an error; the file is left untouched for
    ///   inspection.
    /// - Version mismatch: the file is replaced with a fresh default
    ///   and reloaded. If the reloaded version still mismatches the
    ///   error is returned to the caller.
    pub fn load_or_regenerate(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            info!("wrote default configuration to {}", path.display());
            return Ok(config);
        }

        let config = Self::load_from(path)?;
        if config.version == CONFIG_VERSION {
            return Ok(config);
        }

        warn!(
            found = config.version,
            expected = CONFIG_VERSION,
            "configuration version mismatch, regenerating {}",
            path.display()
        );
        Self::default().save(path)?;
        let config = Self::load_from(path)?;
        if config.version != CONFIG_VERSION {
            return Err(ConfigError::VersionMismatch {
                expected: CONFIG_VERSION,
                found: config.version,
            });
        }
        Ok(config)
    }

    /// Get configuration search paths.
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./rfda.yaml")];

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "rfda") {
            paths.push(config_dir.config_dir().join("rfda.yaml"));
        }

        paths.push(PathBuf::from("/etc/rfda/rfda.yaml"));

        paths
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.filter_designs.is_empty() {
            return Err(ConfigError::ValidationError(
                "no filter design classes configured".to_string(),
            ));
        }

        for (name, opts) in &self.filter_designs {
            if name.is_empty() {
                return Err(ConfigError::ValidationError(
                    "filter design names must not be empty".to_string(),
                ));
            }
            for fx in &opts.fixpoint {
                if fx.is_empty() {
                    return Err(ConfigError::ValidationError(format!(
                        "empty fixpoint widget name under '{}'",
                        name
                    )));
                }
            }
        }

        Ok(())
    }

    /// Generate example configuration YAML.
    pub fn example_yaml() -> String {
        serde_yaml::to_string(&Self::default()).unwrap_or_default()
    }
}

// ============================================================================
// Tests
// ============================================================================
