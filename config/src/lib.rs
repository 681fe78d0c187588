//! Rollup Validator Configuration
//!
//! Shared configuration crate for the transition validator and its CLI.
//!
//! Handles loading configuration from:
//! 1. ROLLUP_CONFIG env var (explicit path)
//! 2. ./config.toml (current directory)
//! 3. ~/.rollup/config.toml (user home)
//!
//! Environment variables take precedence over TOML config.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs};

const CONFIG_FILE_NAME: &str = "config.toml";
const CONFIG_DIR_NAME: &str = ".rollup";

// ============================================================================
// Default Constants
// ============================================================================

/// Account tree depth used by the reference deployment (32 accounts).
pub const DEFAULT_TREE_DEPTH: usize = 5;

/// Largest supported depth. Leaf indices are `u64` and sparse trees above
/// this size are not something a single transfer witness needs.
pub const MAX_TREE_DEPTH: usize = 32;

const DEFAULT_LOG_LEVEL: &str = "info";

// ============================================================================
// Config Structs
// ============================================================================

/// Root configuration structure (matches TOML layout)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    #[serde(default)]
    pub tree: TreeConfig,
    #[serde(default)]
    pub hash: HashConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Account tree configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeConfig {
    #[serde(default = "default_tree_depth")]
    pub depth: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_TREE_DEPTH,
        }
    }
}

fn default_tree_depth() -> usize {
    DEFAULT_TREE_DEPTH
}

/// Hash function selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HashConfig {
    #[serde(default)]
    pub kind: HashKind,
}

/// Compression function used for Merkle nodes, leaves and transfer digests
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HashKind {
    #[default]
    Mimc,
    Poseidon,
}

impl std::str::FromStr for HashKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mimc" => Ok(Self::Mimc),
            "poseidon" => Ok(Self::Poseidon),
            other => bail!("unknown hash kind: {other}"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.into(),
        }
    }
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.into()
}

// ============================================================================
// Environment Variable Helpers
// ============================================================================

/// Set field from env var if present
fn env_string(key: &str, field: &mut String) {
    if let Ok(v) = env::var(key) {
        *field = v;
    }
}

/// Set field from env var if present and parseable
fn env_parse<T: std::str::FromStr>(key: &str, field: &mut T) {
    if let Ok(v) = env::var(key) {
        match v.parse() {
            Ok(parsed) => *field = parsed,
            Err(_) => log::warn!("Ignoring unparseable value for {}: {}", key, v),
        }
    }
}

// ============================================================================
// Implementation
// ============================================================================

impl ValidatorConfig {
    /// Load configuration from config file with env var overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::find_config_file() {
            Some(path) => {
                log::info!("Loading config from: {}", path.display());
                Self::parse_file(&path)?
            }
            None => {
                log::info!("No config file found, using defaults and environment variables");
                Self::default()
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::parse_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn parse_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Find the config file path
    fn find_config_file() -> Option<PathBuf> {
        // 1. Check ROLLUP_CONFIG env var
        if let Ok(path) = env::var("ROLLUP_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check ./config.toml (current directory)
        let local_path = PathBuf::from(CONFIG_FILE_NAME);
        if local_path.exists() {
            return Some(local_path);
        }

        // 3. Check ~/.rollup/config.toml
        Self::default_config_path().filter(|p| p.exists())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        env_parse("ROLLUP_TREE_DEPTH", &mut self.tree.depth);
        env_parse("ROLLUP_HASH", &mut self.hash.kind);
        env_string("ROLLUP_LOG", &mut self.logging.level);
    }

    /// Reject settings the validator cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.tree.depth == 0 || self.tree.depth > MAX_TREE_DEPTH {
            bail!(
                "tree depth must be between 1 and {}, got {}",
                MAX_TREE_DEPTH,
                self.tree.depth
            );
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Generate a sample config file
    pub fn generate_sample() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}
