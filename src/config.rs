//! Configuration for the stdnames tools.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (STDNAMES_XMLLINT, STDNAMES_SCHEMA_DIR)
//! 2. Config file (.stdnames/config.yaml, then <user config dir>/stdnames/config.yaml)
//! 3. Defaults
//!
//! Config file discovery:
//! - Searches current directory and parents for .stdnames/config.yaml
//! - Paths in config file are relative to the directory holding .stdnames/

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::adapters::XmllintValidator;

/// Output base name used when neither the CLI nor the config file set one
pub const DEFAULT_OUTPUT_FILENAME: &str = "Metadata-standard-names";

const DEFAULT_XMLLINT: &str = "xmllint";
const CONFIG_DIR: &str = ".stdnames";
const CONFIG_FILE: &str = "config.yaml";

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub convert: ConvertConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValidationConfig {
    /// Validator program
    pub xmllint: Option<String>,
    /// Directory holding the XSD files (relative to the project root)
    pub schema_dir: Option<String>,
    /// Fail when the validator program cannot be found
    pub required: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConvertConfig {
    /// Output file name without extension
    pub output_filename: Option<String>,
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Validator program
    pub xmllint: PathBuf,
    /// Where to look for schema files (defaults to the library file's directory)
    pub schema_dir: Option<PathBuf>,
    /// Whether a missing validator is an error
    pub validator_required: bool,
    /// Default output base name for `convert`
    pub output_filename: String,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            xmllint: PathBuf::from(DEFAULT_XMLLINT),
            schema_dir: None,
            validator_required: true,
            output_filename: DEFAULT_OUTPUT_FILENAME.to_string(),
            config_file: None,
        }
    }
}

impl ResolvedConfig {
    /// The configured schema validator
    pub fn validator(&self) -> XmllintValidator {
        XmllintValidator::new(&self.xmllint, self.validator_required)
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(CONFIG_DIR).join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    let user_config = dirs::config_dir()?.join("stdnames").join(CONFIG_FILE);
    user_config.exists().then_some(user_config)
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's project root
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Merge a parsed config file and environment lookups over the defaults
fn resolve(
    file: Option<(PathBuf, ConfigFile)>,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    let mut resolved = ResolvedConfig::default();

    if let Some((config_path, config)) = file {
        // Base directory is the parent of .stdnames/ (i.e., grandparent of config.yaml)
        let base_dir = config_path
            .parent()
            .and_then(|p| p.parent())
            .unwrap_or(Path::new("."));

        if let Some(program) = config.validation.xmllint {
            resolved.xmllint = PathBuf::from(program);
        }
        resolved.schema_dir = config
            .validation
            .schema_dir
            .as_deref()
            .map(|dir| resolve_path(base_dir, dir));
        if let Some(required) = config.validation.required {
            resolved.validator_required = required;
        }
        if let Some(name) = config.convert.output_filename {
            resolved.output_filename = name;
        }
        resolved.config_file = Some(config_path);
    }

    if let Some(program) = env("STDNAMES_XMLLINT") {
        resolved.xmllint = PathBuf::from(program);
    }
    if let Some(dir) = env("STDNAMES_SCHEMA_DIR") {
        resolved.schema_dir = Some(PathBuf::from(dir));
    }

    resolved
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let file = match find_config_file() {
        Some(path) => {
            let config = load_config_file(&path)?;
            Some((path, config))
        }
        None => None,
    };

    Ok(resolve(file, |key| std::env::var(key).ok()))
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}
