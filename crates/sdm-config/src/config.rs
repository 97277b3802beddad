// crates/sdm-config/src/config.rs
// ============================================================================
// Module: SDM Configuration
// Description: Configuration loading and validation for the generator.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: sdm-codegen, sdm-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Unknown keys are rejected. Relative paths inside the file resolve against
//! the directory that contains it.
//!
//! Path resolution order: explicit path, then `SDM_CONFIG`, then `sdm.toml`
//! in the working directory. Only the last two may be absent; see
//! [`SdmConfig::load_optional`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use sdm_codegen::BackendKind;
use sdm_codegen::Generator;
use sdm_core::TemplateNaming;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "sdm.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "SDM_CONFIG";
/// Maximum configuration file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of schema or extra files.
const MAX_INPUT_FILES: usize = 4096;

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Root `sdm.toml` configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SdmConfig {
    /// Descriptor JSON files to generate from.
    #[serde(default)]
    pub schema_files: Vec<PathBuf>,
    /// Output directory.
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Selected backends; empty selects all.
    #[serde(default)]
    pub backends: Vec<BackendKind>,
    /// JSON files of extra generated files, appended unchanged.
    #[serde(default)]
    pub extra_files: Vec<PathBuf>,
    /// Naming templates.
    #[serde(default)]
    pub naming: NamingConfig,
    /// Directory relative paths resolve against (not serialized).
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl Default for SdmConfig {
    fn default() -> Self {
        Self {
            schema_files: Vec::new(),
            output: default_output(),
            backends: Vec::new(),
            extra_files: Vec::new(),
            naming: NamingConfig::default(),
            base_dir: None,
        }
    }
}

/// Naming templates for derived storage objects.
///
/// # Invariants
/// - Table and view templates contain `{Message}` or `{message}`.
/// - `hashed_field` contains `{field}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamingConfig {
    /// Sensitive table template.
    #[serde(default = "default_sensitive_table")]
    pub sensitive_table: String,
    /// Audit table template.
    #[serde(default = "default_audit_table")]
    pub audit_table: String,
    /// View template.
    #[serde(default = "default_view")]
    pub view: String,
    /// Hashed audit field template.
    #[serde(default = "default_hashed_field")]
    pub hashed_field: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            sensitive_table: default_sensitive_table(),
            audit_table: default_audit_table(),
            view: default_view(),
            hashed_field: default_hashed_field(),
        }
    }
}

impl NamingConfig {
    /// Builds the naming convention.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a template lacks its placeholder.
    pub fn to_naming(&self) -> Result<TemplateNaming, ConfigError> {
        TemplateNaming::new(
            self.sensitive_table.clone(),
            self.audit_table.clone(),
            self.view.clone(),
            self.hashed_field.clone(),
        )
        .map_err(|err| ConfigError::Invalid(format!("naming: {err}")))
    }
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl SdmConfig {
    /// Loads configuration using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file is missing, unreadable, or
    /// invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        Self::load_from(&resolved)
    }

    /// Loads configuration, tolerating an absent implicit config file.
    ///
    /// Returns `None` when no path was given and neither `SDM_CONFIG` nor
    /// `sdm.toml` names an existing file. An explicit path must exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a config file exists but is invalid, or
    /// when an explicit path is missing.
    pub fn load_optional(path: Option<&Path>) -> Result<Option<Self>, ConfigError> {
        if path.is_some() {
            return Self::load(path).map(Some);
        }
        let resolved = resolve_path(None)?;
        match fs::metadata(&resolved) {
            Ok(_) => Self::load_from(&resolved).map(Some),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(ConfigError::Io(err.to_string())),
        }
    }

    /// Loads and validates the file at `path`.
    fn load_from(path: &Path) -> Result<Self, ConfigError> {
        validate_path(path)?;
        let bytes = fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config = Self::from_toml_str(content)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_path_list("schema_files", &self.schema_files)?;
        validate_path_list("extra_files", &self.extra_files)?;
        validate_path_string("output", &self.output)?;
        for (idx, backend) in self.backends.iter().enumerate() {
            if self.backends[.. idx].contains(backend) {
                return Err(ConfigError::Invalid(format!("backends lists {backend} twice")));
            }
        }
        self.naming.to_naming()?;
        Ok(())
    }

    /// Returns the effective backend list.
    #[must_use]
    pub fn backends(&self) -> Vec<BackendKind> {
        if self.backends.is_empty() { BackendKind::ALL.to_vec() } else { self.backends.clone() }
    }

    /// Builds a generator from the naming and backend settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the naming templates are invalid.
    pub fn generator(&self) -> Result<Generator, ConfigError> {
        Ok(Generator::new(self.naming.to_naming()?, self.backends()))
    }

    /// Resolves a config-relative path against the config directory.
    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Returns schema file paths resolved against the config directory.
    #[must_use]
    pub fn resolved_schema_files(&self) -> Vec<PathBuf> {
        self.schema_files.iter().map(|path| self.resolve(path)).collect()
    }

    /// Returns extra file paths resolved against the config directory.
    #[must_use]
    pub fn resolved_extra_files(&self) -> Vec<PathBuf> {
        self.extra_files.iter().map(|path| self.resolve(path)).collect()
    }

    /// Returns the output directory resolved against the config directory.
    #[must_use]
    pub fn resolved_output(&self) -> PathBuf {
        self.resolve(&self.output)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Default output directory.
fn default_output() -> PathBuf {
    PathBuf::from("generated")
}

/// Default sensitive table template.
fn default_sensitive_table() -> String {
    "{Message}Pii".to_string()
}

/// Default audit table template.
fn default_audit_table() -> String {
    "{Message}Chain".to_string()
}

/// Default view template.
fn default_view() -> String {
    "{message}_view".to_string()
}

/// Default hashed field template.
fn default_hashed_field() -> String {
    "hashed_{field}".to_string()
}

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a configured path against length constraints.
fn validate_path_string(field: &str, path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in path.components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a list of configured paths.
fn validate_path_list(field: &str, paths: &[PathBuf]) -> Result<(), ConfigError> {
    if paths.len() > MAX_INPUT_FILES {
        return Err(ConfigError::Invalid(format!("{field} exceeds {MAX_INPUT_FILES} entries")));
    }
    for path in paths {
        validate_path_string(field, path)?;
    }
    Ok(())
}
