//! Configuration handling for rubric
//!
//! Configuration is a TOML document whose tables are keyed by cop name:
//!
//! ```toml
//! ["Style/FormatString"]
//! EnforcedStyle = "percent"
//!
//! ["Naming/RescuedExceptionsVariableName"]
//! PreferredName = "error"
//! Severity = "warning"
//!
//! ["Style/SimpleIfClause"]
//! Enabled = false
//! ```
//!
//! `Enabled` and `Severity` are understood for every cop; all other keys are
//! cop-specific options.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use rubric_core::RubricError;
use serde::{Deserialize, Serialize};

use crate::offense::Severity;

/// Name of the project configuration file.
pub const CONFIG_FILE_NAME: &str = ".rubric.toml";

/// Per-cop settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CopConfig {
    /// Run this cop (default true)
    #[serde(rename = "Enabled", default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Severity of reported offenses
    #[serde(rename = "Severity", default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,

    /// Cop-specific options
    #[serde(flatten)]
    pub options: BTreeMap<String, toml::Value>,
}

impl CopConfig {
    pub fn with_option(mut self, key: &str, value: impl Into<toml::Value>) -> Self {
        self.options.insert(key.to_string(), value.into());
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn severity_or_default(&self) -> Severity {
        self.severity.unwrap_or_default()
    }

    /// Look up a string option. Present values of another type are an error.
    pub fn string_option(&self, cop: &str, key: &str) -> Result<Option<&str>, RubricError> {
        match self.options.get(key) {
            None => Ok(None),
            Some(toml::Value::String(value)) => Ok(Some(value.as_str())),
            Some(other) => Err(RubricError::InvalidConfig {
                cop: cop.to_string(),
                option: key.to_string(),
                value: other.to_string(),
                expected: "a string".to_string(),
            }),
        }
    }

    /// Overlay `other` on top of these settings.
    pub fn merge(&mut self, other: CopConfig) {
        if other.enabled.is_some() {
            self.enabled = other.enabled;
        }
        if other.severity.is_some() {
            self.severity = other.severity;
        }
        self.options.extend(other.options);
    }
}

/// Rubric configuration: cop name to settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Config {
    cops: BTreeMap<String, CopConfig>,
}

impl Config {
    /// The shipped defaults.
    pub fn builtin() -> Self {
        Config::default()
            .with_cop(
                "Naming/RescuedExceptionsVariableName",
                CopConfig::default().with_option("PreferredName", "e"),
            )
            .with_cop(
                "Style/FormatString",
                CopConfig::default().with_option("EnforcedStyle", "format"),
            )
            .with_cop("Style/SimpleIfClause", CopConfig::default())
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, RubricError> {
        toml::from_str(content).map_err(|e| RubricError::ConfigFile {
            message: format!("failed to parse config file: {}", e),
        })
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, RubricError> {
        let content = fs::read_to_string(path).map_err(|e| RubricError::ConfigFile {
            message: format!("failed to read config file {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// Built-in defaults overlaid with `.rubric.toml` from the given project root, if any
    pub fn load_from_project(project_root: &Path) -> Result<Self, RubricError> {
        let mut config = Config::builtin();
        let config_path = project_root.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            config.merge(Self::load(&config_path)?);
        }
        Ok(config)
    }

    pub fn with_cop(mut self, name: &str, cop: CopConfig) -> Self {
        self.cops.insert(name.to_string(), cop);
        self
    }

    /// Settings for `name`, or empty settings if the cop is not mentioned.
    pub fn cop(&self, name: &str) -> CopConfig {
        self.cops.get(name).cloned().unwrap_or_default()
    }

    pub fn cop_names(&self) -> impl Iterator<Item = &str> {
        self.cops.keys().map(String::as_str)
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        match self.cops.get(name) {
            Some(cop) => cop.is_enabled(),
            None => true,
        }
    }

    /// Overlay `other` on top of this configuration, cop by cop.
    pub fn merge(&mut self, other: Config) {
        for (name, cop) in other.cops {
            self.cops.entry(name).or_default().merge(cop);
        }
    }
}
