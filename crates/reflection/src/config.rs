//! Reflection configuration - naming conventions and defaults
//!
//! Loaded from `ELIF_REFLECTION_*` environment variables, from YAML or JSON,
//! or built in code. Every loader validates before returning.

use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::inflection::{camelize, lower_camelize, pluralize, underscore};

pub const ENV_PRIMARY_KEY: &str = "ELIF_REFLECTION_PRIMARY_KEY";
pub const ENV_FOREIGN_KEY_CONVENTION: &str = "ELIF_REFLECTION_FOREIGN_KEY_CONVENTION";
pub const ENV_TABLE_NAMING: &str = "ELIF_REFLECTION_TABLE_NAMING";

const MODEL_PLACEHOLDER: &str = "{model}";

/// Foreign key naming conventions
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForeignKeyConvention {
    /// model_id (e.g., artist_id)
    #[default]
    Underscore,
    /// modelId (camelCase)
    CamelCase,
    /// ModelID (PascalCase with ID suffix)
    PascalCase,
    /// Custom pattern with {model} placeholder
    Custom(String),
}

impl ForeignKeyConvention {
    /// Build the foreign key column for a singular snake_case base name
    pub fn apply(&self, base: &str) -> String {
        match self {
            Self::Underscore => format!("{}_id", base),
            Self::CamelCase => format!("{}Id", lower_camelize(base)),
            Self::PascalCase => format!("{}ID", camelize(base)),
            Self::Custom(pattern) => pattern.replace(MODEL_PLACEHOLDER, base),
        }
    }
}

impl FromStr for ForeignKeyConvention {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "underscore" | "snake_case" => Ok(Self::Underscore),
            "camel_case" | "camelcase" => Ok(Self::CamelCase),
            "pascal_case" | "pascalcase" => Ok(Self::PascalCase),
            _ if s.contains(MODEL_PLACEHOLDER) => Ok(Self::Custom(s.to_string())),
            _ => Err(ConfigError::InvalidValue {
                field: "foreign_key_convention".to_string(),
                value: s.to_string(),
                expected: "underscore, camel_case, pascal_case, or a pattern containing {model}"
                    .to_string(),
            }),
        }
    }
}

/// Table naming conventions
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableNamingConvention {
    /// Plural form (artists, albums)
    #[default]
    Plural,
    /// Singular form (artist, album)
    Singular,
    /// Custom pattern with {model} placeholder
    Custom(String),
}

impl TableNamingConvention {
    /// Derive the table name of a model from its PascalCase name
    pub fn apply(&self, model_name: &str) -> String {
        let base = underscore(model_name);
        match self {
            Self::Plural => pluralize(&base),
            Self::Singular => base,
            Self::Custom(pattern) => pattern.replace(MODEL_PLACEHOLDER, &base),
        }
    }
}

impl FromStr for TableNamingConvention {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plural" => Ok(Self::Plural),
            "singular" => Ok(Self::Singular),
            _ if s.contains(MODEL_PLACEHOLDER) => Ok(Self::Custom(s.to_string())),
            _ => Err(ConfigError::InvalidValue {
                field: "table_naming_convention".to_string(),
                value: s.to_string(),
                expected: "plural, singular, or a pattern containing {model}".to_string(),
            }),
        }
    }
}

/// Configuration source information for debugging
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    EnvVar(String),
    Default(String),
}

/// Naming conventions and defaults used when inferring relationship metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflectionConfig {
    /// Primary key given to models that do not declare one; `None` leaves them keyless
    pub default_primary_key: Option<String>,
    pub foreign_key_convention: ForeignKeyConvention,
    pub table_naming_convention: TableNamingConvention,
}

impl Default for ReflectionConfig {
    fn default() -> Self {
        Self {
            default_primary_key: Some("id".to_string()),
            foreign_key_convention: ForeignKeyConvention::Underscore,
            table_naming_convention: TableNamingConvention::Plural,
        }
    }
}

impl ReflectionConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        let default_primary_key = match get_env_or_default(ENV_PRIMARY_KEY, "id").as_str() {
            "" | "none" => None,
            column => Some(column.to_string()),
        };
        let foreign_key_convention =
            get_env_or_default(ENV_FOREIGN_KEY_CONVENTION, "underscore").parse()?;
        let table_naming_convention = get_env_or_default(ENV_TABLE_NAMING, "plural").parse()?;

        let config = Self {
            default_primary_key,
            foreign_key_convention,
            table_naming_convention,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a `.yaml`, `.yml` or `.json` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ParseError {
            message: format!("failed to read {}: {}", path.display(), e),
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&contents),
            Some("json") => Self::from_json_str(&contents),
            _ => Err(ConfigError::ParseError {
                message: format!("unsupported configuration file: {}", path.display()),
            }),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref pk) = self.default_primary_key {
            if pk.trim().is_empty() {
                return Err(ConfigError::ValidationFailed {
                    field: "default_primary_key".to_string(),
                    reason: "Default primary key cannot be blank".to_string(),
                });
            }
        }

        if let ForeignKeyConvention::Custom(ref pattern) = self.foreign_key_convention {
            if !pattern.contains(MODEL_PLACEHOLDER) {
                return Err(ConfigError::ValidationFailed {
                    field: "foreign_key_convention".to_string(),
                    reason: format!("Custom pattern '{}' must contain {{model}}", pattern),
                });
            }
        }

        if let TableNamingConvention::Custom(ref pattern) = self.table_naming_convention {
            if !pattern.contains(MODEL_PLACEHOLDER) {
                return Err(ConfigError::ValidationFailed {
                    field: "table_naming_convention".to_string(),
                    reason: format!("Custom pattern '{}' must contain {{model}}", pattern),
                });
            }
        }

        Ok(())
    }

    /// Get configuration source information for debugging
    pub fn config_sources(&self) -> HashMap<String, ConfigSource> {
        let mut sources = HashMap::new();
        for (field, var) in [
            ("default_primary_key", ENV_PRIMARY_KEY),
            ("foreign_key_convention", ENV_FOREIGN_KEY_CONVENTION),
            ("table_naming_convention", ENV_TABLE_NAMING),
        ] {
            let source = if env::var(var).is_ok() {
                ConfigSource::EnvVar(var.to_string())
            } else {
                ConfigSource::Default(field.to_string())
            };
            sources.insert(field.to_string(), source);
        }
        sources
    }

    /// Foreign key column for a singular snake_case base name
    pub fn foreign_key_for(&self, base: &str) -> String {
        self.foreign_key_convention.apply(base)
    }

    /// Table name for a model name
    pub fn table_name_for(&self, model_name: &str) -> String {
        self.table_naming_convention.apply(model_name)
    }
}

fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: '{value}', expected {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },

    #[error("Validation failed for {field}: {reason}")]
    ValidationFailed { field: String, reason: String },

    #[error("Configuration parsing error: {message}")]
    ParseError { message: String },

    #[error("Global schema is already initialized")]
    AlreadyInitialized,
}
