mod log_level;

use std::path::Path;

use indexmap::IndexMap;
use value::{AbsentPolicy, Record, Value};

pub use log_level::LogLevel;

/// Engine configuration, usually read from a TOML file. Every section is optional.
#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Rendering of the response
    pub response: ResponseConfig,
    /// Limits applied to every execution
    pub execution: ExecutionConfig,
    /// `debug` expression nodes
    pub debug: DebugConfig,
    /// Ambient values, readable by resolvers under `env`
    pub env: IndexMap<String, toml::Value>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResponseConfig {
    pub absent_fields: AbsentPolicy,
    pub field_order: FieldOrder,
}

/// Order of the keys of a response object.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldOrder {
    /// The order fields are declared in on their object type.
    #[default]
    Schema,
    /// The order fields are first selected in by the query.
    Selection,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutionConfig {
    /// Deepest selection set nesting accepted, the root selection being depth 1.
    pub max_depth: Option<usize>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DebugConfig {
    pub level: LogLevel,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not read the configuration at {path}: {err}")]
    Read { path: String, err: std::io::Error },
    #[error(transparent)]
    Parse(#[from] toml::de::Error),
}

impl Config {
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.display().to_string(),
            err,
        })?;
        let config = Self::from_toml(&input)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// The `[env]` table as the record resolvers see.
    pub fn env_record(&self) -> Record {
        self.env
            .iter()
            .map(|(key, value)| (key.clone(), toml_to_value(value)))
            .collect()
    }
}

fn toml_to_value(value: &toml::Value) -> Value {
    match value {
        toml::Value::String(value) => Value::String(value.clone()),
        toml::Value::Integer(value) => Value::Int(*value),
        toml::Value::Float(value) => Value::Float(*value),
        toml::Value::Boolean(value) => Value::Bool(*value),
        toml::Value::Datetime(datetime) => Value::String(datetime.to_string()),
        toml::Value::Array(items) => Value::Sequence(items.iter().map(toml_to_value).collect()),
        toml::Value::Table(table) => Value::Record(
            table
                .iter()
                .map(|(key, value)| (key.clone(), toml_to_value(value)))
                .collect(),
        ),
    }
}
