//! Typed configuration layer.
//!
//! Connector-declared config schemas (auth_config / config records) are
//! modeled downstream in `airweave-source` as plain records validated
//! against this layer's [`ConfigValue`] primitives rather than as
//! duck-typed maps.

mod secrets;

pub use secrets::{resolve_placeholders, DefaultSecretResolver, SecretResolver};

use std::collections::HashMap;
use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    Load(String),
    NotFound(String),
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Load(msg) => write!(f, "failed to load config: {msg}"),
            ConfigError::NotFound(msg) => write!(f, "config key not found: {msg}"),
            ConfigError::Validation(msg) => write!(f, "config validation failed: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// A loosely-typed configuration value, resolved from env/file-backed
/// sources before being consumed by a strongly-typed section.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    String(String),
    Integer(i64),
    Bool(bool),
    List(Vec<ConfigValue>),
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::String(s) => write!(f, "{s}"),
            ConfigValue::Integer(i) => write!(f, "{i}"),
            ConfigValue::Bool(b) => write!(f, "{b}"),
            ConfigValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// The known environment variables the core pipeline consults.
pub mod env_keys {
    pub const AUTH_ENABLED: &str = "AUTH_ENABLED";
    pub const FIRST_SUPERUSER: &str = "FIRST_SUPERUSER";
    pub const ENVIRONMENT: &str = "ENVIRONMENT";
    pub const STRIPE_TEST_CLOCK: &str = "STRIPE_TEST_CLOCK";
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    pub const TEXT2VEC_INFERENCE_URL: &str = "TEXT2VEC_INFERENCE_URL";
    pub const DOCLING_BASE_URL: &str = "DOCLING_BASE_URL";
    pub const CEREBRAS_API_KEY: &str = "CEREBRAS_API_KEY";
}

/// A resolved bag of config values for one named section (e.g. a source's
/// `config_fields`, or the pipeline's tuning knobs).
#[derive(Debug, Clone, Default)]
pub struct ConfigSection {
    values: HashMap<String, ConfigValue>,
}

impl ConfigSection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(mut self, key: impl Into<String>, value: ConfigValue) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    pub fn require(&self, key: &str) -> Result<&ConfigValue, ConfigError> {
        self.get(key)
            .ok_or_else(|| ConfigError::NotFound(key.to_string()))
    }

    /// Load a section's values from the process environment, resolving
    /// `${...}` placeholders via `resolver`.
    pub fn from_env(
        keys: &[&str],
        resolver: &dyn SecretResolver,
    ) -> Result<Self, ConfigError> {
        let mut section = Self::new();
        for key in keys {
            if let Ok(raw) = std::env::var(key) {
                let resolved = resolve_placeholders(&raw, resolver)?;
                section = section.insert(*key, ConfigValue::String(resolved));
            }
        }
        Ok(section)
    }
}
