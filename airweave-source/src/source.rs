//! The `Source` contract every connector implements, and the declarative
//! catalog of registered sources.

use crate::entity::SourceEntity;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::pin::Pin;
use tokio_stream::Stream;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthenticationMethod {
    OauthBrowser,
    OauthToken,
    OauthByoc,
    Direct,
    AuthProvider,
}

use serde::{Deserialize, Serialize};

#[derive(Debug)]
pub enum SourceValidationError {
    Invalid(String),
}

impl std::fmt::Display for SourceValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceValidationError::Invalid(msg) => write!(f, "credential validation failed: {msg}"),
        }
    }
}

impl std::error::Error for SourceValidationError {}

pub type EntityStream = Pin<Box<dyn Stream<Item = Result<SourceEntity, SourceValidationError>> + Send>>;

/// The contract a connector implements. Connector business logic itself is
/// out of scope here — this crate only defines the shape the pipeline
/// drives it through.
#[async_trait]
pub trait Source: Send + Sync {
    /// Checks the supplied credentials actually work against the provider,
    /// without doing a full sync. Called on source-connection create and
    /// re-run on manual trigger when credentials changed.
    async fn validate(&self) -> Result<(), SourceValidationError>;

    /// Streams entities (or deletion tombstones) for one sync run,
    /// resuming from `cursor` when present.
    fn generate_entities(&self, cursor: Option<Value>) -> EntityStream;

    /// The cursor blob the connector accumulated while the last
    /// `generate_entities` stream ran, if it advanced one. The caller
    /// persists this only after the whole run succeeds — a failed run
    /// must resume from the same place, not the place the batch got to.
    fn current_cursor(&self) -> Option<Value> {
        None
    }

    fn supports_incremental_acl(&self) -> bool {
        false
    }
}

/// Static descriptor of a registered connector kind — what the create-flow
/// validation needs before it ever touches connector code.
#[derive(Debug, Clone)]
pub struct SourceDescriptor {
    pub short_name: String,
    pub supported_auth_methods: Vec<AuthenticationMethod>,
    pub requires_byoc: bool,
    pub config_schema_fields: Vec<String>,
}

impl SourceDescriptor {
    pub fn supports_auth_method(&self, method: AuthenticationMethod) -> bool {
        self.supported_auth_methods.contains(&method)
    }
}

/// Declarative catalog of sources keyed by `short_name`.
#[derive(Default)]
pub struct SourceRegistry {
    entries: HashMap<String, SourceDescriptor>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, descriptor: SourceDescriptor) -> Self {
        self.entries.insert(descriptor.short_name.clone(), descriptor);
        self
    }

    pub fn lookup(&self, short_name: &str) -> Option<&SourceDescriptor> {
        self.entries.get(short_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lookup_roundtrip() {
        let registry = SourceRegistry::new().register(SourceDescriptor {
            short_name: "slack".into(),
            supported_auth_methods: vec![AuthenticationMethod::OauthBrowser, AuthenticationMethod::OauthByoc],
            requires_byoc: false,
            config_schema_fields: vec!["workspace".into()],
        });

        let descriptor = registry.lookup("slack").unwrap();
        assert!(descriptor.supports_auth_method(AuthenticationMethod::OauthBrowser));
        assert!(!descriptor.supports_auth_method(AuthenticationMethod::Direct));
        assert!(registry.lookup("unknown").is_none());
    }
}
