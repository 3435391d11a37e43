//! The credential store: encrypted `IntegrationCredential` rows behind a
//! stable opaque handle.

use crate::encryption::{CredentialCipher, EncryptedBlob};
use crate::error::CredentialError;
use airweave_data::{InMemoryRepository, Repository};
use airweave_core::types::ConnectionId;
use serde::{Deserialize, Serialize};

/// How the bundle behind an `IntegrationCredential` was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthenticationMethod {
    OauthToken,
    OauthBrowser,
    OauthByoc,
    Direct,
    AuthProvider,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationCredential {
    pub id: ConnectionId,
    pub authentication_method: AuthenticationMethod,
    /// Name of the connector's config class this bundle validates against.
    pub config_class: String,
    pub encrypted: EncryptedBlob,
}

/// Encrypts/decrypts secret bundles and persists the resulting opaque rows.
/// The cipher never leaves this struct — callers only ever see plaintext
/// going in (`store`) or coming out (`reveal`), never the blob.
#[derive(Clone)]
pub struct CredentialStore {
    cipher: CredentialCipher,
    repo: InMemoryRepository<IntegrationCredential, ConnectionId>,
}

impl CredentialStore {
    pub fn new(cipher: CredentialCipher) -> Self {
        Self {
            cipher,
            repo: InMemoryRepository::new(|c| c.id),
        }
    }

    pub async fn store(
        &self,
        authentication_method: AuthenticationMethod,
        config_class: impl Into<String>,
        plaintext: &str,
    ) -> Result<ConnectionId, CredentialError> {
        let encrypted = self.cipher.encrypt(plaintext)?;
        let id = ConnectionId::new();
        let row = IntegrationCredential {
            id,
            authentication_method,
            config_class: config_class.into(),
            encrypted,
        };
        self.repo
            .save(row)
            .await
            .map_err(|_| CredentialError::EncryptionFailed)?;
        Ok(id)
    }

    pub async fn reveal(&self, id: &ConnectionId) -> Result<String, CredentialError> {
        let row = self
            .repo
            .find_by_id(id)
            .await
            .map_err(|_| CredentialError::NotFound(id.to_string()))?
            .ok_or_else(|| CredentialError::NotFound(id.to_string()))?;
        self.cipher.decrypt(&row.encrypted)
    }

    pub async fn metadata(&self, id: &ConnectionId) -> Option<IntegrationCredential> {
        self.repo.find_by_id(id).await.ok().flatten()
    }
}
