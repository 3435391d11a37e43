//! At-rest encryption for `IntegrationCredential` secret bundles.
//!
//! Pulls the master key from the environment via the same
//! placeholder-resolution idiom as the rest of the config layer, then
//! encrypts with an AEAD cipher rather than a hand-rolled scheme.

use crate::error::CredentialError;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, AeadCore, Key, Nonce};
use base64::Engine;

const NONCE_LEN: usize = 12;

/// An opaque, base64-encoded ciphertext blob. The stable handle exposed to
/// the rest of the system is the `IntegrationCredential` row id, never this
/// blob directly.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EncryptedBlob(pub String);

/// Symmetric credential encryptor backed by a 256-bit key.
#[derive(Clone)]
pub struct CredentialCipher {
    key: Key<Aes256Gcm>,
}

impl CredentialCipher {
    /// Build a cipher from a raw 32-byte key.
    pub fn from_key_bytes(key_bytes: &[u8; 32]) -> Self {
        Self {
            key: *Key::<Aes256Gcm>::from_slice(key_bytes),
        }
    }

    /// Derive a cipher from the `AIRWEAVE_CREDENTIALS_KEY` environment
    /// variable (expected to be 32 raw bytes, base64-encoded).
    pub fn from_env() -> Result<Self, CredentialError> {
        let raw = std::env::var("AIRWEAVE_CREDENTIALS_KEY")
            .map_err(|_| CredentialError::EncryptionFailed)?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(raw)
            .map_err(|_| CredentialError::EncryptionFailed)?;
        let key_bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CredentialError::EncryptionFailed)?;
        Ok(Self::from_key_bytes(&key_bytes))
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<EncryptedBlob, CredentialError> {
        let cipher = Aes256Gcm::new(&self.key);
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CredentialError::EncryptionFailed)?;

        let mut payload = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        payload.extend_from_slice(nonce.as_slice());
        payload.extend_from_slice(&ciphertext);
        Ok(EncryptedBlob(
            base64::engine::general_purpose::STANDARD.encode(payload),
        ))
    }

    pub fn decrypt(&self, blob: &EncryptedBlob) -> Result<String, CredentialError> {
        let payload = base64::engine::general_purpose::STANDARD
            .decode(&blob.0)
            .map_err(|_| CredentialError::DecryptionFailed)?;
        if payload.len() < NONCE_LEN {
            return Err(CredentialError::DecryptionFailed);
        }
        let (nonce_bytes, ciphertext) = payload.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);
        let cipher = Aes256Gcm::new(&self.key);
        let plaintext = cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| CredentialError::DecryptionFailed)?;
        String::from_utf8(plaintext).map_err(|_| CredentialError::DecryptionFailed)
    }
}
