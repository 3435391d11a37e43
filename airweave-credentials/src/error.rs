#[derive(Debug)]
pub enum CredentialError {
    EncryptionFailed,
    DecryptionFailed,
    NotFound(String),
}

impl std::fmt::Display for CredentialError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialError::EncryptionFailed => write!(f, "encryption failed"),
            CredentialError::DecryptionFailed => {
                write!(f, "decryption failed: credential is corrupt or the master key changed")
            }
            CredentialError::NotFound(msg) => write!(f, "credential not found: {msg}"),
        }
    }
}

impl std::error::Error for CredentialError {}
