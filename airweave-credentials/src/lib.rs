pub mod cursor;
pub mod encryption;
pub mod error;
pub mod store;

pub use cursor::{CursorStore, SyncCursor};
pub use encryption::{CredentialCipher, EncryptedBlob};
pub use error::CredentialError;
pub use store::{AuthenticationMethod, CredentialStore, IntegrationCredential};

pub mod prelude {
    pub use crate::cursor::{CursorStore, SyncCursor};
    pub use crate::encryption::{CredentialCipher, EncryptedBlob};
    pub use crate::error::CredentialError;
    pub use crate::store::{AuthenticationMethod, CredentialStore, IntegrationCredential};
}
