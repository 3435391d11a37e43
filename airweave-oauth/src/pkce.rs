//! CSRF state and PKCE code verifier/challenge generation.

use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

const STATE_BYTES: usize = 24;

fn random_urlsafe(n_bytes: usize) -> String {
    let mut buf = vec![0u8; n_bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf)
}

/// A CSRF-resistant opaque state token, at least 24 random bytes.
pub fn generate_state() -> String {
    random_urlsafe(STATE_BYTES)
}

/// An 8-character redirect-proxy code (6 random bytes, base64 url-safe
/// encodes to exactly 8 characters with no padding). Collision risk is
/// handled by the caller retrying on insert if the code is already taken.
pub fn generate_redirect_code() -> String {
    random_urlsafe(6)
}

pub struct Pkce {
    pub verifier: String,
    pub challenge: String,
}

/// Generates an S256 PKCE verifier/challenge pair.
pub fn generate_pkce() -> Pkce {
    let verifier = random_urlsafe(32);
    let digest = Sha256::digest(verifier.as_bytes());
    let challenge = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest);
    Pkce { verifier, challenge }
}
