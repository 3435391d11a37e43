//! Structured logging setup.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize a process-wide `tracing` subscriber with an `EnvFilter`
/// (`RUST_LOG`, defaulting to `info`). Safe to call more than once; later
/// calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// Redact a bearer-style secret for logging: keep a short prefix, mask the
/// rest. Used whenever a token, refresh token, or credential bundle would
/// otherwise land in a log line or `SyncJob.error`.
pub fn redact(secret: &str) -> String {
    if secret.len() <= 4 {
        return "****".to_string();
    }
    format!("{}***", &secret[..4])
}
