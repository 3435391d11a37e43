//! `airweave-cache` — the context cache and JWT blacklist consumed by the
//! context resolver.

pub mod context;
pub mod ttl;

pub use context::{
    BlacklistBackend, BlacklistReason, BlacklistUnavailable, ContextCache, InMemoryBlacklist,
    is_token_blacklisted, DEFAULT_CONTEXT_TTL,
};
pub use ttl::TtlCache;
