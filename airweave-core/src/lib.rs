//! `airweave-core` — the ambient stack shared by every Airweave subsystem
//! crate: the closed error taxonomy, typed configuration (env vars,
//! connector config schemas), structured logging, and the identifier
//! newtypes used throughout the data model.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use error::{AppError, ErrorKind};

/// Convenience imports for downstream crates.
pub mod prelude {
    pub use crate::config::{ConfigError, ConfigSection, ConfigValue};
    pub use crate::error::{AppError, ErrorKind};
    pub use crate::types::*;
}
