//! Secret resolution for `${...}` placeholders in config values.

use super::ConfigError;

/// Pluggable secret resolution backend.
pub trait SecretResolver: Send + Sync {
    fn resolve(&self, reference: &str) -> Result<String, ConfigError>;
}

/// Default resolver: env vars and file references.
///
/// - `${VAR_NAME}` / `${env:VAR_NAME}` — resolves from an environment variable.
/// - `${file:/path/to/secret}` — reads from a file (trimmed).
pub struct DefaultSecretResolver;

impl SecretResolver for DefaultSecretResolver {
    fn resolve(&self, reference: &str) -> Result<String, ConfigError> {
        if let Some(path) = reference.strip_prefix("file:") {
            std::fs::read_to_string(path.trim())
                .map(|s| s.trim().to_string())
                .map_err(|e| ConfigError::Load(format!("secret file '{}': {e}", path.trim())))
        } else if let Some(var) = reference.strip_prefix("env:") {
            std::env::var(var.trim())
                .map_err(|_| ConfigError::NotFound(format!("env:{}", var.trim())))
        } else {
            std::env::var(reference.trim())
                .map_err(|_| ConfigError::NotFound(reference.trim().to_string()))
        }
    }
}

/// Resolve every `${...}` placeholder in `value`.
pub fn resolve_placeholders(value: &str, resolver: &dyn SecretResolver) -> Result<String, ConfigError> {
    let mut result = value.to_string();
    while let Some(start) = result.find("${") {
        let end = result[start..]
            .find('}')
            .ok_or_else(|| ConfigError::Load(format!("unclosed placeholder in: {value}")))?;
        let reference = &result[start + 2..start + end];
        let resolved = resolver.resolve(reference)?;
        result = format!("{}{}{}", &result[..start], resolved, &result[start + end + 1..]);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn resolves_env_placeholder() {
        unsafe { std::env::set_var("AIRWEAVE_TEST_SECRET", "shh") };
        let resolved = resolve_placeholders("token=${AIRWEAVE_TEST_SECRET}", &DefaultSecretResolver).unwrap();
        assert_eq!(resolved, "token=shh");
        unsafe { std::env::remove_var("AIRWEAVE_TEST_SECRET") };
    }

    #[test]
    fn missing_var_errors() {
        let err = resolve_placeholders("${AIRWEAVE_DOES_NOT_EXIST}", &DefaultSecretResolver);
        assert!(err.is_err());
    }

    #[test]
    fn unclosed_placeholder_errors() {
        let err = resolve_placeholders("${unterminated", &DefaultSecretResolver);
        assert!(matches!(err, Err(ConfigError::Load(_))));
    }
}
