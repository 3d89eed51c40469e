use std::fmt;

use serde::Deserialize;

/// Wrapper for sensitive strings with redacted Debug/Display.
#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Source of API keys and other secrets.
pub trait VaultProvider: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the backend cannot be queried. A missing key is `Ok(None)`.
    fn get_secret(&self, key: &str) -> anyhow::Result<Option<String>>;
}

/// Reads secrets from environment variables. Empty values count as missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvVaultProvider;

impl VaultProvider for EnvVaultProvider {
    fn get_secret(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(std::env::var(key).ok().filter(|v| !v.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    struct MapVault(HashMap<&'static str, &'static str>);

    impl VaultProvider for MapVault {
        fn get_secret(&self, key: &str) -> anyhow::Result<Option<String>> {
            Ok(self.0.get(key).map(|v| (*v).to_owned()))
        }
    }

    #[test]
    fn secret_expose_returns_inner() {
        let secret = Secret::new("sk-test-123");
        assert_eq!(secret.expose(), "sk-test-123");
    }

    #[test]
    fn secret_debug_and_display_are_redacted() {
        let secret = Secret::new("sk-test-123");
        assert_eq!(format!("{secret:?}"), "[REDACTED]");
        assert_eq!(format!("{secret}"), "[REDACTED]");
    }

    #[test]
    fn secret_deserializes_transparently() {
        let secret: Secret = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(secret.expose(), "abc");
    }

    #[test]
    fn custom_vault_via_trait_object() {
        let vault: Box<dyn VaultProvider> = Box::new(MapVault(HashMap::from([("K", "v")])));
        assert_eq!(vault.get_secret("K").unwrap().as_deref(), Some("v"));
        assert!(vault.get_secret("missing").unwrap().is_none());
    }

    #[test]
    fn env_vault_missing_key() {
        let value = EnvVaultProvider
            .get_secret("SKILLBRIDGE_TEST_KEY_THAT_IS_NEVER_SET")
            .unwrap();
        assert!(value.is_none());
    }
}
