mod env;
mod types;


pub use types::*;

use std::path::Path;

use anyhow::{Context, bail};

use crate::vault::{Secret, VaultProvider};

pub const CLAUDE_API_KEY: &str = "SKILLBRIDGE_CLAUDE_API_KEY";
pub const OPENAI_API_KEY: &str = "SKILLBRIDGE_OPENAI_API_KEY";
pub const GOOGLE_API_KEY: &str = "SKILLBRIDGE_GOOGLE_API_KEY";

const MAX_TEMPERATURE: f32 = 2.0;

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            tracing::debug!("config file {} not found, using defaults", path.display());
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.llm.model.trim().is_empty() {
            bail!("llm.model must not be empty");
        }
        if self.llm.max_tokens == 0 {
            bail!("llm.max_tokens must be greater than zero");
        }
        if let Some(t) = self.llm.temperature
            && !(0.0..=MAX_TEMPERATURE).contains(&t)
        {
            bail!("llm.temperature must be between 0 and {MAX_TEMPERATURE}, got {t}");
        }
        if self.llm.timeout_secs == 0 {
            bail!("llm.timeout_secs must be greater than zero");
        }
        for (name, words) in &self.skills.keywords {
            if words.iter().any(|w| w.trim().is_empty()) {
                bail!("skills.keywords.{name} contains an empty keyword");
            }
        }
        Ok(())
    }

    /// Resolve provider API keys through the vault.
    ///
    /// # Errors
    ///
    /// Returns an error if the vault backend fails.
    pub fn resolve_secrets(&mut self, vault: &dyn VaultProvider) -> anyhow::Result<()> {
        if let Some(val) = vault.get_secret(CLAUDE_API_KEY)? {
            self.secrets.claude_api_key = Some(Secret::new(val));
        }
        if let Some(val) = vault.get_secret(OPENAI_API_KEY)? {
            self.secrets.openai_api_key = Some(Secret::new(val));
        }
        if let Some(val) = vault.get_secret(GOOGLE_API_KEY)? {
            self.secrets.google_api_key = Some(Secret::new(val));
        }
        Ok(())
    }
}
