//! Application bootstrap: config resolution, provider and runtime construction.

use std::path::{Path, PathBuf};

use anyhow::Context;
use skillbridge_llm::any::AnyProvider;
use skillbridge_llm::claude::ClaudeProvider;
use skillbridge_llm::gemini::{self, GeminiProvider};
use skillbridge_llm::http::default_client;
use skillbridge_llm::ollama::{self, OllamaProvider};
use skillbridge_llm::openai::{self, OpenAiProvider};
use skillbridge_skills::matcher::{KeywordMatcher, NullMatcher, SemanticMatcher};

use crate::config::{
    CLAUDE_API_KEY, Config, GOOGLE_API_KEY, MatcherKind, OPENAI_API_KEY, ProviderKind,
};
use crate::runtime::SkillRuntime;
use crate::vault::{EnvVaultProvider, VaultProvider};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Priority: `--config` flag > `SKILLBRIDGE_CONFIG` env > `config/default.toml`.
#[must_use]
pub fn resolve_config_path(cli: Option<&Path>) -> PathBuf {
    if let Some(path) = cli {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("SKILLBRIDGE_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from(DEFAULT_CONFIG_PATH)
}

/// Load, validate, and resolve secrets from the environment.
///
/// # Errors
///
/// Returns an error if the config file is unreadable or invalid.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    load_config_with_vault(path, &EnvVaultProvider)
}

/// # Errors
///
/// Returns an error if the config file is unreadable or invalid, or the vault fails.
pub fn load_config_with_vault(path: &Path, vault: &dyn VaultProvider) -> anyhow::Result<Config> {
    let mut config = Config::load(path)?;
    config.validate()?;
    config.resolve_secrets(vault)?;
    Ok(config)
}

/// # Errors
///
/// Returns an error if the selected provider needs an API key that was not resolved.
pub fn create_provider(config: &Config) -> anyhow::Result<AnyProvider> {
    let llm = &config.llm;
    let client = default_client(llm.timeout_secs);

    match llm.provider {
        ProviderKind::Ollama => {
            let base_url = llm.base_url.as_deref().unwrap_or(ollama::DEFAULT_BASE_URL);
            Ok(AnyProvider::Ollama(
                OllamaProvider::new(base_url, llm.model.clone())
                    .with_client(client)
                    .with_max_tokens(llm.max_tokens)
                    .with_temperature(llm.temperature),
            ))
        }
        ProviderKind::Claude => {
            let api_key = config
                .secrets
                .claude_api_key
                .as_ref()
                .with_context(|| format!("{CLAUDE_API_KEY} not found in vault"))?
                .expose()
                .to_owned();
            let mut provider = ClaudeProvider::new(api_key, llm.model.clone(), llm.max_tokens)
                .with_client(client)
                .with_temperature(llm.temperature);
            if let Some(base_url) = &llm.base_url {
                let api_url = format!("{}/v1/messages", base_url.trim_end_matches('/'));
                provider = provider.with_api_url(api_url);
            }
            Ok(AnyProvider::Claude(provider))
        }
        ProviderKind::OpenAi => {
            let api_key = config
                .secrets
                .openai_api_key
                .as_ref()
                .with_context(|| format!("{OPENAI_API_KEY} not found in vault"))?
                .expose()
                .to_owned();
            let base_url = llm
                .base_url
                .clone()
                .unwrap_or_else(|| openai::DEFAULT_BASE_URL.to_owned());
            Ok(AnyProvider::OpenAi(
                OpenAiProvider::new(api_key, base_url, llm.model.clone(), llm.max_tokens)
                    .with_client(client)
                    .with_temperature(llm.temperature),
            ))
        }
        ProviderKind::Gemini => {
            let api_key = config
                .secrets
                .google_api_key
                .as_ref()
                .with_context(|| format!("{GOOGLE_API_KEY} not found in vault"))?
                .expose()
                .to_owned();
            let base_url = llm
                .base_url
                .clone()
                .unwrap_or_else(|| gemini::DEFAULT_BASE_URL.to_owned());
            Ok(AnyProvider::Gemini(
                GeminiProvider::new(api_key, base_url, llm.model.clone(), llm.max_tokens)
                    .with_client(client)
                    .with_temperature(llm.temperature),
            ))
        }
    }
}

/// Runtime wired with the configured matcher. No skills are loaded yet.
#[must_use]
pub fn build_runtime(config: &Config) -> SkillRuntime {
    let builder = SkillRuntime::builder();
    let builder = match config.skills.matcher {
        MatcherKind::Semantic => builder.with_matcher(SemanticMatcher),
        MatcherKind::Keyword => {
            let mut matcher = KeywordMatcher::new();
            for (name, words) in &config.skills.keywords {
                matcher.add_keywords(name, words.iter().cloned());
            }
            builder.with_matcher(matcher)
        }
        MatcherKind::None => builder.with_matcher(NullMatcher),
    };
    builder.build()
}

/// [`build_runtime`] plus every skill found under `skills.paths`.
#[must_use]
pub fn build_loaded_runtime(config: &Config) -> SkillRuntime {
    let mut runtime = build_runtime(config);
    let count = runtime.load_default_skills(&config.skills.paths);
    tracing::debug!(
        matcher = config.skills.matcher.as_str(),
        skills = count,
        "skill runtime ready"
    );
    runtime
}
