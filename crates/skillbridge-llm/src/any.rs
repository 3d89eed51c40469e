use crate::claude::ClaudeProvider;
use crate::error::LlmError;
use crate::gemini::GeminiProvider;
#[cfg(feature = "mock")]
use crate::mock::MockProvider;
use crate::ollama::OllamaProvider;
use crate::openai::OpenAiProvider;
use crate::provider::{CompletionProvider, Message, ToolDefinition};

/// Generates a match over all `AnyProvider` variants, binding the inner provider
/// and evaluating the given expression for each arm.
macro_rules! delegate_provider {
    ($self:expr, |$p:ident| $expr:expr) => {
        match $self {
            AnyProvider::Ollama($p) => $expr,
            AnyProvider::Claude($p) => $expr,
            AnyProvider::OpenAi($p) => $expr,
            AnyProvider::Gemini($p) => $expr,
            #[cfg(feature = "mock")]
            AnyProvider::Mock($p) => $expr,
        }
    };
}

/// Config-selected provider with static dispatch.
#[derive(Debug, Clone)]
pub enum AnyProvider {
    Ollama(OllamaProvider),
    Claude(ClaudeProvider),
    OpenAi(OpenAiProvider),
    Gemini(GeminiProvider),
    #[cfg(feature = "mock")]
    Mock(MockProvider),
}

impl CompletionProvider for AnyProvider {
    fn complete(
        &self,
        messages: &[Message],
        system: Option<&str>,
        tools: &[ToolDefinition],
    ) -> Result<String, LlmError> {
        delegate_provider!(self, |p| p.complete(messages, system, tools))
    }

    fn name(&self) -> &str {
        delegate_provider!(self, |p| p.name())
    }

    fn model(&self) -> &str {
        delegate_provider!(self, |p| p.model())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delegates_name_and_model() {
        let p = AnyProvider::Ollama(OllamaProvider::new(
            "http://localhost:11434",
            "llama3.2".into(),
        ));
        assert_eq!(p.name(), "ollama");
        assert_eq!(p.model(), "llama3.2");

        let p = AnyProvider::Claude(ClaudeProvider::new("k".into(), "claude-x".into(), 8));
        assert_eq!(p.name(), "claude");
        assert_eq!(p.model(), "claude-x");

        let p = AnyProvider::OpenAi(OpenAiProvider::new(
            "k".into(),
            "https://api.openai.com/v1".into(),
            "gpt-4o".into(),
            8,
        ));
        assert_eq!(p.name(), "openai");

        let p = AnyProvider::Gemini(GeminiProvider::new(
            "k".into(),
            crate::gemini::DEFAULT_BASE_URL.into(),
            "gemini-2.0-flash".into(),
            8,
        ));
        assert_eq!(p.name(), "gemini");
        assert_eq!(p.model(), "gemini-2.0-flash");
    }

    #[test]
    fn debug_does_not_leak_keys() {
        let p = AnyProvider::Claude(ClaudeProvider::new("sk-hidden".into(), "m".into(), 8));
        assert!(!format!("{p:?}").contains("sk-hidden"));
    }

    #[cfg(feature = "mock")]
    #[test]
    fn delegates_complete_to_mock() {
        let mock = MockProvider::with_responses(vec!["scripted".into()]);
        let p = AnyProvider::Mock(mock.clone());
        let out = p.complete(&[Message::user("q")], None, &[]).unwrap();
        assert_eq!(out, "scripted");
        assert_eq!(mock.call_count(), 1);
    }
}
