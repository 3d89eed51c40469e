//! Test-only mock completion provider.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::LlmError;
use crate::provider::{CompletionProvider, Message, ToolDefinition};

/// Snapshot of one `complete` invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub messages: Vec<Message>,
    pub system: Option<String>,
    pub tools: Vec<ToolDefinition>,
}

/// Replays scripted responses and records every call it receives.
///
/// Clones share the response queue and the call log.
#[derive(Debug, Clone)]
pub struct MockProvider {
    responses: Arc<Mutex<VecDeque<String>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    pub default_response: String,
    pub fail_chat: bool,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            default_response: "mock response".into(),
            fail_chat: false,
        }
    }
}

impl MockProvider {
    #[must_use]
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_chat: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    #[must_use]
    pub fn last_call(&self) -> Option<RecordedCall> {
        self.calls.lock().unwrap().last().cloned()
    }
}

impl CompletionProvider for MockProvider {
    fn complete(
        &self,
        messages: &[Message],
        system: Option<&str>,
        tools: &[ToolDefinition],
    ) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(RecordedCall {
            messages: messages.to_vec(),
            system: system.map(str::to_owned),
            tools: tools.to_vec(),
        });

        if self.fail_chat {
            return Err(LlmError::Other("mock LLM error".into()));
        }
        let mut responses = self.responses.lock().unwrap();
        Ok(responses
            .pop_front()
            .unwrap_or_else(|| self.default_response.clone()))
    }

    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_scripted_responses_then_default() {
        let mock = MockProvider::with_responses(vec!["one".into(), "two".into()]);
        let msgs = [Message::user("q")];
        assert_eq!(mock.complete(&msgs, None, &[]).unwrap(), "one");
        assert_eq!(mock.complete(&msgs, None, &[]).unwrap(), "two");
        assert_eq!(mock.complete(&msgs, None, &[]).unwrap(), "mock response");
    }

    #[test]
    fn records_calls_across_clones() {
        let mock = MockProvider::default();
        let clone = mock.clone();
        clone
            .complete(&[Message::user("q")], Some("sys"), &[])
            .unwrap();
        assert_eq!(mock.call_count(), 1);
        let call = mock.last_call().unwrap();
        assert_eq!(call.system.as_deref(), Some("sys"));
        assert_eq!(call.messages, vec![Message::user("q")]);
    }

    #[test]
    fn failing_still_records_call() {
        let mock = MockProvider::failing();
        assert!(mock.complete(&[Message::user("q")], None, &[]).is_err());
        assert_eq!(mock.call_count(), 1);
    }
}
