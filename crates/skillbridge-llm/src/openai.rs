use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::http::{DEFAULT_TIMEOUT_SECS, default_client, read_body, trim_base_url};
use crate::provider::{
    CompletionProvider, FunctionTool, Message, ToolDefinition, WireMessage, function_tools,
    wire_messages,
};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Clone)]
pub struct OpenAiProvider {
    client: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: Option<f32>,
}

impl fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("client", &"<reqwest::blocking::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl OpenAiProvider {
    #[must_use]
    pub fn new(api_key: String, base_url: String, model: String, max_tokens: u32) -> Self {
        Self {
            client: default_client(DEFAULT_TIMEOUT_SECS),
            api_key,
            base_url: trim_base_url(base_url),
            model,
            max_tokens,
            temperature: None,
        }
    }

    #[must_use]
    pub fn with_client(mut self, client: reqwest::blocking::Client) -> Self {
        self.client = client;
        self
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<FunctionTool<'a>>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<serde_json::Value>,
}

fn parse_response(text: &str) -> Result<String, LlmError> {
    let resp: ChatResponse = serde_json::from_str(text)?;
    let choice = resp
        .choices
        .into_iter()
        .next()
        .ok_or(LlmError::EmptyResponse { provider: "openai" })?;

    match choice.message.content {
        Some(content) => Ok(content),
        None if !choice.message.tool_calls.is_empty() => {
            tracing::debug!(
                tool_calls = choice.message.tool_calls.len(),
                "OpenAI response carried only tool calls"
            );
            Ok(String::new())
        }
        None => Err(LlmError::EmptyResponse { provider: "openai" }),
    }
}

impl CompletionProvider for OpenAiProvider {
    fn complete(
        &self,
        messages: &[Message],
        system: Option<&str>,
        tools: &[ToolDefinition],
    ) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages: wire_messages(messages, system),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            tools: function_tools(tools),
        };

        tracing::debug!(
            model = %self.model,
            messages = body.messages.len(),
            tools = body.tools.len(),
            "sending OpenAI chat request"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()?;
        let text = read_body("openai", response)?;
        parse_response(&text)
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
