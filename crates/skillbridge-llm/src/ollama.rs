use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::http::{DEFAULT_TIMEOUT_SECS, default_client, read_body, trim_base_url};
use crate::provider::{
    CompletionProvider, FunctionTool, Message, ToolDefinition, WireMessage, function_tools,
    wire_messages,
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    model: String,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

impl OllamaProvider {
    #[must_use]
    pub fn new(base_url: &str, model: String) -> Self {
        Self {
            client: default_client(DEFAULT_TIMEOUT_SECS),
            base_url: trim_base_url(base_url.to_owned()),
            model,
            max_tokens: None,
            temperature: None,
        }
    }

    #[must_use]
    pub fn with_client(mut self, client: reqwest::blocking::Client) -> Self {
        self.client = client;
        self
    }

    /// Sent as `options.num_predict`.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
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
    stream: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<FunctionTool<'a>>,
    #[serde(skip_serializing_if = "Options::is_empty")]
    options: Options,
}

#[derive(Default, Serialize)]
struct Options {
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

impl Options {
    fn is_empty(&self) -> bool {
        self.num_predict.is_none() && self.temperature.is_none()
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

fn parse_response(text: &str) -> Result<String, LlmError> {
    let resp: ChatResponse = serde_json::from_str(text)?;
    resp.message
        .map(|m| m.content)
        .ok_or(LlmError::EmptyResponse { provider: "ollama" })
}

impl CompletionProvider for OllamaProvider {
    fn complete(
        &self,
        messages: &[Message],
        system: Option<&str>,
        tools: &[ToolDefinition],
    ) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages: wire_messages(messages, system),
            stream: false,
            tools: function_tools(tools),
            options: Options {
                num_predict: self.max_tokens,
                temperature: self.temperature,
            },
        };

        tracing::debug!(
            model = %self.model,
            messages = body.messages.len(),
            tools = body.tools.len(),
            "sending Ollama chat request"
        );

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()?;
        let text = read_body("ollama", response)?;
        parse_response(&text)
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
