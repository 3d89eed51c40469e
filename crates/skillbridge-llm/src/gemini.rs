use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::http::{DEFAULT_TIMEOUT_SECS, default_client, read_body, trim_base_url};
use crate::provider::{CompletionProvider, Message, Role, ToolDefinition};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Clone)]
pub struct GeminiProvider {
    client: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: Option<f32>,
}

impl fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("client", &"<reqwest::blocking::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl GeminiProvider {
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

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolGroup<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [TextPart<'a>; 1],
}

#[derive(Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct SystemInstruction {
    parts: [OwnedTextPart; 1],
}

#[derive(Serialize)]
struct OwnedTextPart {
    text: String,
}

#[derive(Serialize)]
struct ToolGroup<'a> {
    function_declarations: Vec<FunctionDeclaration<'a>>,
}

#[derive(Serialize)]
struct FunctionDeclaration<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a serde_json::Value,
}

#[derive(Serialize)]
struct GenerationConfig {
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Gemini names the assistant role `model` and has no system turns; system-role messages
/// join the system instruction.
fn split_contents<'a>(
    messages: &'a [Message],
    system: Option<&'a str>,
) -> (Option<SystemInstruction>, Vec<Content<'a>>) {
    let mut system_parts: Vec<&str> = system.into_iter().collect();
    let mut contents = Vec::with_capacity(messages.len());

    for msg in messages {
        let role = match msg.role {
            Role::System => {
                system_parts.push(&msg.content);
                continue;
            }
            Role::User => "user",
            Role::Assistant => "model",
        };
        contents.push(Content {
            role,
            parts: [TextPart { text: &msg.content }],
        });
    }

    let system = (!system_parts.is_empty()).then(|| SystemInstruction {
        parts: [OwnedTextPart {
            text: system_parts.join("\n\n"),
        }],
    });
    (system, contents)
}

fn tool_groups(tools: &[ToolDefinition]) -> Vec<ToolGroup<'_>> {
    if tools.is_empty() {
        return Vec::new();
    }
    vec![ToolGroup {
        function_declarations: tools
            .iter()
            .map(|t| FunctionDeclaration {
                name: &t.name,
                description: &t.description,
                parameters: &t.parameters,
            })
            .collect(),
    }]
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    text: Option<String>,
    function_call: Option<FunctionCall>,
}

#[derive(Deserialize)]
struct FunctionCall {
    name: String,
}

fn parse_response(text: &str) -> Result<String, LlmError> {
    let resp: GenerateResponse = serde_json::from_str(text)?;
    let parts = resp
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts)
        .ok_or(LlmError::EmptyResponse { provider: "gemini" })?;

    let mut out = String::new();
    for part in parts {
        if let Some(text) = part.text {
            out.push_str(&text);
        }
        if let Some(call) = part.function_call {
            tracing::debug!(tool = %call.name, "Gemini requested a tool invocation");
        }
    }
    Ok(out)
}

impl CompletionProvider for GeminiProvider {
    fn complete(
        &self,
        messages: &[Message],
        system: Option<&str>,
        tools: &[ToolDefinition],
    ) -> Result<String, LlmError> {
        let (system_instruction, contents) = split_contents(messages, system);
        let body = GenerateRequest {
            contents,
            system_instruction,
            tools: tool_groups(tools),
            generation_config: GenerationConfig {
                max_output_tokens: self.max_tokens,
                temperature: self.temperature,
            },
        };

        tracing::debug!(
            model = %self.model,
            messages = body.contents.len(),
            tools = tools.len(),
            "sending Gemini generateContent request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()?;
        let text = read_body("gemini", response)?;
        parse_response(&text)
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
