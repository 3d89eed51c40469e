use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single conversation turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Declarative capability offered to the provider as an invocable function.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema describing the accepted arguments.
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Tool that accepts no arguments.
    #[must_use]
    pub fn without_parameters(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {},
                "required": [],
            }),
        }
    }
}

pub trait CompletionProvider: Send + Sync {
    /// Send the conversation to the provider and return the generated text.
    ///
    /// `system` is sent as the provider's system instruction when present. `tools` are
    /// forwarded as function definitions; any invocation the model requests is not
    /// interpreted here.
    ///
    /// # Errors
    ///
    /// Returns an error on transport, authentication, rate-limit, or response decoding failure.
    fn complete(
        &self,
        messages: &[Message],
        system: Option<&str>,
        tools: &[ToolDefinition],
    ) -> Result<String, LlmError>;

    fn name(&self) -> &str;

    fn model(&self) -> &str;
}

/// Borrowed `{role, content}` pair in the shape shared by OpenAI-style chat APIs.
#[derive(Debug, Serialize)]
pub(crate) struct WireMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

/// Flatten an optional system instruction and the conversation into wire messages,
/// with the system instruction first.
pub(crate) fn wire_messages<'a>(
    messages: &'a [Message],
    system: Option<&'a str>,
) -> Vec<WireMessage<'a>> {
    let mut out = Vec::with_capacity(messages.len() + 1);
    if let Some(system) = system {
        out.push(WireMessage {
            role: Role::System.as_str(),
            content: system,
        });
    }
    out.extend(messages.iter().map(|m| WireMessage {
        role: m.role.as_str(),
        content: &m.content,
    }));
    out
}

/// `{"type": "function", "function": {...}}` tool envelope used by OpenAI and Ollama.
#[derive(Debug, Serialize)]
pub(crate) struct FunctionTool<'a> {
    pub r#type: &'static str,
    pub function: FunctionSpec<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct FunctionSpec<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub parameters: &'a serde_json::Value,
}

pub(crate) fn function_tools(tools: &[ToolDefinition]) -> Vec<FunctionTool<'_>> {
    tools
        .iter()
        .map(|t| FunctionTool {
            r#type: "function",
            function: FunctionSpec {
                name: &t.name,
                description: &t.description,
                parameters: &t.parameters,
            },
        })
        .collect()
}
