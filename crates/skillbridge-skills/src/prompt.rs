use std::fmt::Write;

use skillbridge_llm::{Message, ToolDefinition};

use crate::loader::Skill;

pub const TOOL_NAME_PREFIX: &str = "activate_skill_";

const TOOL_MODE_INSTRUCTION: &str = "\
You have access to specialized skills that can help with specific tasks.
When a skill is relevant to the user's request, activate it using the corresponding function.
If no skill is needed, respond directly.";

/// Turns a resolved skill (or the candidate catalog) into the provider-facing prompt.
pub trait PromptAssembler: Send + Sync {
    /// System prompt for one invocation. `None` means the request carries no system prompt.
    fn build_system_prompt(
        &self,
        selected: Option<&Skill>,
        candidates: &[Skill],
        include_references: bool,
    ) -> Option<String>;

    /// Tools offered alongside the prompt. None by default.
    fn tool_definitions(&self, _skills: &[Skill]) -> Vec<ToolDefinition> {
        Vec::new()
    }

    /// Conversation to send: a copy of `history` followed by the user's input.
    fn build_messages(&self, user_input: &str, history: &[Message]) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.extend_from_slice(history);
        messages.push(Message::user(user_input));
        messages
    }
}

/// Injects the selected skill's instructions, or a catalog when nothing was selected.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPromptAssembler;

impl SystemPromptAssembler {
    #[must_use]
    pub fn skill_prompt(skill: &Skill, include_references: bool) -> String {
        let mut out = format!("# Active Skill: {}\n\n{}", skill.name(), skill.instructions());

        if include_references && !skill.references().is_empty() {
            out.push_str("\n\n# Reference Documents\n");
            for reference in skill.references().values() {
                let _ = write!(out, "\n## {}\n{}\n", reference.name, reference.content);
            }
        }
        out
    }

    /// `None` when there is nothing to list.
    #[must_use]
    pub fn catalog_prompt(candidates: &[Skill]) -> Option<String> {
        if candidates.is_empty() {
            return None;
        }

        let mut out = String::from(
            "# Available Skills\n\nThe following skills are available. Use them when relevant:\n\n",
        );
        for skill in candidates {
            let _ = writeln!(out, "- **{}**: {}", skill.name(), skill.description());
        }
        out.push_str("\nTo use a skill, identify which one is most relevant to the task.");
        Some(out)
    }
}

impl PromptAssembler for SystemPromptAssembler {
    fn build_system_prompt(
        &self,
        selected: Option<&Skill>,
        candidates: &[Skill],
        include_references: bool,
    ) -> Option<String> {
        match selected {
            Some(skill) => Some(Self::skill_prompt(skill, include_references)),
            None => Self::catalog_prompt(candidates),
        }
    }
}

/// Exposes skills as callable tools and leaves activation to the provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToolPromptAssembler;

impl PromptAssembler for ToolPromptAssembler {
    fn build_system_prompt(
        &self,
        _selected: Option<&Skill>,
        _candidates: &[Skill],
        _include_references: bool,
    ) -> Option<String> {
        Some(TOOL_MODE_INSTRUCTION.to_owned())
    }

    /// One parameterless tool per skill, in candidate order.
    fn tool_definitions(&self, skills: &[Skill]) -> Vec<ToolDefinition> {
        skills
            .iter()
            .map(|s| ToolDefinition::without_parameters(tool_name_for(s.name()), s.description()))
            .collect()
    }
}

/// `pdf-expert` -> `activate_skill_pdf_expert`.
#[must_use]
pub fn tool_name_for(skill_name: &str) -> String {
    format!("{TOOL_NAME_PREFIX}{}", skill_name.replace('-', "_"))
}
