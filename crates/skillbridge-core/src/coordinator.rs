//! Skill invocation: resolve a skill, assemble the prompt, dispatch to the provider.

use std::fmt;
use std::sync::Arc;

use skillbridge_llm::{CompletionProvider, Message, ToolDefinition};
use skillbridge_skills::matcher::{SemanticMatcher, SkillMatcher};
use skillbridge_skills::prompt::{PromptAssembler, SystemPromptAssembler, ToolPromptAssembler};
use skillbridge_skills::{Skill, SkillError};

/// One user request against a set of candidate skills.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    pub user_input: String,
    pub history: Vec<Message>,
    /// Let the matcher pick a skill when `skill_name` is not set.
    pub auto_match: bool,
    /// Explicit skill. Takes precedence over auto-matching.
    pub skill_name: Option<String>,
    pub include_references: bool,
}

impl InvocationRequest {
    #[must_use]
    pub fn new(user_input: impl Into<String>) -> Self {
        Self {
            user_input: user_input.into(),
            history: Vec::new(),
            auto_match: true,
            skill_name: None,
            include_references: false,
        }
    }

    #[must_use]
    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }

    #[must_use]
    pub fn with_skill(mut self, name: impl Into<String>) -> Self {
        self.skill_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_auto_match(mut self, auto_match: bool) -> Self {
        self.auto_match = auto_match;
        self
    }

    #[must_use]
    pub fn with_references(mut self, include: bool) -> Self {
        self.include_references = include;
        self
    }
}

/// Lifecycle of a single invocation. Only surfaced through debug logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationState {
    Idle,
    Resolving,
    Assembling,
    Dispatching,
    Completed,
    Failed,
}

impl fmt::Display for InvocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Resolving => "resolving",
            Self::Assembling => "assembling",
            Self::Dispatching => "dispatching",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

fn transition(from: InvocationState, to: InvocationState) -> InvocationState {
    tracing::debug!(%from, %to, "invocation state");
    to
}

/// Log the terminal state of an invocation and pass its result through.
fn finish(
    state: InvocationState,
    result: Result<String, SkillError>,
) -> Result<String, SkillError> {
    match &result {
        Ok(_) => {
            transition(state, InvocationState::Completed);
        }
        Err(e) => {
            tracing::debug!(
                from = %state,
                to = %InvocationState::Failed,
                error = %e,
                "invocation state"
            );
        }
    }
    result
}

pub trait SkillCoordinator: Send + Sync {
    /// Handle one request and return the provider's text unmodified.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::NotFound`] for an unknown explicit skill and
    /// [`SkillError::Provider`] when the provider call fails.
    fn execute(
        &self,
        request: &InvocationRequest,
        provider: &dyn CompletionProvider,
        candidates: &[Skill],
    ) -> Result<String, SkillError>;
}

/// Injects the resolved skill's instructions into the system prompt.
pub struct PromptInjectionCoordinator {
    matcher: Arc<dyn SkillMatcher>,
    assembler: Arc<dyn PromptAssembler>,
}

impl Default for PromptInjectionCoordinator {
    fn default() -> Self {
        Self::new(Arc::new(SemanticMatcher), Arc::new(SystemPromptAssembler))
    }
}

impl fmt::Debug for PromptInjectionCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromptInjectionCoordinator").finish_non_exhaustive()
    }
}

impl PromptInjectionCoordinator {
    #[must_use]
    pub fn new(matcher: Arc<dyn SkillMatcher>, assembler: Arc<dyn PromptAssembler>) -> Self {
        Self { matcher, assembler }
    }

    /// Pick the skill for `request`: explicit name first, then the matcher if allowed.
    /// An empty explicit name counts as unset.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::NotFound`] when the explicit name is not among `candidates`,
    /// or any matcher error.
    pub fn resolve<'a>(
        &self,
        request: &InvocationRequest,
        provider: &dyn CompletionProvider,
        candidates: &'a [Skill],
    ) -> Result<Option<&'a Skill>, SkillError> {
        if let Some(name) = request.skill_name.as_deref().filter(|n| !n.is_empty()) {
            return candidates
                .iter()
                .find(|s| s.name() == name)
                .map(Some)
                .ok_or_else(|| SkillError::NotFound(format!("skill '{name}' is not loaded")));
        }
        if request.auto_match {
            return self
                .matcher
                .match_skill(&request.user_input, candidates, provider);
        }
        Ok(None)
    }

    fn run(
        &self,
        state: &mut InvocationState,
        request: &InvocationRequest,
        provider: &dyn CompletionProvider,
        candidates: &[Skill],
    ) -> Result<String, SkillError> {
        *state = transition(*state, InvocationState::Resolving);
        let selected = self.resolve(request, provider, candidates)?;
        if let Some(skill) = selected {
            tracing::info!(skill = %skill.name(), "activating skill");
        }

        *state = transition(*state, InvocationState::Assembling);
        let system = self.assembler.build_system_prompt(
            selected,
            candidates,
            request.include_references,
        );
        let messages = self
            .assembler
            .build_messages(&request.user_input, &request.history);

        *state = transition(*state, InvocationState::Dispatching);
        Ok(provider.complete(&messages, system.as_deref(), &[])?)
    }
}

impl SkillCoordinator for PromptInjectionCoordinator {
    fn execute(
        &self,
        request: &InvocationRequest,
        provider: &dyn CompletionProvider,
        candidates: &[Skill],
    ) -> Result<String, SkillError> {
        let mut state = InvocationState::Idle;
        let result = self.run(&mut state, request, provider, candidates);
        finish(state, result)
    }
}

/// Offers every candidate as a tool and lets the provider decide what to activate.
///
/// The returned text is passed through; tool calls are not interpreted.
#[derive(Clone)]
pub struct ToolExposureCoordinator {
    assembler: Arc<dyn PromptAssembler>,
    extra_tools: Vec<ToolDefinition>,
}

impl Default for ToolExposureCoordinator {
    fn default() -> Self {
        Self::new(Arc::new(ToolPromptAssembler))
    }
}

impl fmt::Debug for ToolExposureCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolExposureCoordinator")
            .field("extra_tools", &self.extra_tools.len())
            .finish_non_exhaustive()
    }
}

impl ToolExposureCoordinator {
    /// `assembler` supplies both the system instruction and the per-skill tools.
    #[must_use]
    pub fn new(assembler: Arc<dyn PromptAssembler>) -> Self {
        Self {
            assembler,
            extra_tools: Vec::new(),
        }
    }

    /// Tools appended after the per-skill tools on every request.
    #[must_use]
    pub fn with_extra_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.extra_tools = tools;
        self
    }

    #[must_use]
    pub fn tools_for(&self, candidates: &[Skill]) -> Vec<ToolDefinition> {
        let mut tools = self.assembler.tool_definitions(candidates);
        tools.extend(self.extra_tools.iter().cloned());
        tools
    }
}

impl SkillCoordinator for ToolExposureCoordinator {
    fn execute(
        &self,
        request: &InvocationRequest,
        provider: &dyn CompletionProvider,
        candidates: &[Skill],
    ) -> Result<String, SkillError> {
        let mut state = transition(InvocationState::Idle, InvocationState::Assembling);
        let tools = self.tools_for(candidates);
        let system = self
            .assembler
            .build_system_prompt(None, candidates, request.include_references);
        let messages = self
            .assembler
            .build_messages(&request.user_input, &request.history);

        state = transition(state, InvocationState::Dispatching);
        tracing::debug!(tools = tools.len(), "dispatching with skill tools");
        let result = provider
            .complete(&messages, system.as_deref(), &tools)
            .map_err(SkillError::from);
        finish(state, result)
    }
}
