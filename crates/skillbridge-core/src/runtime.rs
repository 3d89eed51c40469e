use std::fmt;
use std::path::Path;
use std::sync::Arc;

use skillbridge_llm::{CompletionProvider, Message, ToolDefinition};
use skillbridge_skills::matcher::{SemanticMatcher, SkillMatcher};
use skillbridge_skills::prompt::{PromptAssembler, SystemPromptAssembler, ToolPromptAssembler};
use skillbridge_skills::{
    FilesystemLoader, Skill, SkillError, SkillLoader, SkillMetadata, SkillRegistry,
};

use crate::coordinator::{
    InvocationRequest, PromptInjectionCoordinator, SkillCoordinator, ToolExposureCoordinator,
};

/// Facade over a skill registry and the collaborators that act on it.
///
/// Construction never touches the filesystem; skills are loaded explicitly.
pub struct SkillRuntime {
    registry: SkillRegistry,
    loader: Box<dyn SkillLoader>,
    matcher: Arc<dyn SkillMatcher>,
    assembler: Arc<dyn PromptAssembler>,
    tool_assembler: Arc<dyn PromptAssembler>,
    coordinator: Box<dyn SkillCoordinator>,
}

impl fmt::Debug for SkillRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkillRuntime")
            .field("skills", &self.registry.len())
            .finish_non_exhaustive()
    }
}

impl Default for SkillRuntime {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl SkillRuntime {
    #[must_use]
    pub fn builder() -> SkillRuntimeBuilder {
        SkillRuntimeBuilder::default()
    }

    /// Load one skill directory into the registry, replacing any skill with the same name.
    ///
    /// # Errors
    ///
    /// Returns the loader's error; the registry is left unchanged.
    pub fn load_skill(&mut self, dir: &Path) -> Result<&Skill, SkillError> {
        let skill = self.loader.load_skill(dir)?;
        let name = skill.name().to_owned();
        self.registry.insert(skill);
        self.registry
            .get(&name)
            .ok_or_else(|| SkillError::NotFound(name))
    }

    /// Load every skill under `base`. Returns how many were added.
    pub fn load_skills_from_directory(&mut self, base: &Path) -> usize {
        let skills = self.loader.load_skills_from_directory(base);
        let count = skills.len();
        for skill in skills {
            self.registry.insert(skill);
        }
        tracing::info!("loaded {count} skill(s) from {}", base.display());
        count
    }

    /// Load from each existing path in `paths`; missing ones are skipped.
    pub fn load_default_skills(&mut self, paths: &[impl AsRef<Path>]) -> usize {
        let count = self.registry.load_from(paths, self.loader.as_ref());
        tracing::info!("loaded {count} skill(s) from default paths");
        count
    }

    #[must_use]
    pub fn get_skill(&self, name: &str) -> Option<&Skill> {
        self.registry.get(name)
    }

    /// Metadata of every loaded skill, sorted by name.
    #[must_use]
    pub fn list_skills(&self) -> Vec<&SkillMetadata> {
        self.registry.metadata()
    }

    pub fn remove_skill(&mut self, name: &str) -> Option<Skill> {
        self.registry.remove(name)
    }

    #[must_use]
    pub fn registry(&self) -> &SkillRegistry {
        &self.registry
    }

    /// Run `request` through the configured coordinator against all loaded skills.
    ///
    /// # Errors
    ///
    /// See [`SkillCoordinator::execute`].
    pub fn execute(
        &self,
        request: &InvocationRequest,
        provider: &dyn CompletionProvider,
    ) -> Result<String, SkillError> {
        self.coordinator
            .execute(request, provider, self.registry.all())
    }

    /// Expose all loaded skills as tools, followed by `extra_tools`.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::Provider`] if the provider call fails.
    pub fn execute_with_tools(
        &self,
        user_input: &str,
        history: &[Message],
        extra_tools: &[ToolDefinition],
        provider: &dyn CompletionProvider,
    ) -> Result<String, SkillError> {
        let request = InvocationRequest::new(user_input).with_history(history.to_vec());
        ToolExposureCoordinator::new(Arc::clone(&self.tool_assembler))
            .with_extra_tools(extra_tools.to_vec())
            .execute(&request, provider, self.registry.all())
    }

    /// Catalog of loaded skills for embedding in an external system prompt. Empty when
    /// nothing is loaded.
    #[must_use]
    pub fn skills_system_prompt(&self) -> String {
        self.assembler
            .build_system_prompt(None, self.registry.all(), false)
            .unwrap_or_default()
    }

    /// # Errors
    ///
    /// Returns the matcher's error, e.g. [`SkillError::Provider`].
    pub fn match_skill(
        &self,
        query: &str,
        provider: &dyn CompletionProvider,
    ) -> Result<Option<&Skill>, SkillError> {
        self.matcher
            .match_skill(query, self.registry.all(), provider)
    }
}

/// Builder for [`SkillRuntime`]. Unset collaborators fall back to the filesystem loader,
/// semantic matcher, system-prompt assembler, tool-prompt assembler and
/// prompt-injection coordinator.
#[derive(Default)]
pub struct SkillRuntimeBuilder {
    registry: Option<SkillRegistry>,
    loader: Option<Box<dyn SkillLoader>>,
    matcher: Option<Arc<dyn SkillMatcher>>,
    assembler: Option<Arc<dyn PromptAssembler>>,
    tool_assembler: Option<Arc<dyn PromptAssembler>>,
    coordinator: Option<Box<dyn SkillCoordinator>>,
}

impl SkillRuntimeBuilder {
    /// Start from an already populated registry.
    #[must_use]
    pub fn with_registry(mut self, registry: SkillRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    #[must_use]
    pub fn with_loader(mut self, loader: impl SkillLoader + 'static) -> Self {
        self.loader = Some(Box::new(loader));
        self
    }

    #[must_use]
    pub fn with_matcher(mut self, matcher: impl SkillMatcher + 'static) -> Self {
        self.matcher = Some(Arc::new(matcher));
        self
    }

    #[must_use]
    pub fn with_assembler(mut self, assembler: impl PromptAssembler + 'static) -> Self {
        self.assembler = Some(Arc::new(assembler));
        self
    }

    /// Assembler used by [`SkillRuntime::execute_with_tools`].
    #[must_use]
    pub fn with_tool_assembler(mut self, assembler: impl PromptAssembler + 'static) -> Self {
        self.tool_assembler = Some(Arc::new(assembler));
        self
    }

    /// Replace the coordinator. The matcher and assembler then only serve
    /// [`SkillRuntime::match_skill`] and [`SkillRuntime::skills_system_prompt`].
    #[must_use]
    pub fn with_coordinator(mut self, coordinator: impl SkillCoordinator + 'static) -> Self {
        self.coordinator = Some(Box::new(coordinator));
        self
    }

    #[must_use]
    pub fn build(self) -> SkillRuntime {
        let matcher: Arc<dyn SkillMatcher> =
            self.matcher.unwrap_or_else(|| Arc::new(SemanticMatcher));
        let assembler: Arc<dyn PromptAssembler> = self
            .assembler
            .unwrap_or_else(|| Arc::new(SystemPromptAssembler));
        let coordinator = self.coordinator.unwrap_or_else(|| {
            Box::new(PromptInjectionCoordinator::new(
                Arc::clone(&matcher),
                Arc::clone(&assembler),
            ))
        });

        SkillRuntime {
            registry: self.registry.unwrap_or_default(),
            loader: self.loader.unwrap_or_else(|| Box::new(FilesystemLoader)),
            matcher,
            assembler,
            tool_assembler: self
                .tool_assembler
                .unwrap_or_else(|| Arc::new(ToolPromptAssembler)),
            coordinator,
        }
    }
}
