//! SKILL.md loader, skill registry, matchers, and prompt assembly.

pub mod error;
pub mod loader;
pub mod matcher;
pub mod prompt;
pub mod registry;
pub mod resource;
pub mod scaffold;

pub use error::SkillError;
pub use loader::{FilesystemLoader, Skill, SkillLoader, SkillMetadata};
pub use matcher::{KeywordMatcher, NullMatcher, SemanticMatcher, SkillMatcher};
pub use prompt::{PromptAssembler, SystemPromptAssembler, ToolPromptAssembler};
pub use registry::SkillRegistry;
pub use scaffold::{ScaffoldOptions, ValidationReport, create_skill_template, validate_skill};
