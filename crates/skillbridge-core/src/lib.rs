//! Skill invocation coordinators, runtime facade, configuration, and bootstrap.

pub mod bootstrap;
pub mod config;
pub mod coordinator;
pub mod runtime;
pub mod vault;

pub use config::Config;
pub use coordinator::{
    InvocationRequest, PromptInjectionCoordinator, SkillCoordinator, ToolExposureCoordinator,
};
pub use runtime::{SkillRuntime, SkillRuntimeBuilder};
