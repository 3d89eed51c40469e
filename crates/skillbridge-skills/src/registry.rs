use std::path::Path;

use crate::loader::{Skill, SkillLoader, SkillMetadata};

/// Default skill search paths, relative to the working directory.
pub const DEFAULT_SKILL_DIRS: &[&str] = &["skills", ".claude/skills"];

/// In-memory set of loaded skills, unique by name, kept in insertion order.
#[derive(Debug, Default, Clone)]
pub struct SkillRegistry {
    skills: Vec<Skill>,
}

impl SkillRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every skill under each of `paths` with `loader`.
    ///
    /// Paths that are not directories are skipped. Invalid skills are logged and skipped
    /// by the loader; later duplicates replace earlier ones.
    pub fn load(paths: &[impl AsRef<Path>], loader: &dyn SkillLoader) -> Self {
        let mut registry = Self::new();
        registry.load_from(paths, loader);
        registry
    }

    /// Add skills from `paths` into this registry. Returns how many were inserted.
    pub fn load_from(&mut self, paths: &[impl AsRef<Path>], loader: &dyn SkillLoader) -> usize {
        let mut count = 0;
        for base in paths {
            let base = base.as_ref();
            if !base.is_dir() {
                tracing::debug!("skill path {} does not exist, skipping", base.display());
                continue;
            }
            for skill in loader.load_skills_from_directory(base) {
                self.insert(skill);
                count += 1;
            }
        }
        count
    }

    /// Insert a skill. A skill with the same name is replaced in place.
    pub fn insert(&mut self, skill: Skill) -> Option<Skill> {
        if let Some(slot) = self.skills.iter_mut().find(|s| s.name() == skill.name()) {
            tracing::warn!(
                skill = %skill.name(),
                "replacing previously loaded skill from {}",
                slot.path().display()
            );
            return Some(std::mem::replace(slot, skill));
        }
        self.skills.push(skill);
        None
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Skill> {
        self.skills.iter().find(|s| s.name() == name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Skill> {
        let idx = self.skills.iter().position(|s| s.name() == name)?;
        Some(self.skills.remove(idx))
    }

    #[must_use]
    pub fn all(&self) -> &[Skill] {
        &self.skills
    }

    /// Metadata of every skill, sorted by name.
    #[must_use]
    pub fn metadata(&self) -> Vec<&SkillMetadata> {
        let mut meta: Vec<_> = self.skills.iter().map(Skill::metadata).collect();
        meta.sort_by(|a, b| a.name.cmp(&b.name));
        meta
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.skills.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}
