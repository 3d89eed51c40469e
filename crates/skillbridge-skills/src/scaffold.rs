//! Skill scaffolding and offline validation.

use std::fmt;
use std::path::{Path, PathBuf};

use serde_yaml::Value;

use crate::error::SkillError;
use crate::loader::{
    SKILL_FILE, SkillMetadata, description_violations, name_violations, parse_content,
    parse_frontmatter_mapping, split_frontmatter,
};
use crate::resource::{ASSETS_DIR, REFERENCES_DIR, SCRIPTS_DIR, collect_scripts};

const DEFAULT_INSTRUCTIONS: &str = "# Instructions\n\nAdd your skill instructions here.";
const EXAMPLE_SCRIPT: &str = "#!/usr/bin/env python3\nprint(\"Hello from skill script!\")\n";

#[derive(Debug, Clone)]
pub struct ScaffoldOptions {
    pub instructions: String,
    pub include_scripts: bool,
    pub include_references: bool,
    pub include_assets: bool,
}

impl Default for ScaffoldOptions {
    fn default() -> Self {
        Self {
            instructions: DEFAULT_INSTRUCTIONS.to_owned(),
            include_scripts: false,
            include_references: false,
            include_assets: false,
        }
    }
}

/// Create `<output_dir>/<name>/SKILL.md` plus any requested resource directories.
///
/// Returns the skill directory.
///
/// # Errors
///
/// Returns [`SkillError::Schema`] if `name` or `description` is invalid, or an I/O error
/// if the directory tree cannot be written.
pub fn create_skill_template(
    output_dir: &Path,
    name: &str,
    description: &str,
    options: &ScaffoldOptions,
) -> Result<PathBuf, SkillError> {
    let meta = SkillMetadata::new(name, description)?;
    let skill_dir = output_dir.join(name);
    std::fs::create_dir_all(&skill_dir)?;

    let content = format!("{}\n{}\n", meta.to_frontmatter()?, options.instructions.trim());
    std::fs::write(skill_dir.join(SKILL_FILE), content)?;

    if options.include_scripts {
        let scripts = skill_dir.join(SCRIPTS_DIR);
        std::fs::create_dir_all(&scripts)?;
        std::fs::write(scripts.join("example.py"), EXAMPLE_SCRIPT)?;
    }
    if options.include_references {
        std::fs::create_dir_all(skill_dir.join(REFERENCES_DIR))?;
    }
    if options.include_assets {
        std::fs::create_dir_all(skill_dir.join(ASSETS_DIR))?;
    }

    tracing::info!(skill = %name, "created skill template at {}", skill_dir.display());
    Ok(skill_dir)
}

/// Outcome of [`validate_skill`]. Errors make the skill unloadable; warnings do not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for e in &self.errors {
            writeln!(f, "error: {e}")?;
        }
        for w in &self.warnings {
            writeln!(f, "warning: {w}")?;
        }
        Ok(())
    }
}

/// Check a skill directory and report every problem found. Never fails.
#[must_use]
pub fn validate_skill(dir: &Path) -> ValidationReport {
    let mut report = ValidationReport::default();

    let skill_md = dir.join(SKILL_FILE);
    if !skill_md.is_file() {
        report.errors.push(format!("{SKILL_FILE} not found"));
        return report;
    }
    let content = match std::fs::read_to_string(&skill_md) {
        Ok(c) => c,
        Err(e) => {
            report.errors.push(format!("cannot read {SKILL_FILE}: {e}"));
            return report;
        }
    };

    let parsed =
        split_frontmatter(&content).and_then(|(yaml, _)| parse_frontmatter_mapping(yaml));
    let map = match parsed {
        Ok(map) => map,
        Err(e) => {
            report.errors.push(format!("failed to parse {SKILL_FILE}: {e}"));
            return report;
        }
    };

    let name = match map.get("name") {
        Some(Value::String(name)) => {
            report.errors.extend(name_violations(name));
            Some(name.clone())
        }
        _ => {
            report.errors.push("missing required field: name".to_owned());
            None
        }
    };
    match map.get("description") {
        Some(Value::String(description)) => {
            report.errors.extend(description_violations(description));
            if description.trim().is_empty() {
                report.warnings.push("description is empty".to_owned());
            }
        }
        _ => report.errors.push("missing required field: description".to_owned()),
    }

    // Remaining type checks (optional fields, metadata block) only run on otherwise valid files.
    if report.is_valid()
        && let Err(e) = parse_content(&content)
    {
        report.errors.push(format!("failed to parse {SKILL_FILE}: {e}"));
    }

    let dir_name = dir.file_name().and_then(|n| n.to_str());
    if let (Some(name), Some(dir_name)) = (&name, dir_name)
        && name != dir_name
    {
        report.warnings.push(format!(
            "skill name `{name}` does not match directory name `{dir_name}`"
        ));
    }

    match collect_scripts(dir) {
        Ok(scripts) => {
            for (file, script) in &scripts {
                if script.language == "unknown" {
                    report
                        .warnings
                        .push(format!("script `{file}` has an unrecognized language"));
                }
            }
        }
        Err(e) => report.errors.push(format!("cannot read scripts: {e}")),
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{FilesystemLoader, SkillLoader};

    #[test]
    fn template_is_loadable() {
        let out = tempfile::tempdir().unwrap();
        let dir = create_skill_template(
            out.path(),
            "my-skill",
            "Does things",
            &ScaffoldOptions::default(),
        )
        .unwrap();

        assert_eq!(dir, out.path().join("my-skill"));
        let skill = FilesystemLoader.load_skill(&dir).unwrap();
        assert_eq!(skill.name(), "my-skill");
        assert_eq!(skill.description(), "Does things");
        assert!(skill.instructions().starts_with("# Instructions"));
        assert!(!dir.join(SCRIPTS_DIR).exists());
        assert!(validate_skill(&dir).is_valid());
    }

    #[test]
    fn template_with_all_resources() {
        let out = tempfile::tempdir().unwrap();
        let options = ScaffoldOptions {
            instructions: "Run the example.".into(),
            include_scripts: true,
            include_references: true,
            include_assets: true,
        };
        let dir = create_skill_template(out.path(), "full", "Everything", &options).unwrap();

        assert!(dir.join("references").is_dir());
        assert!(dir.join("assets").is_dir());
        let skill = FilesystemLoader.load_skill(&dir).unwrap();
        assert_eq!(skill.instructions(), "Run the example.");
        assert_eq!(skill.script("example.py").unwrap().language, "python");
    }

    #[test]
    fn template_rejects_invalid_name() {
        let out = tempfile::tempdir().unwrap();
        let err = create_skill_template(out.path(), "Bad_Name", "d", &ScaffoldOptions::default())
            .unwrap_err();
        assert!(matches!(err, SkillError::Schema(_)));
        assert!(!out.path().join("Bad_Name").exists());
    }

    #[test]
    fn validate_missing_skill_md() {
        let dir = tempfile::tempdir().unwrap();
        let report = validate_skill(dir.path());
        assert!(!report.is_valid());
        assert_eq!(report.errors, vec!["SKILL.md not found".to_owned()]);
    }

    #[test]
    fn validate_reports_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SKILL_FILE), "just text").unwrap();
        let report = validate_skill(dir.path());
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("failed to parse SKILL.md"));
    }

    #[test]
    fn validate_collects_all_violations() {
        let dir = tempfile::tempdir().unwrap();
        let long = "x".repeat(1025);
        std::fs::write(
            dir.path().join(SKILL_FILE),
            format!("---\nname: Bad-\ndescription: {long}\n---\nbody"),
        )
        .unwrap();

        let report = validate_skill(dir.path());
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors[0].contains("lowercase"));
        assert!(report.errors[1].contains("1024"));
    }

    #[test]
    fn validate_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SKILL_FILE), "---\nlicense: MIT\n---\n").unwrap();
        let report = validate_skill(dir.path());
        assert_eq!(
            report.errors,
            vec![
                "missing required field: name".to_owned(),
                "missing required field: description".to_owned(),
            ]
        );
    }

    #[test]
    fn validate_warns_on_dir_mismatch_and_unknown_script() {
        let out = tempfile::tempdir().unwrap();
        let dir = out.path().join("folder");
        std::fs::create_dir_all(dir.join("scripts")).unwrap();
        std::fs::write(
            dir.join(SKILL_FILE),
            "---\nname: other\ndescription: d\n---\nbody",
        )
        .unwrap();
        std::fs::write(dir.join("scripts/run.zig"), "const x = 1;").unwrap();

        let report = validate_skill(&dir);
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 2);
        assert!(report.warnings[0].contains("does not match directory"));
        assert!(report.warnings[1].contains("run.zig"));
        assert!(report.to_string().contains("warning: "));
    }

    #[test]
    fn validate_warns_on_empty_description() {
        let out = tempfile::tempdir().unwrap();
        let dir = out.path().join("quiet");
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(dir.join(SKILL_FILE), "---\nname: quiet\ndescription: ''\n---\nbody")
            .unwrap();

        let report = validate_skill(&dir);
        assert!(report.is_valid());
        assert_eq!(report.warnings, vec!["description is empty".to_owned()]);
        assert_eq!(FilesystemLoader.load_skill(&dir).unwrap().description(), "");
    }

    #[test]
    fn validate_catches_bad_optional_field_types() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(SKILL_FILE),
            "---\nname: ok\ndescription: d\nmetadata: [1, 2]\n---\n",
        )
        .unwrap();
        let report = validate_skill(dir.path());
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("metadata"));
    }
}
