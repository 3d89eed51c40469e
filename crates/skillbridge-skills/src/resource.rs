use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::SkillError;
use crate::loader::SKILL_FILE;

pub const SCRIPTS_DIR: &str = "scripts";
pub const REFERENCES_DIR: &str = "references";
pub const ASSETS_DIR: &str = "assets";

const UNKNOWN_LANGUAGE: &str = "unknown";

const LANGUAGE_BY_EXTENSION: &[(&str, &str)] = &[
    ("py", "python"),
    ("sh", "bash"),
    ("bash", "bash"),
    ("js", "javascript"),
    ("mjs", "javascript"),
    ("ts", "typescript"),
    ("rb", "ruby"),
    ("pl", "perl"),
    ("ps1", "powershell"),
    ("rs", "rust"),
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkillScript {
    /// File stem, e.g. `fill_form` for `scripts/fill_form.py`.
    pub name: String,
    pub content: String,
    pub path: PathBuf,
    pub language: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkillReference {
    /// File stem, e.g. `forms` for `references/forms.md`.
    pub name: String,
    pub content: String,
    pub path: PathBuf,
}

/// Language tag inferred from the file extension (case-insensitive).
#[must_use]
pub fn script_language(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return UNKNOWN_LANGUAGE;
    };
    let ext = ext.to_ascii_lowercase();
    LANGUAGE_BY_EXTENSION
        .iter()
        .find(|(e, _)| *e == ext)
        .map_or(UNKNOWN_LANGUAGE, |(_, lang)| lang)
}

/// Immediate entries of `dir`, sorted by path. A missing directory yields nothing.
fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, SkillError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut paths = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;
    paths.sort();
    Ok(paths)
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().and_then(|n| n.to_str()).map(str::to_owned)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_owned()
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("md"))
}

fn read(path: &Path) -> Result<String, SkillError> {
    std::fs::read_to_string(path).map_err(|e| SkillError::read(path, e))
}

/// Load every file in `<skill_dir>/scripts`, keyed by file name.
///
/// # Errors
///
/// Returns an error if the directory cannot be listed or a script cannot be read as UTF-8.
pub fn collect_scripts(skill_dir: &Path) -> Result<BTreeMap<String, SkillScript>, SkillError> {
    let mut scripts = BTreeMap::new();
    for path in sorted_entries(&skill_dir.join(SCRIPTS_DIR))? {
        if !path.is_file() {
            continue;
        }
        let Some(key) = file_name(&path) else {
            continue;
        };
        scripts.insert(
            key,
            SkillScript {
                name: file_stem(&path),
                content: read(&path)?,
                language: script_language(&path),
                path,
            },
        );
    }
    Ok(scripts)
}

/// Load markdown references from `<skill_dir>/references` plus stray root-level `.md`
/// files other than `SKILL.md`. A root-level file never replaces a same-named entry
/// from `references/`.
///
/// # Errors
///
/// Returns an error if a directory cannot be listed or a reference cannot be read.
pub fn collect_references(
    skill_dir: &Path,
) -> Result<BTreeMap<String, SkillReference>, SkillError> {
    let mut references = BTreeMap::new();

    for path in sorted_entries(&skill_dir.join(REFERENCES_DIR))? {
        if !path.is_file() || !is_markdown(&path) {
            continue;
        }
        let Some(key) = file_name(&path) else {
            continue;
        };
        references.insert(
            key,
            SkillReference {
                name: file_stem(&path),
                content: read(&path)?,
                path,
            },
        );
    }

    for path in sorted_entries(skill_dir)? {
        if !path.is_file() || !is_markdown(&path) {
            continue;
        }
        let Some(key) = file_name(&path) else {
            continue;
        };
        if key == SKILL_FILE || references.contains_key(&key) {
            continue;
        }
        references.insert(
            key,
            SkillReference {
                name: file_stem(&path),
                content: read(&path)?,
                path,
            },
        );
    }

    Ok(references)
}

/// Raw listing of `<skill_dir>/assets`, sorted. Contents are not read.
///
/// # Errors
///
/// Returns an error if the directory exists but cannot be listed.
pub fn collect_assets(skill_dir: &Path) -> Result<Vec<PathBuf>, SkillError> {
    sorted_entries(&skill_dir.join(ASSETS_DIR))
}
