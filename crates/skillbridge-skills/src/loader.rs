use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde_yaml::{Mapping, Value};

use crate::error::SkillError;
use crate::resource::{
    SkillReference, SkillScript, collect_assets, collect_references, collect_scripts,
};

pub const SKILL_FILE: &str = "SKILL.md";
pub const MAX_NAME_LEN: usize = 64;
pub const MAX_DESCRIPTION_LEN: usize = 1024;

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9](?:[a-z0-9-]*[a-z0-9])?$").unwrap());

/// Frontmatter keys with a dedicated `SkillMetadata` field. Anything else is an extension.
const KNOWN_KEYS: &[&str] = &[
    "name",
    "description",
    "license",
    "version",
    "author",
    "allowed-tools",
    "allowed_tools",
    "compatibility",
    "metadata",
];

/// Declared fields outside the known set, keyed by field name.
///
/// Populated from the nested `metadata:` block first, then from unknown top-level keys,
/// so a top-level key replaces a same-named nested one.
pub type Extensions = BTreeMap<String, Value>;

#[derive(Clone, Debug, PartialEq)]
pub struct SkillMetadata {
    pub name: String,
    pub description: String,
    pub license: Option<String>,
    pub version: Option<String>,
    pub author: Option<String>,
    pub allowed_tools: Vec<String>,
    pub compatibility: Option<String>,
    pub extensions: Extensions,
}

impl SkillMetadata {
    /// Metadata with only the required fields, validated.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::Schema`] if the name or description violates its constraints.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, SkillError> {
        let name = name.into();
        let description = description.into();
        validate_name(&name)?;
        validate_description(&description)?;
        Ok(Self {
            name,
            description,
            license: None,
            version: None,
            author: None,
            allowed_tools: Vec::new(),
            compatibility: None,
            extensions: Extensions::new(),
        })
    }

    /// Render this metadata as a `---` delimited YAML frontmatter block.
    ///
    /// Extensions are written under a nested `metadata:` mapping.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::Schema`] if YAML serialization fails.
    pub fn to_frontmatter(&self) -> Result<String, SkillError> {
        let mut map = Mapping::new();
        map.insert("name".into(), self.name.clone().into());
        map.insert("description".into(), self.description.clone().into());
        for (key, value) in [
            ("license", &self.license),
            ("version", &self.version),
            ("author", &self.author),
        ] {
            if let Some(v) = value {
                map.insert(key.into(), v.clone().into());
            }
        }
        if !self.allowed_tools.is_empty() {
            let tools = self
                .allowed_tools
                .iter()
                .map(|t| Value::String(t.clone()))
                .collect();
            map.insert("allowed-tools".into(), Value::Sequence(tools));
        }
        if let Some(c) = &self.compatibility {
            map.insert("compatibility".into(), c.clone().into());
        }
        if !self.extensions.is_empty() {
            let nested: Mapping = self
                .extensions
                .iter()
                .map(|(k, v)| (Value::String(k.clone()), v.clone()))
                .collect();
            map.insert("metadata".into(), Value::Mapping(nested));
        }

        let yaml = serde_yaml::to_string(&map)
            .map_err(|e| SkillError::Schema(format!("failed to serialize frontmatter: {e}")))?;
        Ok(format!("---\n{yaml}---\n"))
    }
}

/// A loaded skill. Immutable once constructed.
#[derive(Clone, Debug)]
pub struct Skill {
    meta: SkillMetadata,
    instructions: String,
    path: PathBuf,
    scripts: BTreeMap<String, SkillScript>,
    references: BTreeMap<String, SkillReference>,
    assets: Vec<PathBuf>,
}

impl Skill {
    #[must_use]
    pub fn new(
        meta: SkillMetadata,
        instructions: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            meta,
            instructions: instructions.into(),
            path: path.into(),
            scripts: BTreeMap::new(),
            references: BTreeMap::new(),
            assets: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_scripts(mut self, scripts: BTreeMap<String, SkillScript>) -> Self {
        self.scripts = scripts;
        self
    }

    #[must_use]
    pub fn with_references(mut self, references: BTreeMap<String, SkillReference>) -> Self {
        self.references = references;
        self
    }

    #[must_use]
    pub fn with_assets(mut self, assets: Vec<PathBuf>) -> Self {
        self.assets = assets;
        self
    }

    #[must_use]
    pub fn metadata(&self) -> &SkillMetadata {
        &self.meta
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.meta.description
    }

    #[must_use]
    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Scripts keyed by file name.
    #[must_use]
    pub fn scripts(&self) -> &BTreeMap<String, SkillScript> {
        &self.scripts
    }

    /// References keyed by file name.
    #[must_use]
    pub fn references(&self) -> &BTreeMap<String, SkillReference> {
        &self.references
    }

    #[must_use]
    pub fn assets(&self) -> &[PathBuf] {
        &self.assets
    }

    #[must_use]
    pub fn script(&self, file_name: &str) -> Option<&SkillScript> {
        self.scripts.get(file_name)
    }

    #[must_use]
    pub fn reference(&self, file_name: &str) -> Option<&SkillReference> {
        self.references.get(file_name)
    }
}

/// Every constraint violation of a skill name, in check order.
#[must_use]
pub fn name_violations(name: &str) -> Vec<String> {
    let mut out = Vec::new();
    if name.is_empty() {
        out.push("name must not be empty".to_owned());
        return out;
    }
    if name.chars().count() > MAX_NAME_LEN {
        out.push(format!("name must be at most {MAX_NAME_LEN} characters"));
    }
    if !NAME_RE.is_match(name) {
        out.push(
            "name must contain only lowercase letters, digits, and hyphens, \
             and must not start or end with a hyphen"
                .to_owned(),
        );
    }
    out
}

/// Every constraint violation of a skill description. An empty description is allowed.
#[must_use]
pub fn description_violations(description: &str) -> Vec<String> {
    let mut out = Vec::new();
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        out.push(format!(
            "description must be at most {MAX_DESCRIPTION_LEN} characters"
        ));
    }
    out
}

/// # Errors
///
/// Returns [`SkillError::Schema`] describing the first violated constraint.
pub fn validate_name(name: &str) -> Result<(), SkillError> {
    match name_violations(name).into_iter().next() {
        Some(v) => Err(SkillError::Schema(v)),
        None => Ok(()),
    }
}

/// # Errors
///
/// Returns [`SkillError::Schema`] describing the first violated constraint.
pub fn validate_description(description: &str) -> Result<(), SkillError> {
    match description_violations(description).into_iter().next() {
        Some(v) => Err(SkillError::Schema(v)),
        None => Ok(()),
    }
}

/// Split `content` into the raw YAML block and the body following the closing delimiter.
///
/// # Errors
///
/// Returns [`SkillError::Format`] if the opening or closing `---` line is missing.
pub fn split_frontmatter(content: &str) -> Result<(&str, &str), SkillError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.split_inclusive('\n');

    let first = lines.next().unwrap_or_default();
    if first.trim_end() != "---" {
        return Err(SkillError::Format(
            "missing opening `---` frontmatter delimiter".into(),
        ));
    }

    let yaml_start = first.len();
    let mut offset = yaml_start;
    for line in lines {
        if line.trim_end() == "---" {
            return Ok((&content[yaml_start..offset], &content[offset + line.len()..]));
        }
        offset += line.len();
    }

    Err(SkillError::Format(
        "unclosed frontmatter: missing closing `---` delimiter".into(),
    ))
}

/// Parse a YAML frontmatter block into a mapping.
///
/// # Errors
///
/// Returns [`SkillError::Schema`] if the block is not valid YAML or not a mapping.
pub fn parse_frontmatter_mapping(yaml: &str) -> Result<Mapping, SkillError> {
    match serde_yaml::from_str::<Value>(yaml) {
        Ok(Value::Mapping(map)) => Ok(map),
        Ok(_) => Err(SkillError::Schema("frontmatter must be a YAML mapping".into())),
        Err(e) => Err(SkillError::Schema(format!("invalid YAML frontmatter: {e}"))),
    }
}

/// Parse SKILL.md content into metadata and the trimmed instruction body.
///
/// # Errors
///
/// Returns [`SkillError::Format`] for missing delimiters and [`SkillError::Schema`] for
/// invalid YAML, missing required fields, or constraint violations.
pub fn parse_content(content: &str) -> Result<(SkillMetadata, String), SkillError> {
    let (yaml, body) = split_frontmatter(content)?;
    let map = parse_frontmatter_mapping(yaml)?;
    let meta = metadata_from_mapping(&map)?;
    Ok((meta, body.trim().to_owned()))
}

fn metadata_from_mapping(map: &Mapping) -> Result<SkillMetadata, SkillError> {
    let name = required_string(map, "name")?;
    validate_name(&name)?;
    let description = required_string(map, "description")?;
    validate_description(&description)?;

    let nested = match map.get("metadata") {
        None | Some(Value::Null) => Mapping::new(),
        Some(Value::Mapping(m)) => m.clone(),
        Some(_) => return Err(SkillError::Schema("`metadata` must be a mapping".into())),
    };

    let mut extensions = Extensions::new();
    for (key, value) in &nested {
        extensions.insert(key_string(key)?, value.clone());
    }
    for (key, value) in map {
        let key = key_string(key)?;
        if !KNOWN_KEYS.contains(&key.as_str()) {
            extensions.insert(key, value.clone());
        }
    }

    let allowed_tools = match optional_tools(map, "allowed-tools")? {
        Some(tools) => tools,
        None => optional_tools(map, "allowed_tools")?.unwrap_or_default(),
    };

    Ok(SkillMetadata {
        name,
        description,
        license: optional_string(map, "license")?,
        version: optional_string(map, "version")?.or(optional_string(&nested, "version")?),
        author: optional_string(map, "author")?.or(optional_string(&nested, "author")?),
        allowed_tools,
        compatibility: optional_string(map, "compatibility")?,
        extensions,
    })
}

fn key_string(key: &Value) -> Result<String, SkillError> {
    scalar_string(key).ok_or_else(|| SkillError::Schema("frontmatter keys must be scalars".into()))
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn required_string(map: &Mapping, key: &str) -> Result<String, SkillError> {
    match map.get(key) {
        None | Some(Value::Null) => Err(SkillError::Schema(format!(
            "missing required field: {key}"
        ))),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(SkillError::Schema(format!("`{key}` must be a string"))),
    }
}

fn optional_string(map: &Mapping, key: &str) -> Result<Option<String>, SkillError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => scalar_string(v)
            .map(Some)
            .ok_or_else(|| SkillError::Schema(format!("`{key}` must be a scalar value"))),
    }
}

/// Accepts either a YAML list or a single whitespace/comma separated string.
fn optional_tools(map: &Mapping, key: &str) -> Result<Option<Vec<String>>, SkillError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(
            s.split(|c: char| c == ',' || c.is_whitespace())
                .filter(|t| !t.is_empty())
                .map(str::to_owned)
                .collect(),
        )),
        Some(Value::Sequence(items)) => items
            .iter()
            .map(|item| {
                scalar_string(item)
                    .ok_or_else(|| SkillError::Schema(format!("`{key}` entries must be strings")))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(_) => Err(SkillError::Schema(format!(
            "`{key}` must be a list of strings"
        ))),
    }
}

/// Source of skills. Implementations decide where skill definitions live.
pub trait SkillLoader: Send + Sync {
    /// Parse a SKILL.md file into metadata and its instruction body.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or its frontmatter is invalid.
    fn parse_metadata(&self, path: &Path) -> Result<(SkillMetadata, String), SkillError>;

    /// Load a single skill directory.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::NotFound`] if `SKILL.md` is missing, or any parse/read error.
    fn load_skill(&self, dir: &Path) -> Result<Skill, SkillError>;

    /// Load every skill found in the immediate subdirectories of `base`.
    ///
    /// Failures are logged and skipped; this never fails as a whole.
    fn load_skills_from_directory(&self, base: &Path) -> Vec<Skill>;
}

/// Loads skills from `<dir>/SKILL.md` plus `scripts/`, `references/`, and `assets/`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilesystemLoader;

impl SkillLoader for FilesystemLoader {
    fn parse_metadata(&self, path: &Path) -> Result<(SkillMetadata, String), SkillError> {
        let content = std::fs::read_to_string(path).map_err(|e| SkillError::read(path, e))?;
        parse_content(&content)
    }

    fn load_skill(&self, dir: &Path) -> Result<Skill, SkillError> {
        let skill_md = dir.join(SKILL_FILE);
        if !skill_md.is_file() {
            return Err(SkillError::NotFound(format!(
                "{SKILL_FILE} not found in {}",
                dir.display()
            )));
        }

        let (meta, instructions) = self.parse_metadata(&skill_md)?;
        let scripts = collect_scripts(dir)?;
        let references = collect_references(dir)?;
        let assets = collect_assets(dir)?;

        tracing::debug!(
            skill = %meta.name,
            scripts = scripts.len(),
            references = references.len(),
            assets = assets.len(),
            "loaded skill from {}",
            dir.display()
        );

        Ok(Skill::new(meta, instructions, dir)
            .with_scripts(scripts)
            .with_references(references)
            .with_assets(assets))
    }

    fn load_skills_from_directory(&self, base: &Path) -> Vec<Skill> {
        let entries = match std::fs::read_dir(base) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("cannot read skill directory {}: {e}", base.display());
                return Vec::new();
            }
        };

        let mut dirs: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_dir() && path.join(SKILL_FILE).is_file())
            .collect();
        dirs.sort();

        let mut skills = Vec::with_capacity(dirs.len());
        for dir in dirs {
            match self.load_skill(&dir) {
                Ok(skill) => skills.push(skill),
                Err(e) => tracing::warn!("skipping skill at {}: {e}", dir.display()),
            }
        }
        skills
    }
}
