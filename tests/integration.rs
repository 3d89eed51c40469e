use std::path::Path;

use skillbridge_core::bootstrap::build_loaded_runtime;
use skillbridge_core::config::MatcherKind;
use skillbridge_core::{Config, InvocationRequest, SkillRuntime};
use skillbridge_llm::mock::MockProvider;
use skillbridge_llm::{Message, ToolDefinition};
use skillbridge_skills::matcher::KeywordMatcher;
use skillbridge_skills::{ScaffoldOptions, SkillError, create_skill_template, validate_skill};

fn write_file(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// Two loadable skills, one broken one, and one directory without SKILL.md.
fn skill_tree(root: &Path) {
    write_file(
        &root.join("pdf-expert/SKILL.md"),
        "---\nname: pdf-expert\ndescription: PDF forms and merging\nversion: 2.1.0\n---\n\
         Always inspect form fields before filling.",
    );
    write_file(
        &root.join("pdf-expert/references/forms.md"),
        "AcroForm checkbox values are /Yes and /Off.",
    );
    write_file(&root.join("pdf-expert/scripts/fill.py"), "print('fill')");
    write_file(
        &root.join("docx/SKILL.md"),
        "---\nname: docx\ndescription: Word documents\n---\nUse pandoc.",
    );
    write_file(&root.join("broken/SKILL.md"), "name: broken\n");
    std::fs::create_dir_all(root.join("notes")).unwrap();
}

#[test]
fn batch_load_skips_invalid_and_empty_directories() {
    let dir = tempfile::tempdir().unwrap();
    skill_tree(dir.path());

    let mut runtime = SkillRuntime::default();
    assert_eq!(runtime.load_skills_from_directory(dir.path()), 2);

    let names: Vec<_> = runtime
        .list_skills()
        .iter()
        .map(|m| m.name.clone())
        .collect();
    assert_eq!(names, ["docx", "pdf-expert"]);

    let pdf = runtime.get_skill("pdf-expert").unwrap();
    assert_eq!(pdf.metadata().version.as_deref(), Some("2.1.0"));
    assert_eq!(pdf.script("fill.py").unwrap().language, "python");
    assert!(pdf.reference("forms.md").is_some());
}

#[test]
fn semantic_match_then_inject_with_references() {
    let dir = tempfile::tempdir().unwrap();
    skill_tree(dir.path());
    let mut runtime = SkillRuntime::default();
    runtime.load_skills_from_directory(dir.path());

    let provider = MockProvider::with_responses(vec![
        "\"pdf-expert\"".into(),
        "Filled the form.".into(),
    ]);
    let request = InvocationRequest::new("Please fill out this PDF form")
        .with_history(vec![Message::user("hi"), Message::assistant("hello")])
        .with_references(true);

    let answer = runtime.execute(&request, &provider).unwrap();
    assert_eq!(answer, "Filled the form.");

    let calls = provider.calls();
    assert_eq!(calls.len(), 2);

    let classify = &calls[0].messages[0].content;
    assert!(classify.contains("- pdf-expert: PDF forms and merging"));
    assert!(classify.contains("- docx: Word documents"));

    let dispatch = &calls[1];
    let system = dispatch.system.as_deref().unwrap();
    assert!(system.starts_with("# Active Skill: pdf-expert"));
    assert!(system.contains("Always inspect form fields before filling."));
    assert!(system.contains("## forms\nAcroForm checkbox values"));
    assert_eq!(dispatch.messages.len(), 3);
    assert_eq!(dispatch.messages[2].content, "Please fill out this PDF form");
}

#[test]
fn keyword_runtime_never_calls_provider_for_matching() {
    let dir = tempfile::tempdir().unwrap();
    skill_tree(dir.path());
    let mut runtime = SkillRuntime::builder()
        .with_matcher(KeywordMatcher::new().with_keywords("pdf-expert", ["pdf"]))
        .build();
    runtime.load_skills_from_directory(dir.path());

    let provider = MockProvider::default();
    let matched = runtime
        .match_skill("I need help with pdf forms", &provider)
        .unwrap();
    assert_eq!(matched.map(|s| s.name()), Some("pdf-expert"));

    let unmatched = runtime.match_skill("book a flight", &provider).unwrap();
    assert!(unmatched.is_none());
    assert_eq!(provider.call_count(), 0);
}

#[test]
fn unknown_explicit_skill_fails_before_dispatch() {
    let dir = tempfile::tempdir().unwrap();
    skill_tree(dir.path());
    let mut runtime = SkillRuntime::default();
    runtime.load_skills_from_directory(dir.path());
    let provider = MockProvider::default();

    let err = runtime
        .execute(&InvocationRequest::new("x").with_skill("xlsx"), &provider)
        .unwrap_err();
    assert!(matches!(err, SkillError::NotFound(_)));
    assert_eq!(provider.call_count(), 0);
}

#[test]
fn tool_mode_exposes_loaded_skills() {
    let dir = tempfile::tempdir().unwrap();
    skill_tree(dir.path());
    let mut runtime = SkillRuntime::default();
    runtime.load_skills_from_directory(dir.path());
    let provider = MockProvider::default();

    let extra = [ToolDefinition::without_parameters("search", "Web search")];
    runtime
        .execute_with_tools("merge these PDFs", &[], &extra, &provider)
        .unwrap();

    let call = provider.last_call().unwrap();
    let names: Vec<_> = call.tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["activate_skill_docx", "activate_skill_pdf_expert", "search"]);
}

#[test]
fn scaffolded_skill_validates_and_loads_through_config() {
    let dir = tempfile::tempdir().unwrap();
    let options = ScaffoldOptions {
        include_scripts: true,
        include_references: true,
        ..ScaffoldOptions::default()
    };
    let skill_dir =
        create_skill_template(dir.path(), "meeting-notes", "Summarize meetings", &options)
            .unwrap();
    let report = validate_skill(&skill_dir);
    assert!(report.is_valid(), "{report}");
    assert!(report.warnings.is_empty());

    let mut config = Config::default();
    config.skills.paths = vec![
        dir.path().display().to_string(),
        dir.path().join("missing").display().to_string(),
    ];
    config.skills.matcher = MatcherKind::None;
    let runtime = build_loaded_runtime(&config);
    assert!(runtime.get_skill("meeting-notes").is_some());
    assert!(
        runtime
            .skills_system_prompt()
            .contains("- **meeting-notes**: Summarize meetings")
    );
}
