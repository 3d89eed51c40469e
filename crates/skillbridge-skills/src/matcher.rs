use std::fmt::Write as _;

use skillbridge_llm::{CompletionProvider, Message};

use crate::error::SkillError;
use crate::loader::Skill;

const NO_MATCH: &str = "none";
const NAME_HIT_SCORE: u32 = 10;

/// Picks at most one skill from `candidates` for a user query.
pub trait SkillMatcher: Send + Sync {
    /// # Errors
    ///
    /// Returns [`SkillError::Provider`] if a provider-backed strategy fails to get an answer.
    fn match_skill<'a>(
        &self,
        query: &str,
        candidates: &'a [Skill],
        provider: &dyn CompletionProvider,
    ) -> Result<Option<&'a Skill>, SkillError>;
}

/// Asks the provider to classify the query against the candidate list.
#[derive(Debug, Clone, Copy, Default)]
pub struct SemanticMatcher;

impl SemanticMatcher {
    #[must_use]
    pub fn classification_prompt(query: &str, candidates: &[Skill]) -> String {
        let mut prompt = String::from(
            "Based on the user's request, determine which skill (if any) is most relevant.\n\n\
             Available skills:\n",
        );
        for skill in candidates {
            let _ = writeln!(prompt, "- {}: {}", skill.name(), skill.description());
        }
        let _ = write!(
            prompt,
            "\nUser request: {query}\n\n\
             Respond with ONLY the skill name (e.g., \"pdf\" or \"docx\") if a skill matches, \
             or \"{NO_MATCH}\" if no skill is relevant.\n\
             Do not include any explanation."
        );
        prompt
    }
}

/// Trim, lowercase and drop quote characters from a classification answer.
#[must_use]
pub fn normalize_choice(response: &str) -> String {
    response
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '"' | '\'' | '`'))
        .collect::<String>()
        .trim()
        .to_owned()
}

impl SkillMatcher for SemanticMatcher {
    fn match_skill<'a>(
        &self,
        query: &str,
        candidates: &'a [Skill],
        provider: &dyn CompletionProvider,
    ) -> Result<Option<&'a Skill>, SkillError> {
        if candidates.is_empty() {
            return Ok(None);
        }

        let prompt = Self::classification_prompt(query, candidates);
        let response = provider.complete(&[Message::user(prompt)], None, &[])?;
        let choice = normalize_choice(&response);

        if choice == NO_MATCH {
            tracing::debug!("semantic matcher: no skill selected");
            return Ok(None);
        }

        let found = candidates.iter().find(|s| s.name() == choice);
        match found {
            Some(skill) => {
                tracing::debug!(skill = %skill.name(), "semantic matcher selected skill");
            }
            None => {
                tracing::debug!(response = %choice, "semantic matcher answered an unknown skill");
            }
        }
        Ok(found)
    }
}

/// Scores candidates by name and keyword hits without calling the provider.
#[derive(Debug, Clone, Default)]
pub struct KeywordMatcher {
    keywords: Vec<(String, Vec<String>)>,
}

impl KeywordMatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append keywords for `skill_name`. The skill keeps the position of its first registration.
    pub fn add_keywords<I, S>(&mut self, skill_name: &str, words: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words = words.into_iter().map(Into::into);
        if let Some((_, existing)) = self.keywords.iter_mut().find(|(n, _)| n == skill_name) {
            existing.extend(words);
        } else {
            self.keywords.push((skill_name.to_owned(), words.collect()));
        }
    }

    #[must_use]
    pub fn with_keywords<I, S>(mut self, skill_name: &str, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_keywords(skill_name, words);
        self
    }

    #[must_use]
    pub fn keywords_for(&self, skill_name: &str) -> &[String] {
        self.registration(skill_name)
            .map(|idx| self.keywords[idx].1.as_slice())
            .unwrap_or_default()
    }

    fn registration(&self, skill_name: &str) -> Option<usize> {
        self.keywords.iter().position(|(n, _)| n == skill_name)
    }

    /// Score of `skill` for an already lower-cased query.
    #[must_use]
    pub fn score(&self, query_lower: &str, skill: &Skill) -> u32 {
        let mut score = 0;
        if query_lower.contains(skill.name()) {
            score += NAME_HIT_SCORE;
        }
        for keyword in self.keywords_for(skill.name()) {
            if query_lower.contains(&keyword.to_lowercase()) {
                score += 1;
            }
        }
        score
    }
}

impl SkillMatcher for KeywordMatcher {
    fn match_skill<'a>(
        &self,
        query: &str,
        candidates: &'a [Skill],
        _provider: &dyn CompletionProvider,
    ) -> Result<Option<&'a Skill>, SkillError> {
        let query_lower = query.to_lowercase();

        // Registered skills first in registration order, then the rest in candidate order.
        let mut ranked: Vec<(usize, usize, &Skill)> = candidates
            .iter()
            .enumerate()
            .map(|(i, s)| (self.registration(s.name()).unwrap_or(usize::MAX), i, s))
            .collect();
        ranked.sort_by_key(|&(reg, i, _)| (reg, i));

        let mut best: Option<&Skill> = None;
        let mut best_score = 0;
        for (_, _, skill) in ranked {
            let score = self.score(&query_lower, skill);
            if score > best_score {
                best_score = score;
                best = Some(skill);
            }
        }

        if let Some(skill) = best {
            tracing::debug!(
                skill = %skill.name(),
                score = best_score,
                "keyword matcher selected skill"
            );
        }
        Ok(best)
    }
}

/// Never selects a skill. Used when auto-matching is disabled in configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMatcher;

impl SkillMatcher for NullMatcher {
    fn match_skill<'a>(
        &self,
        _query: &str,
        _candidates: &'a [Skill],
        _provider: &dyn CompletionProvider,
    ) -> Result<Option<&'a Skill>, SkillError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use skillbridge_llm::mock::MockProvider;

    use super::*;
    use crate::loader::SkillMetadata;

    fn make_skill(name: &str, description: &str) -> Skill {
        Skill::new(
            SkillMetadata::new(name, description).unwrap(),
            "",
            format!("/skills/{name}"),
        )
    }

    fn skills() -> Vec<Skill> {
        vec![
            make_skill("pdf", "Work with PDF files"),
            make_skill("docx", "Edit Word documents"),
        ]
    }

    #[test]
    fn semantic_empty_candidates_skip_provider() {
        let mock = MockProvider::default();
        let result = SemanticMatcher.match_skill("anything", &[], &mock).unwrap();
        assert!(result.is_none());
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn semantic_exact_name_matches() {
        let mock = MockProvider::with_responses(vec!["docx".into()]);
        let candidates = skills();
        let found = SemanticMatcher
            .match_skill("edit my report", &candidates, &mock)
            .unwrap()
            .unwrap();
        assert_eq!(found.name(), "docx");
        assert_eq!(mock.call_count(), 1);
    }

    #[test]
    fn semantic_none_in_any_case_or_quoting() {
        let candidates = skills();
        for answer in ["none", "NONE", "\"None\"", "  'none'\n", "`none`"] {
            let mock = MockProvider::with_responses(vec![answer.into()]);
            let result = SemanticMatcher.match_skill("hello", &candidates, &mock).unwrap();
            assert!(result.is_none(), "answer {answer:?} should mean no match");
        }
    }

    #[test]
    fn semantic_quoted_name_matches() {
        let mock = MockProvider::with_responses(vec!["  \"PDF\" ".into()]);
        let candidates = skills();
        let found = SemanticMatcher.match_skill("q", &candidates, &mock).unwrap();
        assert_eq!(found.map(Skill::name), Some("pdf"));
    }

    #[test]
    fn semantic_unknown_name_is_no_match() {
        let mock = MockProvider::with_responses(vec!["spreadsheet".into()]);
        let candidates = skills();
        assert!(
            SemanticMatcher
                .match_skill("q", &candidates, &mock)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn semantic_prompt_lists_candidates_as_single_user_message() {
        let mock = MockProvider::with_responses(vec!["none".into()]);
        let candidates = skills();
        SemanticMatcher
            .match_skill("fill a form", &candidates, &mock)
            .unwrap();

        let call = mock.last_call().unwrap();
        assert!(call.system.is_none());
        assert!(call.tools.is_empty());
        assert_eq!(call.messages.len(), 1);
        let prompt = &call.messages[0].content;
        assert!(prompt.contains("- pdf: Work with PDF files"));
        assert!(prompt.contains("- docx: Edit Word documents"));
        assert!(prompt.contains("User request: fill a form"));
        assert!(prompt.contains("\"none\""));
    }

    #[test]
    fn semantic_provider_failure_propagates() {
        let mock = MockProvider::failing();
        let candidates = skills();
        let err = SemanticMatcher
            .match_skill("q", &candidates, &mock)
            .unwrap_err();
        assert!(matches!(err, SkillError::Provider(_)));
    }

    #[test]
    fn normalize_strips_quotes_and_case() {
        assert_eq!(normalize_choice(" \"Pdf-Expert\" \n"), "pdf-expert");
        assert_eq!(normalize_choice("`none`"), "none");
        assert_eq!(normalize_choice(""), "");
    }

    #[test]
    fn keyword_match_by_registered_keyword() {
        let matcher = KeywordMatcher::new().with_keywords("pdf-expert", ["pdf"]);
        let candidates = vec![
            make_skill("pdf-expert", "PDF specialist"),
            make_skill("docx", "Word"),
        ];
        let mock = MockProvider::default();
        let found = matcher
            .match_skill("I need help with pdf forms", &candidates, &mock)
            .unwrap();
        assert_eq!(found.map(Skill::name), Some("pdf-expert"));
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn keyword_zero_hits_is_no_match() {
        let matcher = KeywordMatcher::new().with_keywords("pdf", ["acrobat"]);
        let candidates = skills();
        let mock = MockProvider::default();
        assert!(
            matcher
                .match_skill("plan my holiday", &candidates, &mock)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn keyword_name_hit_outweighs_keywords() {
        let matcher = KeywordMatcher::new().with_keywords("docx", ["report", "edit", "document"]);
        let candidates = skills();
        let mock = MockProvider::default();
        let found = matcher
            .match_skill("Edit this PDF report document", &candidates, &mock)
            .unwrap();
        assert_eq!(found.map(Skill::name), Some("pdf"));
    }

    #[test]
    fn keyword_case_insensitive() {
        let matcher = KeywordMatcher::new().with_keywords("docx", ["WORD"]);
        let candidates = skills();
        let found = matcher
            .match_skill("open a word file", &candidates, &MockProvider::default())
            .unwrap();
        assert_eq!(found.map(Skill::name), Some("docx"));
    }

    #[test]
    fn keyword_tie_goes_to_first_registered() {
        let matcher = KeywordMatcher::new()
            .with_keywords("docx", ["file"])
            .with_keywords("pdf", ["file"]);
        let candidates = skills();
        let found = matcher
            .match_skill("convert this file", &candidates, &MockProvider::default())
            .unwrap();
        assert_eq!(found.map(Skill::name), Some("docx"));
    }

    #[test]
    fn keyword_tie_between_unregistered_uses_candidate_order() {
        let candidates = vec![make_skill("a", "x"), make_skill("b", "y")];
        let found = KeywordMatcher::new()
            .match_skill("a and b", &candidates, &MockProvider::default())
            .unwrap();
        assert_eq!(found.map(Skill::name), Some("a"));
    }

    #[test]
    fn add_keywords_appends_and_keeps_position() {
        let mut matcher = KeywordMatcher::new();
        matcher.add_keywords("pdf", ["acrobat"]);
        matcher.add_keywords("docx", ["word"]);
        matcher.add_keywords("pdf", vec![String::from("form")]);
        assert_eq!(matcher.keywords_for("pdf"), ["acrobat", "form"]);
        assert!(matcher.keywords_for("missing").is_empty());

        let candidates = vec![make_skill("docx", "w"), make_skill("pdf", "p")];
        let found = matcher
            .match_skill("word form", &candidates, &MockProvider::default())
            .unwrap();
        assert_eq!(found.map(Skill::name), Some("pdf"));
    }

    #[test]
    fn null_matcher_never_matches() {
        let candidates = skills();
        let mock = MockProvider::default();
        assert!(NullMatcher.match_skill("pdf", &candidates, &mock).unwrap().is_none());
        assert_eq!(mock.call_count(), 0);
    }
}
