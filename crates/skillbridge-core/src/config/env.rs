use super::Config;

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_llm();
        self.apply_env_overrides_skills();
    }

    fn apply_env_overrides_llm(&mut self) {
        if let Ok(v) = std::env::var("SKILLBRIDGE_LLM_PROVIDER") {
            if let Ok(kind) = serde_json::from_value(serde_json::Value::String(v.clone())) {
                self.llm.provider = kind;
            } else {
                tracing::warn!("ignoring invalid SKILLBRIDGE_LLM_PROVIDER value: {v}");
            }
        }
        if let Ok(v) = std::env::var("SKILLBRIDGE_LLM_BASE_URL") {
            self.llm.base_url = Some(v);
        }
        if let Ok(v) = std::env::var("SKILLBRIDGE_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("SKILLBRIDGE_LLM_MAX_TOKENS") {
            if let Ok(tokens) = v.parse::<u32>() {
                self.llm.max_tokens = tokens;
            } else {
                tracing::warn!("ignoring invalid SKILLBRIDGE_LLM_MAX_TOKENS value: {v}");
            }
        }
        if let Ok(v) = std::env::var("SKILLBRIDGE_LLM_TEMPERATURE") {
            if let Ok(temperature) = v.parse::<f32>() {
                self.llm.temperature = Some(temperature);
            } else {
                tracing::warn!("ignoring invalid SKILLBRIDGE_LLM_TEMPERATURE value: {v}");
            }
        }
        if let Ok(v) = std::env::var("SKILLBRIDGE_LLM_TIMEOUT") {
            if let Ok(secs) = v.parse::<u64>() {
                self.llm.timeout_secs = secs;
            } else {
                tracing::warn!("ignoring invalid SKILLBRIDGE_LLM_TIMEOUT value: {v}");
            }
        }
    }

    fn apply_env_overrides_skills(&mut self) {
        if let Ok(v) = std::env::var("SKILLBRIDGE_SKILLS_PATHS") {
            self.skills.paths = v
                .split(',')
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(v) = std::env::var("SKILLBRIDGE_SKILLS_MATCHER") {
            if let Ok(kind) = serde_json::from_value(serde_json::Value::String(v.clone())) {
                self.skills.matcher = kind;
            } else {
                tracing::warn!("ignoring invalid SKILLBRIDGE_SKILLS_MATCHER value: {v}");
            }
        }
        if let Ok(v) = std::env::var("SKILLBRIDGE_SKILLS_INCLUDE_REFERENCES") {
            if let Ok(enabled) = v.parse::<bool>() {
                self.skills.include_references = enabled;
            } else {
                tracing::warn!(
                    "ignoring invalid SKILLBRIDGE_SKILLS_INCLUDE_REFERENCES value: {v}"
                );
            }
        }
    }
}
