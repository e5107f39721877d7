use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GapscoutError, Result};

/// Top-level Gapscout configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub model: ModelConfig,
    #[serde(default)]
    pub search: Option<SearchConfig>,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Reasoner model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    pub model_id: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_provider() -> String {
    "groq".to_string()
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_temperature() -> f32 {
    0.2
}

/// Web search backend configuration (Google Programmable Search).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub api_key: String,
    /// Programmable Search Engine id (the `cx` parameter).
    pub engine_id: String,
    #[serde(default = "default_search_results")]
    pub max_results: usize,
}

fn default_search_results() -> usize {
    5
}

/// Workflow engine limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Hard cap on executor steps per run. A wiring bug becomes a fatal
    /// error instead of an unbounded loop.
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    /// Parse loosely-formatted decomposer output when structured output
    /// fails. Off by default so its use is visible.
    #[serde(default)]
    pub best_effort_parse: bool,
}

fn default_max_steps() -> usize {
    64
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            best_effort_parse: false,
        }
    }
}

impl AppConfig {
    /// Load config from a TOML file, with env var expansion.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(GapscoutError::ConfigNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        let expanded = expand_env_vars(&content);
        toml::from_str(&expanded).map_err(|e| GapscoutError::Config(e.to_string()))
    }
}

/// Expand `${VAR}` references from the environment. Unset vars are kept
/// verbatim so the resulting parse error names the missing reference.
fn expand_env_vars(input: &str) -> String {
    let re = regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static regex");
    re.replace_all(input, |caps: &regex::Captures<'_>| {
        match std::env::var(&caps[1]) {
            Ok(val) => val,
            Err(_) => caps[0].to_string(),
        }
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_env_vars() {
        std::env::set_var("TEST_GAPSCOUT_VAR", "hello");
        let result = expand_env_vars("key = \"${TEST_GAPSCOUT_VAR}\"");
        assert_eq!(result, "key = \"hello\"");
        std::env::remove_var("TEST_GAPSCOUT_VAR");
    }

    #[test]
    fn test_expand_env_vars_missing() {
        let result = expand_env_vars("key = \"${NONEXISTENT_GAPSCOUT_VAR}\"");
        assert_eq!(result, "key = \"${NONEXISTENT_GAPSCOUT_VAR}\"");
    }

    #[test]
    fn test_engine_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
[model]
model_id = "llama-3.3-70b-versatile"
"#,
        )
        .unwrap();
        assert_eq!(cfg.model.provider, "groq");
        assert_eq!(cfg.engine.max_steps, 64);
        assert!(!cfg.engine.best_effort_parse);
        assert!(cfg.search.is_none());
    }
}
