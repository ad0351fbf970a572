//! Pipeline configuration
//!
//! Loaded from YAML (default `<config_dir>/clausewise/config.yaml`). Every
//! section and field has a default, so a partial file or no file at all
//! yields a usable configuration. Credentials may come from the environment
//! (`GEMINI_API_KEY`, `MOLEG_API_KEY`), which takes precedence over the file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const MOLEG_API_KEY_VAR: &str = "MOLEG_API_KEY";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Term dictionary provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TermsConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
    pub max_concurrency: usize,
}

impl Default for TermsConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://www.law.go.kr/DRF/lawService.do".to_string(),
            api_key: None,
            timeout_ms: 5_000,
            max_concurrency: 8,
        }
    }
}

impl TermsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// LLM provider and orchestration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    /// Bumped whenever the prompt template changes; part of the cache key
    pub prompt_version: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub max_repair_attempts: usize,
    pub max_requeries: u32,
    pub clauses_per_batch: usize,
    pub max_concurrency: usize,
    pub max_clause_chars: usize,
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key: None,
            model: "gemini-2.0-flash".to_string(),
            prompt_version: "v1".to_string(),
            timeout_secs: 60,
            max_retries: 3,
            backoff_base_ms: 500,
            max_repair_attempts: 4,
            max_requeries: 1,
            clauses_per_batch: 10,
            max_concurrency: 4,
            max_clause_chars: 1_500,
            max_output_tokens: 8_192,
            temperature: 0.2,
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Delay before retry number `attempt` (1-based): base * 2^(attempt-1)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(factor))
    }
}

/// Preprocessing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NlpConfig {
    /// Share of letters a script must exceed to name the language
    pub language_threshold: f64,
    pub max_term_candidates: usize,
}

impl Default for NlpConfig {
    fn default() -> Self {
        Self {
            language_threshold: 0.9,
            max_term_candidates: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub terms: TermsConfig,
    pub llm: LlmConfig,
    pub nlp: NlpConfig,
    pub cache: CacheConfig,
}

impl PipelineConfig {
    /// Parse a YAML document; environment overrides are not applied.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Load from `path`, or from the default location when `None`.
    ///
    /// A missing default file is not an error; a missing explicit file is.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::read(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::read(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overlay credentials from the environment. `lookup` is injected so
    /// tests need not touch process state.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v: &String| !v.trim().is_empty());
        if let Some(key) = non_empty(GEMINI_API_KEY_VAR) {
            self.llm.api_key = Some(key);
        }
        if let Some(key) = non_empty(MOLEG_API_KEY_VAR) {
            self.terms.api_key = Some(key);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.5..=1.0).contains(&self.nlp.language_threshold) {
            return Err(ConfigError::Invalid {
                field: "nlp.language_threshold",
                reason: format!("{} is outside 0.5..=1.0", self.nlp.language_threshold),
            });
        }
        let positive = [
            ("terms.max_concurrency", self.terms.max_concurrency),
            ("llm.max_concurrency", self.llm.max_concurrency),
            ("llm.clauses_per_batch", self.llm.clauses_per_batch),
            ("llm.max_clause_chars", self.llm.max_clause_chars),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// `<config_dir>/clausewise/config.yaml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("clausewise").join("config.yaml"))
}
