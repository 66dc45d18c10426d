//! Configuration loading, validation, and management for VaxChecker.
//!
//! Loads configuration from `~/.vaxchecker/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.vaxchecker/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Bearer token for the model and knowledge-base endpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Cloud region the endpoints live in
    #[serde(default = "default_region")]
    pub region: String,

    /// Knowledge base used for retrieval
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_base_id: Option<String>,

    /// Foundation model ARN used for generation and complexity disambiguation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_arn: Option<String>,

    /// Complexity classifier settings
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Tag classifier and question record settings
    #[serde(default)]
    pub tagging: TaggingConfig,

    /// Retrieval-and-generation settings
    #[serde(default)]
    pub rag: RagConfig,

    /// Conversation context limits
    #[serde(default)]
    pub context: ContextConfig,

    /// Endpoint overrides
    #[serde(default)]
    pub endpoints: EndpointConfig,

    /// Static source URI → URL table
    #[serde(default)]
    pub source_urls: HashMap<String, String>,
}

fn default_region() -> String {
    "us-east-1".into()
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("region", &self.region)
            .field("knowledge_base_id", &self.knowledge_base_id)
            .field("model_arn", &self.model_arn)
            .field("classifier", &self.classifier)
            .field("tagging", &self.tagging)
            .field("rag", &self.rag)
            .field("context", &self.context)
            .field("endpoints", &self.endpoints)
            .field("source_urls", &self.source_urls)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Model for disambiguation; falls back to `model_arn` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,

    #[serde(default)]
    pub temperature: f32,

    #[serde(default = "default_classifier_max_tokens")]
    pub max_tokens: u32,
}

fn default_classifier_max_tokens() -> u32 {
    200
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_id: None,
            temperature: 0.0,
            max_tokens: default_classifier_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggingConfig {
    #[serde(default = "default_tag_model")]
    pub model_id: String,

    #[serde(default = "default_tag_max_tokens")]
    pub max_tokens: u32,

    /// "memory", "sqlite" or "none"
    #[serde(default = "default_record_backend")]
    pub record_backend: String,

    #[serde(default = "default_database_path")]
    pub database_path: String,
}

fn default_tag_model() -> String {
    "anthropic.claude-3-haiku-20240307-v1:0".into()
}
fn default_tag_max_tokens() -> u32 {
    1000
}
fn default_record_backend() -> String {
    "sqlite".into()
}
fn default_database_path() -> String {
    AppConfig::config_dir()
        .join("questions.db")
        .to_string_lossy()
        .into_owned()
}

impl Default for TaggingConfig {
    fn default() -> Self {
        Self {
            model_id: default_tag_model(),
            max_tokens: default_tag_max_tokens(),
            record_backend: default_record_backend(),
            database_path: default_database_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Passages to retrieve per question
    #[serde(default = "default_num_results")]
    pub num_results: u32,

    #[serde(default = "default_rag_temperature")]
    pub temperature: f32,

    #[serde(default = "default_rag_max_tokens")]
    pub max_tokens: u32,

    /// Replace the built-in generation prompt template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_template: Option<String>,
}

fn default_num_results() -> u32 {
    3
}
fn default_rag_temperature() -> f32 {
    0.9
}
fn default_rag_max_tokens() -> u32 {
    1000
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            num_results: default_num_results(),
            temperature: default_rag_temperature(),
            max_tokens: default_rag_max_tokens(),
            prompt_template: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,

    #[serde(default = "default_max_idle_seconds")]
    pub max_idle_seconds: u64,

    /// Where session history lives between runs: "memory" or "sqlite"
    #[serde(default = "default_context_store")]
    pub store: String,

    #[serde(default = "default_database_path")]
    pub database_path: String,
}

fn default_max_turns() -> usize {
    5
}
fn default_max_idle_seconds() -> u64 {
    300
}
fn default_context_store() -> String {
    "sqlite".into()
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            max_idle_seconds: default_max_idle_seconds(),
            store: default_context_store(),
            database_path: default_database_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Model runtime base URL (default: regional bedrock-runtime)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_url: Option<String>,

    /// Knowledge-base runtime base URL (default: regional bedrock-agent-runtime)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_runtime_url: Option<String>,

    /// Path-style S3 endpoint for unsigned `?tagging` reads; unset disables tag-based URL resolution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagging_url: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            runtime_url: None,
            agent_runtime_url: None,
            tagging_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Identifiers the retrieval pipeline cannot run without.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RagIdentifiers {
    pub knowledge_base_id: String,
    pub model_arn: String,
}

impl AppConfig {
    /// Load configuration from the default path (~/.vaxchecker/config.toml).
    ///
    /// Environment variables override file values:
    /// - `KNOWLEDGE_BASE_ID`, `FM_ARN`, `AWS_REGION`
    /// - `VAXCHECKER_API_KEY` (highest priority), then `AWS_BEARER_TOKEN_BEDROCK`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through a lookup function.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(kb) = non_empty("KNOWLEDGE_BASE_ID") {
            self.knowledge_base_id = Some(kb);
        }
        if let Some(arn) = non_empty("FM_ARN") {
            self.model_arn = Some(arn);
        }
        if let Some(region) = non_empty("AWS_REGION") {
            self.region = region;
        }
        if let Some(key) =
            non_empty("VAXCHECKER_API_KEY").or_else(|| non_empty("AWS_BEARER_TOKEN_BEDROCK"))
        {
            self.api_key = Some(key);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".vaxchecker")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, t) in [
            ("classifier.temperature", self.classifier.temperature),
            ("rag.temperature", self.rag.temperature),
        ] {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be between 0.0 and 2.0"
                )));
            }
        }

        if self.rag.num_results == 0 {
            return Err(ConfigError::ValidationError(
                "rag.num_results must be at least 1".into(),
            ));
        }

        if self.context.max_turns == 0 {
            return Err(ConfigError::ValidationError(
                "context.max_turns must be at least 1".into(),
            ));
        }

        match self.tagging.record_backend.as_str() {
            "memory" | "sqlite" | "none" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "tagging.record_backend must be memory, sqlite or none (got '{other}')"
                )));
            }
        }

        match self.context.store.as_str() {
            "memory" | "sqlite" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "context.store must be memory or sqlite (got '{other}')"
                )));
            }
        }

        Ok(())
    }

    /// The knowledge base id and model ARN, or a validation error naming the missing one.
    pub fn require_rag(&self) -> Result<RagIdentifiers, ConfigError> {
        let knowledge_base_id = self
            .knowledge_base_id
            .clone()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                ConfigError::ValidationError(
                    "knowledge_base_id is not set (config file or KNOWLEDGE_BASE_ID)".into(),
                )
            })?;
        let model_arn = self
            .model_arn
            .clone()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                ConfigError::ValidationError("model_arn is not set (config file or FM_ARN)".into())
            })?;
        Ok(RagIdentifiers {
            knowledge_base_id,
            model_arn,
        })
    }

    /// Model used for complexity disambiguation.
    pub fn classifier_model(&self) -> Option<&str> {
        self.classifier
            .model_id
            .as_deref()
            .or(self.model_arn.as_deref())
    }

    /// Model runtime base URL.
    pub fn runtime_url(&self) -> String {
        self.endpoints
            .runtime_url
            .clone()
            .unwrap_or_else(|| format!("https://bedrock-runtime.{}.amazonaws.com", self.region))
    }

    /// Knowledge-base runtime base URL.
    pub fn agent_runtime_url(&self) -> String {
        self.endpoints.agent_runtime_url.clone().unwrap_or_else(|| {
            format!("https://bedrock-agent-runtime.{}.amazonaws.com", self.region)
        })
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            region: default_region(),
            knowledge_base_id: None,
            model_arn: None,
            classifier: ClassifierConfig::default(),
            tagging: TaggingConfig::default(),
            rag: RagConfig::default(),
            context: ContextConfig::default(),
            endpoints: EndpointConfig::default(),
            source_urls: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for vaxchecker_core::Error {
    fn from(err: ConfigError) -> Self {
        vaxchecker_core::Error::config(err.to_string())
    }
}
