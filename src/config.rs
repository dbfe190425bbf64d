//! Configuration file handling.
//!
//! This module handles loading `.interviewd.toml`, merging it with CLI
//! arguments and deriving the runtime settings of each component.

use crate::agent::{OrchestratorSettings, ServiceSettings};
use crate::llm::{OllamaConfig, RetryPolicy};
use crate::report::ReportFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Name of the config file looked up in the working directory.
pub const CONFIG_FILE: &str = ".interviewd.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub memory: MemoryConfig,

    #[serde(default)]
    pub interview: InterviewConfig,

    #[serde(default)]
    pub transcriber: TranscriberConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default report path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub format: ReportFormat,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
            format: ReportFormat::default(),
        }
    }
}

fn default_output() -> String {
    "interview_report.md".to_string()
}

/// LLM model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model")]
    pub name: String,

    /// Ollama API URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Temperature for question generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Temperature for analysis and report calls.
    #[serde(default = "default_structured_temperature")]
    pub structured_temperature: f32,

    #[serde(default = "default_question_max_tokens")]
    pub question_max_tokens: u32,

    #[serde(default = "default_analysis_max_tokens")]
    pub analysis_max_tokens: u32,

    #[serde(default = "default_report_max_tokens")]
    pub report_max_tokens: u32,

    /// Timeout of each call in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Retries on transport failure.
    #[serde(default = "default_retries")]
    pub retries: u32,

    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            base_url: default_base_url(),
            temperature: default_temperature(),
            structured_temperature: default_structured_temperature(),
            question_max_tokens: default_question_max_tokens(),
            analysis_max_tokens: default_analysis_max_tokens(),
            report_max_tokens: default_report_max_tokens(),
            timeout_seconds: default_timeout(),
            retries: default_retries(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

fn default_model() -> String {
    "llama3.2:latest".to_string()
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_structured_temperature() -> f32 {
    0.3
}

fn default_question_max_tokens() -> u32 {
    150
}

fn default_analysis_max_tokens() -> u32 {
    500
}

fn default_report_max_tokens() -> u32 {
    800
}

fn default_timeout() -> u64 {
    30
}

fn default_retries() -> u32 {
    2
}

fn default_backoff_ms() -> u64 {
    250
}

/// Interview memory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Facts retrieved per question.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default = "default_max_facts")]
    pub max_facts_per_session: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            top_k: default_top_k(),
            max_facts_per_session: default_max_facts(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_top_k() -> usize {
    3
}

fn default_max_facts() -> usize {
    500
}

/// Interview flow settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewConfig {
    #[serde(default = "default_role")]
    pub default_role: String,

    /// 1 to 5.
    #[serde(default = "default_difficulty")]
    pub initial_difficulty: u8,

    /// Transcriptions with fewer words are unclear.
    #[serde(default = "default_unclear_min_words")]
    pub unclear_min_words: usize,

    /// Answers with fewer non-whitespace characters are not analyzed.
    #[serde(default = "default_short_answer_chars")]
    pub short_answer_chars: usize,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            default_role: default_role(),
            initial_difficulty: default_difficulty(),
            unclear_min_words: default_unclear_min_words(),
            short_answer_chars: default_short_answer_chars(),
        }
    }
}

fn default_role() -> String {
    "Software Engineer".to_string()
}

fn default_difficulty() -> u8 {
    3
}

fn default_unclear_min_words() -> usize {
    2
}

fn default_short_answer_chars() -> usize {
    5
}

/// Speech transcription settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriberConfig {
    /// Service URL. Audio answers are disabled when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.interviewd.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(CONFIG_FILE);

        if path.exists() {
            Ok(Some(Self::load(&path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only values given on the command line override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref role) = args.role {
            self.interview.default_role = role.clone();
        }
        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if let Some(ref url) = args.llm_url {
            self.model.base_url = url.clone();
        }
        if let Some(temperature) = args.temperature {
            self.model.temperature = temperature;
        }
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
        }
        if let Some(difficulty) = args.difficulty {
            self.interview.initial_difficulty = difficulty;
        }
        if let Some(ref url) = args.transcriber_url {
            self.transcriber.url = Some(url.clone());
        }
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(format) = args.format {
            self.general.format = format;
        }

        if args.no_memory {
            self.memory.enabled = false;
        }
        if args.verbose {
            self.general.verbose = true;
        }
    }

    pub fn ollama_config(&self) -> OllamaConfig {
        OllamaConfig {
            base_url: self.model.base_url.clone(),
            model_name: self.model.name.clone(),
            timeout_seconds: self.model.timeout_seconds,
            retries: self.model.retries,
            backoff_ms: self.model.backoff_ms,
            structured_temperature: self.model.structured_temperature,
        }
    }

    /// Per-attempt deadline and retry schedule of every external call.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.model.retries,
            backoff_ms: self.model.backoff_ms,
            timeout: Duration::from_secs(self.model.timeout_seconds),
        }
    }

    /// Outer deadline of one external call, covering all of its retries.
    pub fn call_timeout(&self) -> Duration {
        self.retry_policy().total_budget()
    }

    pub fn orchestrator_settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            question_max_tokens: self.model.question_max_tokens,
            question_temperature: self.model.temperature,
            analysis_max_tokens: self.model.analysis_max_tokens,
            call_timeout: self.call_timeout(),
            memory_enabled: self.memory.enabled,
            memory_top_k: self.memory.top_k,
            short_answer_chars: self.interview.short_answer_chars,
            ..OrchestratorSettings::default()
        }
    }

    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            default_role: self.interview.default_role.clone(),
            initial_difficulty: self.interview.initial_difficulty.clamp(1, 5),
            unclear_min_words: self.interview.unclear_min_words,
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
