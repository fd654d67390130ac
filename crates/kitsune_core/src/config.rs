use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::classifier::ClassifierConfig;
use crate::curve::{ProgressionTable, DEFAULT_TAIL_THRESHOLDS};

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KitsuneConfig {
    pub llm: LlmConfig,
    pub storage: StorageConfig,
    pub progression: ProgressionConfig,
    pub classifier: ClassifierConfig,
}

impl KitsuneConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: KitsuneConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if the file is missing, return defaults with env overrides.
    /// A file that exists but does not parse is still an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if !path.as_ref().exists() {
            tracing::info!(
                "Config file {} not found, using defaults",
                path.as_ref().display()
            );
            let mut cfg = Self::default();
            cfg.apply_env_overrides();
            return Ok(cfg);
        }
        Self::load(path)
    }

    /// Apply environment variable overrides on top of file-based config.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("KITSUNE_LLM_PROVIDER") {
            self.llm.provider = v;
        }
        if let Ok(v) = std::env::var("KITSUNE_LLM_ENDPOINT") {
            self.llm.endpoint = v;
        }
        if let Ok(v) = std::env::var("KITSUNE_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("KITSUNE_LLM_TIMEOUT_SECS") {
            if let Ok(n) = v.parse() {
                self.llm.timeout_secs = n;
            }
        }
        if let Ok(v) = std::env::var("KITSUNE_SAVE_PATH") {
            self.storage.save_path = PathBuf::from(v);
        }
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// `kitsune` (plain /chat server), `ollama`, `openai` or `mock`.
    pub provider: String,
    pub endpoint: String,
    pub model: String,
    /// Whole-turn budget for the model call, retries included.
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f32,
    pub system_prompt: String,
    /// Prior messages sent along with each new one.
    pub max_history_messages: usize,
    pub retry: RetrySettings,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "kitsune".to_string(),
            endpoint: "http://localhost:8000".to_string(),
            model: "llama3".to_string(),
            timeout_secs: 150,
            max_tokens: 500,
            temperature: 0.7,
            system_prompt: "You are Kitsune, a playful and curious fox spirit who grows wiser \
                            with every conversation. Keep replies warm and concise."
                .to_string(),
            max_history_messages: 20,
            retry: RetrySettings::default(),
        }
    }
}

/// `[llm.retry]`: backoff for transient model-server failures (408, 429, 5xx,
/// network errors). Other statuses fail on the first attempt.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Attempts including the first; 0 is treated as 1.
    pub attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_factor: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            attempts: 3,
            initial_delay_ms: 500,
            max_delay_ms: 8_000,
            backoff_factor: 2.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub save_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            save_path: base.join("kitsune").join("kitsune_progress.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    /// Experience required per level, starting with level 1 at 0.
    /// Unset means the RuneScape curve.
    pub level_thresholds: Option<Vec<u64>>,
    /// Total levels for tail stages 2 through 9.
    pub tail_thresholds: Vec<u32>,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            level_thresholds: None,
            tail_thresholds: DEFAULT_TAIL_THRESHOLDS.to_vec(),
        }
    }
}

impl ProgressionConfig {
    /// Validate and build the shared lookup table.
    pub fn build_table(&self) -> crate::error::Result<Arc<ProgressionTable>> {
        let levels = match &self.level_thresholds {
            Some(levels) => levels.clone(),
            None => ProgressionTable::runescape().level_thresholds().to_vec(),
        };
        Ok(Arc::new(ProgressionTable::new(
            levels,
            self.tail_thresholds.clone(),
        )?))
    }
}

// ============================================================================
// Tests
// ============================================================================
