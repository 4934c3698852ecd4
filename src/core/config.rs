//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.heel/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::inference::providers::{DEFAULT_BASE_URL, DEFAULT_REFERER, DEFAULT_TITLE};
use crate::inference::{
    DEFAULT_GREETING, DEFAULT_RETRIES, DEFAULT_TEMPERATURE, MAX_RETRIES, MIN_RETRIES,
    types::clamp_temperature,
};

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct HeelConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub openrouter: OpenRouterConfig,
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_retries: Option<u8>,
    pub system_prompt: Option<String>,
    pub system_prompt_file: Option<String>,
    pub greeting: Option<String>,
}

#[derive(Default, Deserialize, Serialize)]
pub struct OpenRouterConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub referer: Option<String>,
    pub title: Option<String>,
}

impl fmt::Debug for OpenRouterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenRouterConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("referer", &self.referer)
            .field("title", &self.title)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ModelEntry {
    pub name: String,
    pub description: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

/// Persona instruction sent ahead of every request. `{date}` is filled in per request.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a certified dog trainer with 20+ years experience. STRICT RULES:
1. Respond in clear, structured plain text
2. Format all training plans as:
🌟 Goal: [Training objective]

📘 Method:
Step 1: [Action title]
- Action 1
- Action 2
💡 Pro Tip: [Helpful advice]

⚠️ Safety Notice: [Important warning]

3. Use emojis: 🐾 🐶 💡 ⚠️ 🎯
4. Never use markdown
5. Current date: {date}
6. Maintain supportive, professional tone";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Clone)]
pub struct ResolvedConfig {
    pub model: String,
    pub temperature: f32,
    pub max_retries: u8,
    pub system_prompt: String,
    pub greeting: String,
    pub api_key: Option<String>,
    pub base_url: String,
    pub referer: String,
    pub title: String,
    pub models: Vec<ModelEntry>,
}

impl fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_retries", &self.max_retries)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("models", &self.models.len())
            .finish_non_exhaustive()
    }
}

/// Overrides taken from command-line flags. `None` means not given.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_retries: Option<u8>,
}

/// Environment variables the resolver looks at, captured up front.
#[derive(Default, Clone)]
pub struct EnvOverrides {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            api_key: var("OPENROUTER_API_KEY"),
            base_url: var("OPENROUTER_BASE_URL"),
            model: var("HEEL_MODEL"),
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns `~/.heel`.
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".heel"))
}

/// Returns the path to `~/.heel/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load config from `~/.heel/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `HeelConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<HeelConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(HeelConfig::default());
        }
    };
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<HeelConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(HeelConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: HeelConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

const DEFAULT_CONFIG_FILE: &str = r#"# Heel Configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# model = "openai/gpt-4o-mini"       # Or set HEEL_MODEL
# temperature = 0.5                  # 0.0 (factual) to 1.0 (creative)
# max_retries = 2                    # 1 to 5 attempts on unreadable replies
# system_prompt = "You are a certified dog trainer..."   # {date} is filled in
# system_prompt_file = "trainer.md"  # Path relative to ~/.heel/
# greeting = "Hello! 🐶 I'm your Dog Training Expert."

# [openrouter]
# api_key = "sk-or-..."              # Or set OPENROUTER_API_KEY env var
# base_url = "https://openrouter.ai/api/v1"
# referer = "https://github.com/heel-rs/heel"
# title = "AI Dog Trainer"

# [[models]]
# name = "openai/gpt-4o-mini"
# description = "Fast and inexpensive"

# [[models]]
# name = "anthropic/claude-3.5-haiku"
# description = "Warm, concise answers"
"#;

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, DEFAULT_CONFIG_FILE) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &HeelConfig, env: &EnvOverrides, cli: &CliOverrides) -> ResolvedConfig {
    // Model: CLI → env → config → default
    let model = cli
        .model
        .clone()
        .or_else(|| env.model.clone())
        .or_else(|| config.general.model.clone())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let temperature = clamp_temperature(
        cli.temperature
            .or(config.general.temperature)
            .unwrap_or(DEFAULT_TEMPERATURE),
    );

    let max_retries = cli
        .max_retries
        .or(config.general.max_retries)
        .unwrap_or(DEFAULT_RETRIES)
        .clamp(MIN_RETRIES, MAX_RETRIES);

    // API key: env → config
    let api_key = env
        .api_key
        .clone()
        .or_else(|| config.openrouter.api_key.clone())
        .filter(|k| !k.trim().is_empty());

    // Base URL: env → config → default
    let base_url = env
        .base_url
        .clone()
        .or_else(|| config.openrouter.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let mut models = config.models.clone();
    if !models.iter().any(|m| m.name == model) {
        models.insert(
            0,
            ModelEntry {
                name: model.clone(),
                description: None,
            },
        );
    }

    ResolvedConfig {
        model,
        temperature,
        max_retries,
        system_prompt: resolve_system_prompt(config, config_dir().as_deref()),
        greeting: config
            .general
            .greeting
            .clone()
            .unwrap_or_else(|| DEFAULT_GREETING.to_string()),
        api_key,
        base_url,
        referer: config
            .openrouter
            .referer
            .clone()
            .unwrap_or_else(|| DEFAULT_REFERER.to_string()),
        title: config
            .openrouter
            .title
            .clone()
            .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        models,
    }
}

/// Resolves the system prompt: inline wins over file, both win over default.
fn resolve_system_prompt(config: &HeelConfig, base_dir: Option<&Path>) -> String {
    // Inline system_prompt takes priority
    if let Some(ref prompt) = config.general.system_prompt {
        return prompt.clone();
    }

    // Try loading from system_prompt_file (relative to ~/.heel/)
    if let Some(ref file) = config.general.system_prompt_file
        && let Some(dir) = base_dir
    {
        let prompt_path = dir.join(file);
        match fs::read_to_string(&prompt_path) {
            Ok(contents) => {
                let trimmed = contents.trim().to_string();
                if !trimmed.is_empty() {
                    info!("Loaded system prompt from {}", prompt_path.display());
                    return trimmed;
                }
                warn!("System prompt file is empty: {}", prompt_path.display());
            }
            Err(e) => {
                warn!(
                    "Failed to read system prompt file {}: {}",
                    prompt_path.display(),
                    e
                );
            }
        }
    }

    DEFAULT_SYSTEM_PROMPT.to_string()
}
