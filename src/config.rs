use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use docent_core::analyzer::Analyzer;
use docent_core::chunk::ChunkConfig;
use docent_core::ingest::{PipelineConfig, DEFAULT_MIN_CHARS};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub chunking: ChunkConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_min_chars")]
    pub min_chars: usize,
    #[serde(flatten)]
    pub analyzer: Analyzer,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            min_chars: default_min_chars(),
            analyzer: Analyzer::default(),
        }
    }
}

fn default_top_k() -> usize {
    3
}
fn default_min_chars() -> usize {
    DEFAULT_MIN_CHARS
}

/// Remote chat-completion endpoint settings.
///
/// The API key is optional here; [`ChatConfig::resolve_api_key`] is only
/// called when a client is constructed, so commands that never talk to the
/// model work without one.
#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.z.ai/paas/v4/chat/completions".to_string()
}
fn default_model() -> String {
    "glm-4.5".to_string()
}
fn default_api_key_env() -> String {
    "DOCENT_API_KEY".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_tokens() -> u32 {
    512
}
fn default_temperature() -> f32 {
    0.2
}
fn default_max_retries() -> u32 {
    2
}

impl ChatConfig {
    /// Inline `api_key` first, then the `api_key_env` environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AssistantConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub webinar_link: Option<String>,
    /// Replaces the generated system prompt entirely when set.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            owner_name: None,
            webinar_link: None,
            system_prompt: None,
        }
    }
}

fn default_app_name() -> String {
    "Docent Assistant".to_string()
}

impl AssistantConfig {
    pub fn system_prompt(&self) -> String {
        if let Some(prompt) = &self.system_prompt {
            return prompt.clone();
        }

        let mut prompt = format!(
            "You are a friendly, helpful assistant for {}. \
             Answer conversationally and resolve the user's doubts. \
             Use the provided document excerpts when available and always be honest; \
             if the excerpts do not contain the answer, say so.",
            self.app_name
        );
        if let Some(owner) = &self.owner_name {
            prompt.push_str(&format!(" The assistant is operated by {}.", owner));
        }
        if let Some(link) = &self.webinar_link {
            prompt.push_str(&format!(
                " If the user asks for pricing or a link, provide: {} .",
                link
            ));
        }
        prompt.push_str(" Keep responses concise (~120-200 words) and clearly explain next steps.");
        prompt
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    #[serde(default = "default_pbkdf2_iterations")]
    pub pbkdf2_iterations: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            pbkdf2_iterations: default_pbkdf2_iterations(),
        }
    }
}

fn default_pbkdf2_iterations() -> u32 {
    crate::accounts::DEFAULT_ITERATIONS
}

impl Config {
    /// Defaults with an in-directory database, for commands run without a
    /// config file.
    pub fn minimal() -> Self {
        Self {
            db: DbConfig {
                path: PathBuf::from("./data/docent.sqlite"),
            },
            chunking: ChunkConfig::default(),
            retrieval: RetrievalConfig::default(),
            chat: ChatConfig::default(),
            assistant: AssistantConfig::default(),
            auth: AuthConfig::default(),
        }
    }

    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            chunking: self.chunking,
            analyzer: self.retrieval.analyzer,
            min_chars: self.retrieval.min_chars,
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.retrieval.top_k == 0 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }

    if !(0.0..=2.0).contains(&config.chat.temperature) {
        anyhow::bail!("chat.temperature must be in [0.0, 2.0]");
    }

    if config.chat.max_tokens == 0 {
        anyhow::bail!("chat.max_tokens must be > 0");
    }

    if config.chat.timeout_secs == 0 {
        anyhow::bail!("chat.timeout_secs must be > 0");
    }

    if config.auth.pbkdf2_iterations == 0 {
        anyhow::bail!("auth.pbkdf2_iterations must be > 0");
    }

    if !config.chat.base_url.starts_with("http://") && !config.chat.base_url.starts_with("https://")
    {
        anyhow::bail!(
            "chat.base_url must be an http(s) URL, got '{}'",
            config.chat.base_url
        );
    }

    Ok(config)
}
