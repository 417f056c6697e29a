//! Configuration for newsgate.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (NEWSGATE_HOME, NEWSGATE_DB, NEWSGATE_BIND)
//! 2. Config file (.newsgate/config.yaml)
//! 3. Defaults (~/.newsgate)
//!
//! Config file discovery:
//! - Searches current directory and parents for .newsgate/config.yaml
//! - Relative paths in the config file resolve against the .newsgate/ directory
//!
//! API keys are never read from the config file, only from the environment
//! (OPENAI_API_KEY, GOOGLE_FACT_CHECK_API_KEY, NEWS_API_KEY).

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::adapters::{google_fact_check, news_api, openai};
use crate::core::{KeywordTable, PipelineSettings, SafetyLimits};

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub server: Option<ServerConfig>,
    #[serde(default)]
    pub generation: Option<GenerationConfig>,
    #[serde(default)]
    pub fact_check: Option<FactCheckConfig>,
    #[serde(default)]
    pub news: Option<NewsConfig>,
    #[serde(default)]
    pub safety: Option<SafetyLimits>,
    /// Replaces the built-in keyword table when present
    #[serde(default)]
    pub categories: Option<KeywordTable>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to .newsgate/)
    pub home: Option<String>,
    /// SQLite database file (relative to .newsgate/)
    pub database: Option<String>,
    /// Journal directory (relative to .newsgate/)
    pub journal: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub system_prompt: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FactCheckConfig {
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsConfig {
    pub enabled: Option<bool>,
    pub endpoint: Option<String>,
    pub page_size: Option<u32>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// State directory
    pub home: PathBuf,
    pub database: PathBuf,
    pub journal_dir: PathBuf,
    /// HTTP bind address
    pub bind: String,
    pub generation: GenerationSettings,
    pub fact_check_endpoint: String,
    pub news: NewsSettings,
    pub limits: SafetyLimits,
    pub keywords: KeywordTable,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub endpoint: String,
    pub model: String,
    pub system_prompt: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            endpoint: openai::DEFAULT_ENDPOINT.to_string(),
            model: openai::DEFAULT_MODEL.to_string(),
            system_prompt: openai::DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewsSettings {
    /// Corroboration also requires NEWS_API_KEY
    pub enabled: bool,
    pub endpoint: String,
    pub page_size: u32,
}

impl Default for NewsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: news_api::DEFAULT_ENDPOINT.to_string(),
            page_size: news_api::DEFAULT_PAGE_SIZE,
        }
    }
}

impl ResolvedConfig {
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            journal_dir: self.journal_dir.clone(),
            limits: self.limits.clone(),
            keywords: self.keywords.clone(),
        }
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".newsgate").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config directory
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Merge environment, config file and defaults
fn resolve<F>(config_file: Option<PathBuf>, file: ConfigFile, env: F) -> Result<ResolvedConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let config_dir = config_file
        .as_deref()
        .and_then(Path::parent)
        .map(Path::to_path_buf);
    let from_file = |value: &Option<String>| -> Option<PathBuf> {
        let dir = config_dir.as_deref()?;
        value.as_deref().map(|v| resolve_path(dir, v))
    };

    let home = match env("NEWSGATE_HOME") {
        Some(home) => PathBuf::from(home),
        None => match from_file(&file.paths.home) {
            Some(home) => home,
            None => dirs::home_dir()
                .context("Failed to determine home directory")?
                .join(".newsgate"),
        },
    };

    let database = env("NEWSGATE_DB")
        .map(PathBuf::from)
        .or_else(|| from_file(&file.paths.database))
        .unwrap_or_else(|| home.join("newsgate.db"));

    let journal_dir = from_file(&file.paths.journal).unwrap_or_else(|| home.join("journal"));

    let bind = env("NEWSGATE_BIND")
        .or_else(|| file.server.as_ref().and_then(|s| s.bind.clone()))
        .unwrap_or_else(|| DEFAULT_BIND.to_string());

    let mut generation = GenerationSettings::default();
    if let Some(g) = file.generation {
        generation.endpoint = g.endpoint.unwrap_or(generation.endpoint);
        generation.model = g.model.unwrap_or(generation.model);
        generation.system_prompt = g.system_prompt.unwrap_or(generation.system_prompt);
    }

    let fact_check_endpoint = file
        .fact_check
        .and_then(|f| f.endpoint)
        .unwrap_or_else(|| google_fact_check::DEFAULT_ENDPOINT.to_string());

    let mut news = NewsSettings::default();
    if let Some(n) = file.news {
        news.enabled = n.enabled.unwrap_or(news.enabled);
        news.endpoint = n.endpoint.unwrap_or(news.endpoint);
        news.page_size = n.page_size.unwrap_or(news.page_size);
    }

    Ok(ResolvedConfig {
        home,
        database,
        journal_dir,
        bind,
        generation,
        fact_check_endpoint,
        news,
        limits: file.safety.unwrap_or_default(),
        keywords: file.categories.unwrap_or_default(),
        config_file,
    })
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    match find_config_file() {
        Some(path) => load_config_from(&path),
        None => resolve(None, ConfigFile::default(), |key| std::env::var(key).ok()),
    }
}

/// Load configuration using a specific config file
pub fn load_config_from(path: &Path) -> Result<ResolvedConfig> {
    let file = load_config_file(path)?;
    resolve(Some(path.to_path_buf()), file, |key| std::env::var(key).ok())
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| format!("{:#}", e)));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}
