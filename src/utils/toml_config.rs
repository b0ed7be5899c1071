//! TOML-based configuration for Lore
//!
//! Every setting lives in a single TOML file (`lore.toml` by default). Every
//! field has a default, so a partial file or no file at all yields a working
//! configuration backed by a local Ollama model.
//!
//! # Hot Reloading
//!
//! [`ConfigManager`] hands out lock-free snapshots and can watch the file for
//! changes. A reload that fails to parse or validate keeps the previous config.

use arc_swap::ArcSwap;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Root configuration structure loaded from lore.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoreConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    /// Encyclopedia used for source retrieval
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    #[serde(default)]
    pub research: ResearchConfig,

    /// Context reduction limits, measured in characters
    #[serde(default)]
    pub context: ContextConfig,

    #[serde(default)]
    pub jobs: JobsConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// `text` or `json`
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Largest accepted submission body (prompt, image and context together)
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

// ============= LLM Configuration =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
        #[serde(default = "default_ollama_model")]
        model: String,
    },
    OpenAI {
        /// Environment variable containing API key
        api_key_env: String,
        #[serde(default = "default_openai_base")]
        api_base: String,
        model: String,
    },
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llava".to_string()
}

fn default_openai_base() -> String {
    "https://api.openai.com/v1".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::Ollama {
            base_url: default_ollama_url(),
            model: default_ollama_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_topic_max_tokens")]
    pub topic_max_tokens: u32,

    #[serde(default = "default_summary_max_tokens")]
    pub summary_max_tokens: u32,

    #[serde(default = "default_synthesis_max_tokens")]
    pub synthesis_max_tokens: u32,
}

fn default_request_timeout() -> u64 {
    120
}

fn default_topic_max_tokens() -> u32 {
    50
}

fn default_summary_max_tokens() -> u32 {
    1000
}

fn default_synthesis_max_tokens() -> u32 {
    4000
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            request_timeout_secs: default_request_timeout(),
            topic_max_tokens: default_topic_max_tokens(),
            summary_max_tokens: default_summary_max_tokens(),
            synthesis_max_tokens: default_synthesis_max_tokens(),
        }
    }
}

impl LlmConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// ============= Knowledge Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// MediaWiki API endpoint
    #[serde(default = "default_knowledge_api")]
    pub api_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_knowledge_timeout")]
    pub timeout_secs: u64,

    /// Sentences kept from each article introduction
    #[serde(default = "default_summary_sentences")]
    pub summary_sentences: u32,
}

fn default_knowledge_api() -> String {
    "https://en.wikipedia.org/w/api.php".to_string()
}

fn default_user_agent() -> String {
    format!("lore-server/{}", env!("CARGO_PKG_VERSION"))
}

fn default_knowledge_timeout() -> u64 {
    30
}

fn default_summary_sentences() -> u32 {
    5
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            api_url: default_knowledge_api(),
            user_agent: default_user_agent(),
            timeout_secs: default_knowledge_timeout(),
            summary_sentences: default_summary_sentences(),
        }
    }
}

// ============= Research Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// Titles requested from the knowledge search
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    /// Titles actually fetched and used as sources
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Summary length recorded per call in sources.json
    #[serde(default = "default_trace_summary_chars")]
    pub trace_summary_chars: usize,
}

fn default_search_limit() -> usize {
    5
}

fn default_top_k() -> usize {
    3
}

fn default_trace_summary_chars() -> usize {
    500
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            search_limit: default_search_limit(),
            top_k: default_top_k(),
            trace_summary_chars: default_trace_summary_chars(),
        }
    }
}

// ============= Context Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Context longer than this is reduced
    #[serde(default = "default_threshold")]
    pub threshold: usize,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// How far back from a chunk's end to look for a natural boundary
    #[serde(default = "default_lookback")]
    pub lookback: usize,
}

fn default_threshold() -> usize {
    15_000
}

fn default_chunk_size() -> usize {
    12_000
}

fn default_lookback() -> usize {
    2_000
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            chunk_size: default_chunk_size(),
            lookback: default_lookback(),
        }
    }
}

// ============= Jobs Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default = "default_job_timeout")]
    pub job_timeout_secs: u64,
}

fn default_workers() -> usize {
    2
}

fn default_job_timeout() -> u64 {
    600
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            job_timeout_secs: default_job_timeout(),
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),

    #[error("Watch error: {0}")]
    WatchError(#[from] notify::Error),
}

impl LoreConfig {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Like [`LoreConfig::load`], but a missing file yields the defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            warn!("No configuration file at {:?}, using defaults", path);
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }

        Self::load(path)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: LoreConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate limits for internal consistency and env var availability
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.server.log_format.as_str(), "text" | "json") {
            return Err(ConfigError::ValidationError(format!(
                "server.log_format must be 'text' or 'json', got '{}'",
                self.server.log_format
            )));
        }

        if self.server.max_upload_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "server.max_upload_bytes must be greater than zero".into(),
            ));
        }

        if let ProviderConfig::OpenAI { api_key_env, .. } = &self.llm.provider {
            self.validate_env_var(api_key_env)?;
        }

        if self.context.threshold == 0 || self.context.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "context.threshold and context.chunk_size must be greater than zero".into(),
            ));
        }

        if self.context.lookback >= self.context.chunk_size {
            return Err(ConfigError::ValidationError(format!(
                "context.lookback ({}) must be smaller than context.chunk_size ({})",
                self.context.lookback, self.context.chunk_size
            )));
        }

        if self.research.search_limit == 0 {
            return Err(ConfigError::ValidationError(
                "research.search_limit must be greater than zero".into(),
            ));
        }

        if self.research.top_k > self.research.search_limit {
            return Err(ConfigError::ValidationError(format!(
                "research.top_k ({}) cannot exceed research.search_limit ({})",
                self.research.top_k, self.research.search_limit
            )));
        }

        if self.jobs.workers == 0 {
            return Err(ConfigError::ValidationError(
                "jobs.workers must be greater than zero".into(),
            ));
        }

        if self.jobs.job_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "jobs.job_timeout_secs must be greater than zero".into(),
            ));
        }

        Ok(())
    }

    fn validate_env_var(&self, name: &str) -> Result<(), ConfigError> {
        std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))?;
        Ok(())
    }
}

// ============= Hot Reloading =============

/// Thread-safe access to the current configuration, with optional file watching
pub struct ConfigManager {
    config: Arc<ArcSwap<LoreConfig>>,
    config_path: PathBuf,
    watcher: RwLock<Option<RecommendedWatcher>>,
}

impl ConfigManager {
    /// Load the initial config; a missing file means defaults
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        // Absolute path for reliable file watching
        let path = path.as_ref();
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(ConfigError::ReadError)?
                .join(path)
        };

        let config = LoreConfig::load_or_default(&path)?;

        Ok(Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: path,
            watcher: RwLock::new(None),
        })
    }

    /// Wrap an in-memory config. Reloading and watching are not meaningful.
    pub fn from_config(config: LoreConfig) -> Self {
        Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: PathBuf::from("lore.toml"),
            watcher: RwLock::new(None),
        }
    }

    /// Get the current configuration (lockless read)
    pub fn config(&self) -> Arc<LoreConfig> {
        self.config.load_full()
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Manually reload the configuration from disk
    pub fn reload(&self) -> Result<(), ConfigError> {
        info!("Reloading configuration from {:?}", self.config_path);

        let new_config = LoreConfig::load(&self.config_path)?;
        self.config.store(Arc::new(new_config));

        info!("Configuration reloaded successfully");
        Ok(())
    }

    /// Watch the config file's directory and reload on change. Needs a tokio runtime.
    pub fn start_watching(&self) -> Result<(), ConfigError> {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();

        let config_path = self.config_path.clone();
        let file_name = config_path.file_name().map(|n| n.to_os_string());
        let config_arc = Arc::clone(&self.config);

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    let touches_config = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if touches_config && (event.kind.is_modify() || event.kind.is_create()) {
                        let _ = tx.send(());
                    }
                }
                Err(e) => {
                    error!("Config watcher error: {:?}", e);
                }
            }
        })?;

        if let Some(parent) = self.config_path.parent() {
            watcher.watch(parent, RecursiveMode::NonRecursive)?;
        }

        *self.watcher.write() = Some(watcher);

        tokio::spawn(async move {
            let debounce = Duration::from_millis(500);
            let mut last_reload: Option<std::time::Instant> = None;

            while rx.recv().await.is_some() {
                if last_reload.is_some_and(|at| at.elapsed() < debounce) {
                    continue;
                }

                // Let the writer finish
                tokio::time::sleep(Duration::from_millis(100)).await;

                match LoreConfig::load(&config_path) {
                    Ok(new_config) => {
                        config_arc.store(Arc::new(new_config));
                        info!("Configuration hot-reloaded successfully");
                        last_reload = Some(std::time::Instant::now());
                    }
                    Err(e) => {
                        warn!(
                            "Failed to hot-reload config: {}. Keeping previous config.",
                            e
                        );
                    }
                }
            }
        });

        info!("Configuration hot-reload watcher started");
        Ok(())
    }

    /// Stop watching for configuration changes
    pub fn stop_watching(&self) {
        *self.watcher.write() = None;
        info!("Configuration hot-reload watcher stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        let config = LoreConfig::parse("").unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.context.threshold, 15_000);
        assert_eq!(config.context.chunk_size, 12_000);
        assert_eq!(config.research.top_k, 3);
        assert_eq!(config.jobs.workers, 2);
        assert!(matches!(config.llm.provider, ProviderConfig::Ollama { .. }));
    }

    #[test]
    fn test_parse_partial_config() {
        let config = LoreConfig::parse(
            r#"
[server]
port = 8080
log_format = "json"

[llm.provider]
type = "ollama"
model = "llama3.2-vision"

[research]
search_limit = 8
top_k = 4

[context]
threshold = 4000
chunk_size = 3000
lookback = 500
"#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(
            config.llm.provider,
            ProviderConfig::Ollama {
                base_url: "http://localhost:11434".into(),
                model: "llama3.2-vision".into()
            }
        );
        assert_eq!(config.research.top_k, 4);
        assert_eq!(config.context.lookback, 500);
        assert_eq!(config.jobs.job_timeout_secs, 600);
    }

    #[test]
    fn test_lookback_must_fit_chunk() {
        let err = LoreConfig::parse("[context]\nchunk_size = 100\nlookback = 100\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_top_k_cannot_exceed_search_limit() {
        let err = LoreConfig::parse("[research]\nsearch_limit = 2\ntop_k = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(LoreConfig::parse("[jobs]\nworkers = 0\n").is_err());
    }

    #[test]
    fn test_zero_job_timeout_rejected() {
        let err = LoreConfig::parse("[jobs]\njob_timeout_secs = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(msg) if msg.contains("job_timeout_secs")));
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        assert!(LoreConfig::parse("[server]\nlog_format = \"xml\"\n").is_err());
    }

    #[test]
    fn test_openai_requires_key_env() {
        let err = LoreConfig::parse(
            r#"
[llm.provider]
type = "openai"
api_key_env = "LORE_TEST_KEY_THAT_IS_NEVER_SET"
model = "gpt-4o-mini"
"#,
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::MissingEnvVar(name) if name == "LORE_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        assert!(matches!(
            LoreConfig::parse("[server\nport = 1"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        assert!(matches!(LoreConfig::load(&path), Err(ConfigError::FileNotFound(_))));
        assert_eq!(LoreConfig::load_or_default(&path).unwrap().server.port, 3000);
    }

    #[test]
    fn test_manager_reload_keeps_previous_on_error() {
        let file = write_config("[server]\nport = 4000\n");
        let manager = ConfigManager::new(file.path()).unwrap();
        assert_eq!(manager.config().server.port, 4000);

        fs::write(file.path(), "[server]\nport = 4001\n").unwrap();
        manager.reload().unwrap();
        assert_eq!(manager.config().server.port, 4001);

        fs::write(file.path(), "[jobs]\nworkers = 0\n").unwrap();
        assert!(manager.reload().is_err());
        assert_eq!(manager.config().server.port, 4001);
    }

    #[test]
    fn test_snapshot_survives_reload() {
        let file = write_config("[research]\ntop_k = 2\n");
        let manager = ConfigManager::new(file.path()).unwrap();
        let snapshot = manager.config();

        fs::write(file.path(), "[research]\ntop_k = 1\n").unwrap();
        manager.reload().unwrap();

        assert_eq!(snapshot.research.top_k, 2);
        assert_eq!(manager.config().research.top_k, 1);
    }

    #[test]
    fn test_from_config() {
        let manager = ConfigManager::from_config(LoreConfig::default());
        assert_eq!(manager.config().knowledge.summary_sentences, 5);
    }
}
