use combot_ml::{MlSettings, DEFAULT_RETURN_CONFIDENCE, DEFAULT_RETURN_KEYWORDS};
use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub mongodb: MongoDbConfig,
    pub llm: LlmConfig,
    pub ml: MlConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub openai_api_key: String,
    #[serde(default)]
    pub mongodb_uri: Option<String>,
    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default)]
    pub hf_api_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoDbConfig {
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MlConfig {
    /// Base URL of the text-classification inference service
    pub endpoint: String,
    pub model_name: String,
    pub max_models: usize,
    pub max_concurrent: usize,
    pub queue_timeout_secs: u64,
    pub results_ttl_secs: u64,
    pub model_max_age_secs: u64,
    pub cleanup_interval_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_return_keywords")]
    pub return_keywords: Vec<String>,
    #[serde(default = "default_return_confidence")]
    pub return_confidence: f32,
}

fn default_return_keywords() -> Vec<String> {
    DEFAULT_RETURN_KEYWORDS.iter().map(|k| k.to_string()).collect()
}

fn default_return_confidence() -> f32 {
    DEFAULT_RETURN_CONFIDENCE
}

impl From<&MlConfig> for MlSettings {
    fn from(config: &MlConfig) -> Self {
        Self {
            model_name: config.model_name.clone(),
            max_models: config.max_models,
            max_concurrent: config.max_concurrent,
            queue_timeout_secs: config.queue_timeout_secs,
            results_ttl_secs: config.results_ttl_secs,
            model_max_age_secs: config.model_max_age_secs,
            cleanup_interval_secs: config.cleanup_interval_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub ttl_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "sessionid".to_string(),
            ttl_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// Fraction of system memory above which caches are dropped
    pub cleanup_threshold: f64,
    /// Fraction above which chat turns are refused
    pub critical_threshold: f64,
    pub cleanup_cooldown_secs: u64,
    pub max_users_per_process: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            cleanup_threshold: 0.60,
            critical_threshold: 0.85,
            cleanup_cooldown_secs: 120,
            max_users_per_process: 200,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables prefixed with COMBOT_ (`COMBOT_SERVER__PORT=9000`)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("COMBOT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;

        let mut cfg: Config = config.try_deserialize()?;
        cfg.load_secrets()?;

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Secrets never live in TOML
    fn load_secrets(&mut self) -> Result<(), ConfigError> {
        self.openai_api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ConfigError::Message("OPENAI_API_KEY environment variable is required".to_string()))?;
        self.mongodb_uri = non_empty_env("MONGODB_URI");
        self.redis_url = non_empty_env("REDIS_URL");
        self.hf_api_token = non_empty_env("HF_API_TOKEN");
        Ok(())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
