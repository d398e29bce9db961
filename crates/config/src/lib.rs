//! Configuration loading, validation, and management for Nexus.
//!
//! Loads configuration from `./nexus.toml` (optional) with environment
//! variable overrides. Validates all settings at startup so a missing
//! secret stops the process before any listener is bound.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default config file, resolved against the working directory.
pub const CONFIG_FILE: &str = "nexus.toml";

/// The root configuration structure.
///
/// Maps directly to `nexus.toml`. Every field has a default except the two
/// API keys, which normally come from the environment.
#[derive(Clone, Deserialize)]
pub struct AppConfig {
    /// Key for the Gemini chat-completions endpoint (`GOOGLE_API_KEY`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_api_key: Option<String>,

    /// Key for the Tavily search API (`TAVILY_API_KEY`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tavily_api_key: Option<String>,

    /// Chat model
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default)]
    pub temperature: f32,

    /// Max tokens per model response (provider default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Upper bound on Decision Node calls per request
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Base URL of the OpenAI-compatible chat-completions API
    #[serde(default = "default_provider_url")]
    pub provider_url: String,

    /// Base URL of the Tavily search API
    #[serde(default = "default_search_url")]
    pub search_url: String,

    /// Results returned per search call
    #[serde(default = "default_search_max_results")]
    pub search_max_results: u32,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,
}

fn default_model() -> String {
    "gemini-2.5-flash".into()
}
fn default_max_iterations() -> u32 {
    25
}
fn default_provider_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/openai".into()
}
fn default_search_url() -> String {
    "https://api.tavily.com".into()
}
fn default_search_max_results() -> u32 {
    3
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("google_api_key", &redact(&self.google_api_key))
            .field("tavily_api_key", &redact(&self.tavily_api_key))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_iterations", &self.max_iterations)
            .field("provider_url", &self.provider_url)
            .field("search_url", &self.search_url)
            .field("search_max_results", &self.search_max_results)
            .field("gateway", &self.gateway)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Browser origins allowed to call the API with credentials
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".into(),
        "https://nexus-frontend-193226167127.us-central1.run.app".into(),
    ]
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl GatewayConfig {
    /// `host:port` for binding the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl AppConfig {
    /// Load configuration from `./nexus.toml` and the process environment.
    ///
    /// Environment variables win over the file:
    /// - `GOOGLE_API_KEY`, `TAVILY_API_KEY`
    /// - `PORT`, `HOST`
    /// - `NEXUS_MODEL`, `NEXUS_MAX_ITERATIONS`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(Path::new(CONFIG_FILE), |key| std::env::var(key).ok())
    }

    /// Load from `path`, apply overrides from `lookup`, then validate.
    pub fn load_with<F>(path: &Path, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::load_from(path)?;
        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file. A missing file yields the defaults.
    ///
    /// Does not validate: secrets usually arrive later via the environment.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Apply environment-style overrides through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("GOOGLE_API_KEY") {
            self.google_api_key = Some(key);
        }
        if let Some(key) = lookup("TAVILY_API_KEY") {
            self.tavily_api_key = Some(key);
        }
        if let Some(model) = lookup("NEXUS_MODEL") {
            self.model = model;
        }
        if let Some(host) = lookup("HOST") {
            self.gateway.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.gateway.port = parse_var("PORT", &port)?;
        }
        if let Some(n) = lookup("NEXUS_MAX_ITERATIONS") {
            self.max_iterations = parse_var("NEXUS_MAX_ITERATIONS", &n)?;
        }
        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_secret("GOOGLE_API_KEY", &self.google_api_key)?;
        require_secret("TAVILY_API_KEY", &self.tavily_api_key)?;

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationError("model must not be empty".into()));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "max_iterations must be at least 1".into(),
            ));
        }
        if self.search_max_results == 0 {
            return Err(ConfigError::ValidationError(
                "search_max_results must be at least 1".into(),
            ));
        }
        for (name, url) in [
            ("provider_url", &self.provider_url),
            ("search_url", &self.search_url),
        ] {
            if reqwest::Url::parse(url).is_err() {
                return Err(ConfigError::ValidationError(format!(
                    "{name} is not a valid URL: {url}"
                )));
            }
        }
        if self.gateway.port == 0 {
            return Err(ConfigError::ValidationError(
                "gateway.port must be non-zero".into(),
            ));
        }
        if self.gateway.allowed_origins.len() != 2 {
            return Err(ConfigError::ValidationError(format!(
                "gateway.allowed_origins must list exactly two origins, got {}",
                self.gateway.allowed_origins.len()
            )));
        }
        // Browsers send `scheme://host[:port]` with no path, so anything else
        // would never match the `Origin` header.
        for origin in &self.gateway.allowed_origins {
            let serialized = reqwest::Url::parse(origin)
                .ok()
                .map(|url| url.origin().ascii_serialization());
            if serialized.as_deref() != Some(origin.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "invalid allowed origin: {origin} (expected scheme://host[:port])"
                )));
            }
        }

        Ok(())
    }

    /// The Gemini key. Empty until `validate()` has passed.
    pub fn google_api_key(&self) -> &str {
        self.google_api_key.as_deref().unwrap_or_default()
    }

    /// The Tavily key. Empty until `validate()` has passed.
    pub fn tavily_api_key(&self) -> &str {
        self.tavily_api_key.as_deref().unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            google_api_key: None,
            tavily_api_key: None,
            model: default_model(),
            temperature: 0.0,
            max_tokens: None,
            max_iterations: default_max_iterations(),
            provider_url: default_provider_url(),
            search_url: default_search_url(),
            search_max_results: default_search_max_results(),
            gateway: GatewayConfig::default(),
        }
    }
}

fn require_secret(name: &'static str, value: &Option<String>) -> Result<(), ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(ConfigError::MissingSecret { name }),
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| {
        ConfigError::ValidationError(format!("{name} has an invalid value: {raw:?}"))
    })
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Missing required secret {name}")]
    MissingSecret { name: &'static str },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
