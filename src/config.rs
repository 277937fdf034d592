//! Client configuration.
//!
//! Use the builder methods to customize, or [`ClientConfig::from_env`] to read
//! the `ANALYSIS_*` environment variables.
//!
//! # Example
//!
//! ```
//! use analysis_progress::config::ClientConfig;
//!
//! let config = ClientConfig::default()
//!     .with_base_url("https://analysis.example.com")
//!     .with_token("secret");
//! assert_eq!(
//!     config.stream_url("an-1"),
//!     "https://analysis.example.com/api/analyses/an-1/stream"
//! );
//! ```

use crate::controller::RetryPolicy;
use crate::error::ConfigError;
use crate::traits::Headers;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_START_PATH: &str = "/api/analyses";
pub const DEFAULT_STREAM_PATH: &str = "/api/analyses/{id}/stream";

pub const ENV_BASE_URL: &str = "ANALYSIS_API_URL";
pub const ENV_TOKEN: &str = "ANALYSIS_API_TOKEN";
pub const ENV_MAX_RETRIES: &str = "ANALYSIS_MAX_RETRIES";
pub const ENV_INITIAL_DELAY_MS: &str = "ANALYSIS_INITIAL_DELAY_MS";
pub const ENV_MAX_DELAY_MS: &str = "ANALYSIS_MAX_DELAY_MS";
pub const ENV_BACKOFF_MULTIPLIER: &str = "ANALYSIS_BACKOFF_MULTIPLIER";

/// Where the backend lives and how to talk to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Scheme and host, no trailing path (default: http://localhost:8000)
    pub base_url: String,
    /// Bearer token sent on every request
    pub token: Option<String>,
    pub retry: RetryPolicy,
    /// Job-start endpoint path
    pub start_path: String,
    /// Stream endpoint path; `{id}` is replaced by the analysis id
    pub stream_path_template: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            retry: RetryPolicy::default(),
            start_path: DEFAULT_START_PATH.to_string(),
            stream_path_template: DEFAULT_STREAM_PATH.to_string(),
        }
    }
}

impl ClientConfig {
    /// Create a new ClientConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_start_path(mut self, path: impl Into<String>) -> Self {
        self.start_path = path.into();
        self
    }

    pub fn with_stream_path_template(mut self, template: impl Into<String>) -> Self {
        self.stream_path_template = template.into();
        self
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, falling back to defaults for
    /// unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_BASE_URL) {
            config.base_url = url;
        }
        config.token = lookup(ENV_TOKEN).filter(|t| !t.trim().is_empty());

        if let Some(v) = parse_var(&lookup, ENV_MAX_RETRIES)? {
            config.retry.max_retries = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_INITIAL_DELAY_MS)? {
            config.retry.initial_delay_ms = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_MAX_DELAY_MS)? {
            config.retry.max_delay_ms = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_BACKOFF_MULTIPLIER)? {
            config.retry.backoff_multiplier = v;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(self.base_url.clone()));
        }
        self.retry.validate()
    }

    pub fn start_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.start_path)
    }

    pub fn stream_url(&self, analysis_id: &str) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.stream_path_template.replace("{id}", analysis_id)
        )
    }

    /// Headers for the job-start request.
    pub fn json_headers(&self) -> Headers {
        let mut headers = self.auth_headers();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers
    }

    /// Headers for the event stream request.
    pub fn stream_headers(&self) -> Headers {
        let mut headers = self.auth_headers();
        headers.insert("Accept".to_string(), "text/event-stream".to_string());
        headers.insert("Cache-Control".to_string(), "no-cache".to_string());
        headers
    }

    fn auth_headers(&self) -> Headers {
        let mut headers = Headers::new();
        if let Some(ref token) = self.token {
            headers.insert("Authorization".to_string(), format!("Bearer {}", token));
        }
        headers
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            }),
    }
}
