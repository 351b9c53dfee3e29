use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const MAX_UPLOAD_LIMIT_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] envy::Error),
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_project_name")]
    pub project_name: String,

    #[serde(default = "default_api_v1_str")]
    pub api_v1_str: String,

    pub openrouter_api_key: String,

    #[serde(default = "default_openrouter_model")]
    pub openrouter_model: String,

    #[serde(default = "default_openrouter_base_url")]
    pub openrouter_base_url: String,

    #[serde(default = "default_http_referer")]
    pub http_referer: String,

    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,

    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config: Config = envy::from_env()?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(test)]
    fn from_env_no_dotenv() -> Result<Self, ConfigError> {
        let config: Config = envy::from_env()?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Config {
            host: default_host(),
            port: default_port(),
            project_name: default_project_name(),
            api_v1_str: default_api_v1_str(),
            openrouter_api_key: "sk-or-test".to_string(),
            openrouter_model: default_openrouter_model(),
            openrouter_base_url: default_openrouter_base_url(),
            http_referer: default_http_referer(),
            request_timeout_seconds: default_request_timeout_seconds(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.openrouter_api_key.trim().is_empty() {
            return Err(ConfigError::Validation(
                "OPENROUTER_API_KEY must not be empty".into(),
            ));
        }

        if !self.openrouter_base_url.starts_with("http://")
            && !self.openrouter_base_url.starts_with("https://")
        {
            return Err(ConfigError::Validation(format!(
                "OpenRouter base URL must start with http:// or https://: {}",
                self.openrouter_base_url
            )));
        }

        if !self.api_v1_str.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "API prefix must start with '/': {}",
                self.api_v1_str
            )));
        }

        if self.request_timeout_seconds == 0 {
            return Err(ConfigError::Validation(
                "Request timeout must be greater than 0".into(),
            ));
        }

        if self.max_upload_bytes == 0 || self.max_upload_bytes > MAX_UPLOAD_LIMIT_BYTES {
            return Err(ConfigError::Validation(format!(
                "Max upload size must be between 1 and {MAX_UPLOAD_LIMIT_BYTES} bytes, got: {}",
                self.max_upload_bytes
            )));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Route of the upload endpoint, e.g. `/api/v1/extract`.
    pub fn extract_route(&self) -> String {
        format!("{}/extract", self.api_v1_str.trim_end_matches('/'))
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_project_name() -> String {
    "Bill Extractor".to_string()
}

fn default_api_v1_str() -> String {
    "/api/v1".to_string()
}

fn default_openrouter_model() -> String {
    "google/gemini-2.0-flash-001".to_string()
}

fn default_openrouter_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_http_referer() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    60
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}
