use at_core::ValidationMode;
use serde::{Deserialize, Serialize};

/// Account name that routes traffic to the sandbox endpoint.
pub const SANDBOX_USERNAME: &str = "sandbox";
pub const DEFAULT_SEND_SMS_API_ENDPOINT: &str = "/version1/messaging";
pub const DEFAULT_SANDBOX_URL: &str = "https://api.sandbox.africastalking.com";
pub const DEFAULT_PRODUCTION_URL: &str = "https://api.africastalking.com";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required config field `{0}`")]
    MissingField(&'static str),
    #[error("invalid config field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("failed to build http client: {0}")]
    HttpClient(String),
}

/// Africa's Talking provider configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AfricasTalkingConfig {
    /// API key sent with every request (required)
    pub api_key: String,
    /// Account username; `sandbox` selects the sandbox endpoint (required)
    pub username: String,
    /// Messaging path appended to the base URL (default: /version1/messaging)
    pub send_sms_api_endpoint: String,
    /// Base URL used when `username` is `sandbox`
    pub outbound_sandbox_url: String,
    /// Base URL used for every other account
    pub outbound_production_url: String,
    /// Handling of unknown webhook fields (default: strict)
    pub validation_mode: ValidationMode,
    /// Outbound request timeout in seconds (default: 30)
    pub request_timeout_seconds: u64,
}

impl Default for AfricasTalkingConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            username: String::new(),
            send_sms_api_endpoint: DEFAULT_SEND_SMS_API_ENDPOINT.to_string(),
            outbound_sandbox_url: DEFAULT_SANDBOX_URL.to_string(),
            outbound_production_url: DEFAULT_PRODUCTION_URL.to_string(),
            validation_mode: ValidationMode::Strict,
            request_timeout_seconds: 30,
        }
    }
}

impl AfricasTalkingConfig {
    pub fn new<S: Into<String>>(username: S, api_key: S) -> Self {
        Self {
            username: username.into(),
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Fail fast on anything that would only surface at send time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingField("api_key"));
        }
        if self.username.trim().is_empty() {
            return Err(ConfigError::MissingField("username"));
        }
        if !self.send_sms_api_endpoint.starts_with('/') {
            return Err(ConfigError::InvalidField {
                field: "send_sms_api_endpoint",
                reason: "must start with '/'".to_string(),
            });
        }
        check_base_url("outbound_sandbox_url", &self.outbound_sandbox_url)?;
        check_base_url("outbound_production_url", &self.outbound_production_url)?;
        if self.request_timeout_seconds == 0 {
            return Err(ConfigError::InvalidField {
                field: "request_timeout_seconds",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn is_sandbox(&self) -> bool {
        self.username == SANDBOX_USERNAME
    }

    /// Full messaging URL for this account.
    pub fn outbound_url(&self) -> String {
        let base = if self.is_sandbox() {
            &self.outbound_sandbox_url
        } else {
            &self.outbound_production_url
        };
        format!("{}{}", base.trim_end_matches('/'), self.send_sms_api_endpoint)
    }
}

fn check_base_url(field: &'static str, url: &str) -> Result<(), ConfigError> {
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidField {
            field,
            reason: format!("`{url}` is not an http(s) URL"),
        })
    }
}
