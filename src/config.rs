//! read client configuration from a file, the environment, or explicit values

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::errors::Error;
use crate::token::TokenPair;

pub const DEFAULT_API_URL: &str = "http://localhost:5293/api";
pub const DEFAULT_USER_AGENT: &str = "mathboard-rust-client/0.1.0";

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Per-request timeout handed to the HTTP client.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Tokens from a previous session, installed into the token store on startup.
    #[serde(default)]
    pub tokens: Option<TokenPair>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            user_agent: default_user_agent(),
            timeout_secs: None,
            tokens: None,
        }
    }
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// # ENV Vars
    /// * `MATHBOARD_API_URL` - base URL of the forum API (defaults to the local dev server)
    /// * `MATHBOARD_USER_AGENT` - optional User-Agent override
    /// * `MATHBOARD_TIMEOUT_SECS` - optional per-request timeout
    pub fn from_env() -> Result<Self, Error> {
        let timeout_secs = match std::env::var("MATHBOARD_TIMEOUT_SECS") {
            Ok(raw) => Some(raw.parse::<u64>().map_err(|e| {
                Error::Config(format!("Invalid MATHBOARD_TIMEOUT_SECS '{raw}': {e}"))
            })?),
            Err(_) => None,
        };
        Ok(Self {
            api_url: std::env::var("MATHBOARD_API_URL").unwrap_or_else(|_| default_api_url()),
            user_agent: std::env::var("MATHBOARD_USER_AGENT")
                .unwrap_or_else(|_| default_user_agent()),
            timeout_secs,
            tokens: None,
        })
    }

    pub fn from_values(api_url: impl Into<String>, timeout_secs: Option<u64>) -> Self {
        Self {
            api_url: api_url.into(),
            timeout_secs,
            ..Self::default()
        }
    }

    pub fn with_tokens(mut self, tokens: TokenPair) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Returns the API base without a trailing slash, validating it parses as a URL.
    pub fn base_url(&self) -> Result<String, Error> {
        let base = if self.api_url.starts_with("http") {
            self.api_url.clone()
        } else {
            format!("https://{}", self.api_url)
        };
        reqwest::Url::parse(&base)
            .map_err(|e| Error::Config(format!("Invalid API URL '{}': {}", base, e)))?;
        Ok(base.trim_end_matches('/').to_string())
    }
}
