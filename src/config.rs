// Client configuration

use std::{collections::HashMap, time::Duration};

use crate::{
    error::ClientError,
    operations::{Api, ResponsePath},
    xml::ParseOptions,
};

pub const DEFAULT_TIMEOUT_MS: u64 = 100_000;

pub const ENV_SERVER: &str = "USPS_SERVER";
pub const ENV_USER_ID: &str = "USPS_USER_ID";
pub const ENV_TIMEOUT_MS: &str = "USPS_TIMEOUT_MS";

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub server: String,
    pub user_id: String,
    pub timeout_ms: Option<u64>,
    pub parse_options: ParseOptions,
    pub response_paths: HashMap<Api, ResponsePath>,
}

impl ClientConfig {
    pub fn new(server: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_parse_options(mut self, parse_options: ParseOptions) -> Self {
        self.parse_options = parse_options;
        self
    }

    /// Overrides where the result element of `api` is looked up.
    pub fn with_response_path(mut self, api: Api, path: ResponsePath) -> Self {
        self.response_paths.insert(api, path);
        self
    }

    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    // Same as `from_env` over an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server = lookup(ENV_SERVER).unwrap_or_default();
        let user_id = lookup(ENV_USER_ID).unwrap_or_default();

        let mut config = Self::new(server, user_id);
        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            let timeout_ms = raw.trim().parse::<u64>().map_err(|e| {
                ClientError::ConfigError(format!("{ENV_TIMEOUT_MS}={raw:?} is not a number: {e}"))
            })?;
            config.timeout_ms = Some(timeout_ms);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.server.trim().is_empty() {
            return Err(ClientError::ConfigError(
                "must pass usps server url".to_string(),
            ));
        }
        if self.user_id.trim().is_empty() {
            return Err(ClientError::ConfigError("must pass usps userId".to_string()));
        }
        if let Some(path) = self
            .response_paths
            .values()
            .find(|path| path.envelope.is_empty() || path.element.is_empty())
        {
            return Err(ClientError::ConfigError(format!(
                "response path {path} has an empty segment"
            )));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS))
    }

    pub fn response_path(&self, api: Api) -> ResponsePath {
        self.response_paths
            .get(&api)
            .cloned()
            .unwrap_or_else(|| api.default_path())
    }
}
