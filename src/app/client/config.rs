//! HTTP client configuration and building logic
//!
//! This module handles the configuration and construction of the
//! `reqwest::Client` used to talk to the catalog.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use url::Url;

use crate::constants::{catalog, http, limits};
use crate::errors::{ClientError, ClientResult};

/// Runtime configuration of the catalog client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Catalog root, ending in `/`
    pub base_url: Url,
    /// Auth token sent in the `Authorization` header
    pub token: Option<String>,
    /// Retries after the first attempt on connection failures
    pub retries: u32,
    /// Fixed delay between retries
    pub retry_delay: Duration,
    /// Request timeout
    pub request_timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Compare the local item schema with the server's on connect
    pub schema_check: bool,
    /// Where to dump the body of the last failing response
    pub debug_dump: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(catalog::PRODUCTION_URL).expect("Production URL should be valid"),
            token: None,
            retries: limits::MAX_RETRIES,
            retry_delay: Duration::from_millis(limits::RETRY_DELAY_MS),
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            schema_check: true,
            debug_dump: None,
        }
    }
}

impl ClientConfig {
    /// Configuration pointing at `base_url` with everything else defaulted
    pub fn for_url(base_url: Url) -> Self {
        Self {
            base_url,
            ..Default::default()
        }
    }

    /// Builds the HTTP client with the specified configuration
    pub fn build_http_client(&self) -> ClientResult<Client> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.token {
            let mut value = HeaderValue::from_str(token)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        Client::builder()
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(http::USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(ClientError::Transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url.as_str(), catalog::PRODUCTION_URL);
        assert_eq!(config.retries, limits::MAX_RETRIES);
        assert_eq!(config.retry_delay, Duration::from_secs(1));
        assert!(config.schema_check);
        assert!(config.token.is_none());
    }

    #[test]
    fn test_http_client_creation() {
        let config = ClientConfig {
            token: Some("3f1c9a4e-0000-4000-8000-000000000000".to_string()),
            ..Default::default()
        };
        assert!(config.build_http_client().is_ok());
    }

    #[test]
    fn test_invalid_token_rejected() {
        let config = ClientConfig {
            token: Some("bad\ntoken".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            config.build_http_client(),
            Err(ClientError::InvalidToken(_))
        ));
    }
}
