//! Core HTTP operations with retry and error classification
//!
//! Every catalog request goes through [`HttpHandler::send`]:
//!
//! - connection-layer failures are retried after a fixed delay, up to the
//!   configured number of retries, then returned as `ClientError::Network`
//! - error statuses are never retried; they are logged with full context and
//!   the raw body is dumped to disk for postmortem
//! - anything else is returned after a single attempt

use std::path::PathBuf;
use std::time::Duration;

use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::constants::http;
use crate::errors::{ClientError, ClientResult};
use crate::logging::ChannelLogger;

/// HTTP operations handler with retry and classification
#[derive(Debug)]
pub struct HttpHandler {
    client: Client,
    retries: u32,
    retry_delay: Duration,
    debug_dump: Option<PathBuf>,
    log: ChannelLogger,
}

impl HttpHandler {
    /// Creates a new HttpHandler around an already configured client
    pub fn new(
        client: Client,
        retries: u32,
        retry_delay: Duration,
        debug_dump: Option<PathBuf>,
    ) -> Self {
        Self {
            client,
            retries,
            retry_delay,
            debug_dump,
            log: ChannelLogger::new("http"),
        }
    }

    /// Send a request, retrying connection failures and classifying error statuses
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Network` once the retries are exhausted,
    /// `ClientError::Status`/`NotFound` on 4xx/5xx, `ClientError::Transport`
    /// on any other request failure
    pub async fn send(
        &self,
        method: Method,
        url: &Url,
        body: Option<&Value>,
    ) -> ClientResult<Response> {
        let mut attempts = 0;
        loop {
            attempts += 1;

            let mut request = self.client.request(method.clone(), url.clone());
            if let Some(body) = body {
                request = request.json(body);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_client_error() || status.is_server_error() {
                        return Err(self.status_error(response, body).await);
                    }
                    tracing::debug!("{} {} -> {}", method, url, status);
                    return Ok(response);
                }
                Err(e) if e.is_connect() => {
                    self.log.error(&e);
                    self.log.error(format!(
                        "Server URL: {}, failed while trying to connect.",
                        url
                    ));

                    if attempts > self.retries {
                        return Err(ClientError::Network {
                            url: url.to_string(),
                            attempts,
                            source: e,
                        });
                    }

                    self.log.user("Network unstable. Retrying...");
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(ClientError::Transport(e)),
            }
        }
    }

    /// Log, dump and classify an error response
    async fn status_error(&self, response: Response, payload: Option<&Value>) -> ClientError {
        let url = response.url().to_string();
        let status = response.status().as_u16();
        let body = match response.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(e) => {
                self.log.warn(format!("Could not read error body from {}: {}", url, e));
                Vec::new()
            }
        };

        let preview_len = body.len().min(http::ERROR_BODY_PREVIEW);
        let preview = String::from_utf8_lossy(&body[..preview_len]).into_owned();
        let payload = payload
            .map(Value::to_string)
            .unwrap_or_else(|| "none".to_string());

        self.log.error(format!(
            "Server URL: {}, failed with status code ({}). Raw response: {:?} Request payload: {}",
            url, status, preview, payload
        ));

        if let Some(path) = &self.debug_dump {
            if let Err(e) = write_dump(path, &body).await {
                self.log
                    .warn(format!("Could not write {}: {}", path.display(), e));
            }
        }

        if status == 404 {
            ClientError::NotFound { url }
        } else {
            ClientError::Status {
                url,
                status,
                body: preview,
            }
        }
    }

    /// GET a URL and decode the JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> ClientResult<T> {
        let response = self.send(Method::GET, url, None).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// POST a JSON body and decode the JSON response
    pub async fn post_json<T: DeserializeOwned>(&self, url: &Url, body: &Value) -> ClientResult<T> {
        let response = self.send(Method::POST, url, Some(body)).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// GET a URL and return the raw body
    pub async fn get_bytes(&self, url: &Url) -> ClientResult<Vec<u8>> {
        let response = self.send(Method::GET, url, None).await?;
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}

async fn write_dump(path: &std::path::Path, body: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, body).await
}
