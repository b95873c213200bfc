//! HTTP client with a reconfigurable timeout.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::{
    Client, StatusCode,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use std::io::Write;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use super::{HttpStatusError, Transport};

/// Timeout applied when none (or zero) is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

const USER_AGENT: &str = concat!("gitrelease/", env!("GITRELEASE_VERSION"));

/// Settings used to build the underlying reqwest client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub user_agent: String,
    /// Sent as `Authorization: Bearer <token>` when set
    pub token: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: USER_AGENT.to_string(),
            token: None,
        }
    }
}

impl HttpConfig {
    /// Set the request timeout. Zero resets to [`DEFAULT_TIMEOUT`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = effective_timeout(timeout);
        self
    }

    /// Attach a bearer token to every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn build_client(&self) -> Result<Client> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.token {
            let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
                .context("Invalid characters in token")?;
            auth_value.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth_value);
            debug!("Using bearer token for authentication");
        }

        Client::builder()
            .user_agent(self.user_agent.as_str())
            .default_headers(headers)
            .timeout(self.timeout)
            .build()
            .context("Failed to build HTTP client")
    }
}

fn effective_timeout(timeout: Duration) -> Duration {
    if timeout.is_zero() {
        DEFAULT_TIMEOUT
    } else {
        timeout
    }
}

struct State {
    config: HttpConfig,
    client: Client,
}

/// HTTP client shared by fetches and downloads.
///
/// Cloning is cheap and clones share configuration. A timeout change
/// applies to requests started afterwards; in-flight requests keep the
/// timeout they started with.
#[derive(Clone)]
pub struct HttpClient {
    state: Arc<RwLock<State>>,
}

impl HttpClient {
    /// Creates a client from the given configuration.
    pub fn new(config: HttpConfig) -> Result<Self> {
        let config = HttpConfig {
            timeout: effective_timeout(config.timeout),
            ..config
        };
        let client = config.build_client()?;
        Ok(Self {
            state: Arc::new(RwLock::new(State { config, client })),
        })
    }

    /// Creates a client with [`HttpConfig::default`].
    pub fn with_defaults() -> Result<Self> {
        Self::new(HttpConfig::default())
    }

    /// Currently configured timeout.
    pub fn timeout(&self) -> Duration {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .config
            .timeout
    }

    /// Change the timeout for subsequent requests. Zero resets to the default.
    pub fn set_timeout(&self, timeout: Duration) -> Result<()> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let config = state.config.clone().with_timeout(timeout);
        state.client = config.build_client()?;
        debug!("HTTP timeout set to {:?}", config.timeout);
        state.config = config;
        Ok(())
    }

    /// Snapshot of the underlying reqwest client.
    fn client(&self) -> Client {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .client
            .clone()
    }

    /// Sends one GET and fails unless the status is exactly 200.
    async fn get_ok(&self, url: &str) -> Result<reqwest::Response> {
        let response = self
            .client()
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(HttpStatusError::new(url, status).into());
        }
        Ok(response)
    }

    /// Performs a GET request and returns the whole body.
    #[tracing::instrument(skip(self))]
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        debug!("GET {}...", url);

        let body = self
            .get_ok(url)
            .await?
            .bytes()
            .await
            .context("Failed to read response body")?;

        debug!("Received {} bytes from {}", body.len(), url);
        Ok(body.to_vec())
    }

    /// Streams the body of `url` into the writer returned by `create_writer`.
    ///
    /// The writer is only created once the server answered 200.
    #[tracing::instrument(skip(self, create_writer))]
    pub async fn download_file<W, F>(&self, url: &str, create_writer: F) -> Result<u64>
    where
        W: Write,
        F: FnOnce() -> Result<W>,
    {
        debug!("Downloading file from {}...", url);

        let mut response = self.get_ok(url).await?;
        let mut writer = create_writer()?;
        let mut downloaded_bytes: u64 = 0;

        while let Some(chunk) = response
            .chunk()
            .await
            .context("Failed to read chunk from download stream")?
        {
            writer
                .write_all(&chunk)
                .context("Failed to write chunk to file")?;
            downloaded_bytes += chunk.len() as u64;
        }
        writer.flush().context("Failed to flush downloaded file")?;

        debug!(
            "Downloaded {:.2} MB",
            downloaded_bytes as f64 / (1024.0 * 1024.0)
        );

        Ok(downloaded_bytes)
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        HttpClient::get_bytes(self, url).await
    }
}
