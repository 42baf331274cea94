//! How the platform hook reaches the proxy: in-process, or over HTTP when
//! the proxy is deployed separately (`PROXY_URL`).

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::proxy::{dispatch, ProxyError, ProxyRequest};
use crate::youtube::{VideoPlatform, REQUEST_TIMEOUT_SECS};

#[async_trait]
pub trait ProxyTransport: Send + Sync {
    /// Sends one request and returns the action-specific JSON payload.
    async fn invoke(
        &self,
        request: ProxyRequest,
        access_token: Option<&str>,
    ) -> Result<Value, ProxyError>;
}

/// Calls `dispatch` directly against a platform client.
pub struct LocalProxy {
    platform: Arc<dyn VideoPlatform>,
}

impl LocalProxy {
    pub fn new(platform: Arc<dyn VideoPlatform>) -> Self {
        Self { platform }
    }
}

#[async_trait]
impl ProxyTransport for LocalProxy {
    async fn invoke(
        &self,
        request: ProxyRequest,
        access_token: Option<&str>,
    ) -> Result<Value, ProxyError> {
        let response = dispatch(self.platform.as_ref(), request, access_token).await?;
        Ok(serde_json::to_value(response)?)
    }
}

#[derive(Debug, Deserialize)]
struct ProxyErrorBody {
    error: String,
}

/// POSTs to a remote proxy endpoint, forwarding the session token as a bearer.
pub struct HttpProxy {
    client: Client,
    url: String,
}

impl HttpProxy {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            url: url.into(),
        }
    }
}

#[async_trait]
impl ProxyTransport for HttpProxy {
    async fn invoke(
        &self,
        request: ProxyRequest,
        access_token: Option<&str>,
    ) -> Result<Value, ProxyError> {
        let mut builder = self.client.post(&self.url).json(&request);
        if let Some(token) = access_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ProxyErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
            return Err(ProxyError::Remote {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_slice(&body)?)
    }
}
