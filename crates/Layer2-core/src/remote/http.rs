//! HTTP Backend - reqwest 기반 RemoteBackend 구현

use super::{Method, RemoteBackend, RemoteReply, RemoteRequest};
use armory_foundation::{BackendConfig, Error, Result};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::{debug, warn};

/// Bearer 토큰 인증 JSON-over-HTTP 백엔드
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    token: String,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let base_url = Url::parse(config.base_url.trim()).map_err(|e| {
            Error::Config(format!("Invalid backend URL '{}': {}", config.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "Backend URL '{}' cannot be used as a base",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            token: config.api_token.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// 기본 URL + 세그먼트 + 쿼리
    fn url_for(&self, request: &RemoteRequest) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| Error::Config("Backend URL cannot be used as a base".to_string()))?;
            segments.pop_if_empty();
            segments.extend(request.segments.iter());
        }
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }
        Ok(url)
    }
}

#[async_trait]
impl RemoteBackend for HttpBackend {
    async fn send(&self, request: RemoteRequest) -> Result<RemoteReply> {
        let url = self.url_for(&request)?;
        debug!("{:?} {}", request.method, url);

        let builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
        };
        let mut builder = builder
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = &request.body {
            builder = builder.body(body.to_string());
        }

        let response = builder.send().await.map_err(|e| {
            warn!("Backend request {} failed: {}", request.path(), e);
            Error::remote(None, e.to_string())
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::remote(Some(status), format!("Failed to read body: {}", e)))?;

        debug!("{} -> HTTP {}", request.path(), status);
        Ok(RemoteReply { status, body })
    }
}
