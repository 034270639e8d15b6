//! REST adapter for the remote execution store.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;

use super::{RemoteError, RemoteResult, RemoteStore};
use crate::error::{Error, Result};
use crate::models::RemoteExecution;
use crate::util::{compact_text, is_http_url, normalize_text_option};

/// Connection settings for [`HttpRemoteStore`].
#[derive(Clone, PartialEq, Eq)]
pub struct HttpRemoteStoreConfig {
    /// Service base URL, e.g. `https://sync.example.com`
    pub base_url: String,
    /// Optional bearer token sent with every request
    pub api_token: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
    /// Documents requested per page when querying
    pub page_size: u32,
}

impl fmt::Debug for HttpRemoteStoreConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("HttpRemoteStoreConfig")
            .field("base_url", &self.base_url)
            .field(
                "api_token",
                &self.api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout", &self.timeout)
            .field("page_size", &self.page_size)
            .finish()
    }
}

/// Remote store reached over HTTP.
///
/// `PUT {base}/v1/executions/{id}` upserts one document and
/// `GET {base}/v1/executions?owner_id=..` pages through an owner's documents.
#[derive(Clone)]
pub struct HttpRemoteStore {
    base_url: Url,
    api_token: Option<String>,
    page_size: u32,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ExecutionPage {
    items: Vec<RemoteExecution>,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

impl HttpRemoteStore {
    pub fn new(config: HttpRemoteStoreConfig) -> Result<Self> {
        let base_url = normalize_base_url(config.base_url)?;
        if config.page_size == 0 {
            return Err(Error::InvalidInput("page size must be at least 1".into()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|error| Error::InvalidInput(format!("HTTP client setup failed: {error}")))?;

        Ok(Self {
            base_url,
            api_token: normalize_text_option(config.api_token),
            page_size: config.page_size,
            client,
        })
    }

    fn endpoint(&self, id: Option<&str>) -> RemoteResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| RemoteError::Rejected("base URL cannot carry a path".into()))?;
            segments.pop_if_empty().extend(["v1", "executions"]);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn fetch_page(
        &self,
        owner_id: &str,
        cursor: Option<&str>,
    ) -> RemoteResult<ExecutionPage> {
        let mut request = self
            .client
            .get(self.endpoint(None)?)
            .header("Accept", "application/json")
            .query(&[("owner_id", owner_id)])
            .query(&[("limit", self.page_size)]);
        if let Some(cursor) = cursor {
            request = request.query(&[("cursor", cursor)]);
        }

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        response.json::<ExecutionPage>().await.map_err(transport_error)
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn put(&self, record: &RemoteExecution) -> RemoteResult<()> {
        let request = self
            .client
            .put(self.endpoint(Some(&record.id))?)
            .header("Accept", "application/json")
            .json(record);

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(id = %record.id, "Remote accepted execution");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, &body))
    }

    async fn query_by_owner(&self, owner_id: &str) -> RemoteResult<Vec<RemoteExecution>> {
        let mut executions = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = self.fetch_page(owner_id, cursor.as_deref()).await?;
            let page_len = page.items.len();
            executions.extend(page.items);

            match page.next_cursor {
                Some(next) if page_len > 0 && cursor.as_deref() != Some(next.as_str()) => {
                    cursor = Some(next);
                }
                _ => break,
            }
        }

        tracing::debug!(owner_id, count = executions.len(), "Fetched remote executions");
        Ok(executions)
    }
}

fn normalize_base_url(raw: String) -> Result<Url> {
    let base = normalize_text_option(Some(raw))
        .ok_or_else(|| Error::InvalidInput("remote URL must not be empty".to_string()))?;
    if !is_http_url(&base) {
        return Err(Error::InvalidInput(
            "remote URL must include http:// or https://".to_string(),
        ));
    }
    Url::parse(base.trim_end_matches('/'))
        .map_err(|error| Error::InvalidInput(format!("invalid remote URL: {error}")))
}

fn transport_error(error: reqwest::Error) -> RemoteError {
    if error.is_decode() {
        RemoteError::Rejected(format!("unexpected response body: {error}"))
    } else {
        RemoteError::Network(error.to_string())
    }
}

fn status_error(status: StatusCode, body: &str) -> RemoteError {
    let message = parse_api_error(status, body);
    if status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
    {
        RemoteError::Network(message)
    } else {
        RemoteError::Rejected(message)
    }
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.error.or(payload.message) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}
