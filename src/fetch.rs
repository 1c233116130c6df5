//! Fetch Client
//!
//! Issues a single HTTP request against the configured API and returns the
//! parsed JSON body.

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from the fetch stage
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("API URL must be provided")]
    MissingUrl,

    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to decode response as JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

impl FromStr for HttpMethod {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            _ => Err(FetchError::UnsupportedMethod(s.to_string())),
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => f.write_str("GET"),
            Self::Post => f.write_str("POST"),
        }
    }
}

/// One request to issue
#[derive(Debug, Clone, Default)]
pub struct FetchRequest {
    /// Absolute URL, or a path starting with `/` joined onto the base URL
    pub url: Option<String>,
    pub method: HttpMethod,
    pub headers: HashMap<String, String>,
    pub params: Vec<(String, String)>,
    /// JSON body, sent for POST only
    pub body: Option<Value>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }
}

/// HTTP client holding the base URL and headers shared by every request
#[derive(Debug, Clone)]
pub struct FetchClient {
    client: Client,
    base_url: Option<String>,
    default_headers: HashMap<String, String>,
}

impl FetchClient {
    pub fn new(base_url: Option<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("⚠️ Failed to build HTTP client ({}), using defaults", e);
                Client::new()
            });
        Self {
            client,
            base_url,
            default_headers: HashMap::new(),
        }
    }

    /// Build a client from config; an API token becomes a bearer header
    pub fn from_config(config: &crate::config::Config) -> Self {
        let mut fetcher = Self::new(
            config.api_base_url.clone(),
            Duration::from_secs(config.http_timeout_secs),
        );
        if let Some(token) = &config.api_token {
            fetcher = fetcher.with_header("Authorization", format!("Bearer {token}"));
        }
        fetcher
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    /// Resolve the final URL for a request
    pub fn resolve_url(&self, url: Option<&str>) -> Result<String, FetchError> {
        match (url, self.base_url.as_deref()) {
            (Some(u), Some(base)) if u.starts_with('/') => {
                Ok(format!("{}{}", base.trim_end_matches('/'), u))
            }
            (Some(u), _) => Ok(u.to_string()),
            (None, Some(base)) => Ok(base.to_string()),
            (None, None) => Err(FetchError::MissingUrl),
        }
    }

    /// Perform the request and parse the body as JSON
    pub async fn fetch(&self, request: &FetchRequest) -> Result<Value, FetchError> {
        let url = self.resolve_url(request.url.as_deref())?;
        info!("🌐 Fetching data from {} using {}", url, request.method);

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
        };

        let mut headers = self.default_headers.clone();
        headers.extend(request.headers.clone());
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        if let (HttpMethod::Post, Some(body)) = (request.method, &request.body) {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status { status, body });
        }

        if !content_type.contains("application/json") {
            warn!(
                "⚠️ Response is not JSON (Content-Type: {}), parsing anyway",
                content_type
            );
        }

        let value: Value = serde_json::from_str(&body)?;
        debug!("📦 Received {} bytes from {}", body.len(), url);
        Ok(value)
    }
}
