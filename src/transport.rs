//! HTTP plumbing between the client and ShipStation.
//!
//! `Transport` is the seam tests replace: it moves one request and returns
//! the raw status and body. Status interpretation and parsing live in the
//! client.

use crate::config::{Config, Credentials};
use crate::error::{Result, WarehouseError};
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A request relative to the API base URL
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        ApiRequest {
            method: Method::Get,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        ApiRequest {
            method: Method::Post,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_write(&self) -> bool {
        self.method == Method::Post
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        ApiResponse {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait Transport: Send + Sync {
    /// Perform one round trip. Errors only for failures below HTTP
    /// (connect, timeout, unreadable body); any status code is a response.
    fn send(&self, request: &ApiRequest, credentials: &Credentials) -> Result<ApiResponse>;
}

/// Blocking reqwest transport with basic auth
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("neon-warehouse/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WarehouseError::Transport(format!("client build failed: {e}")))?;
        Ok(HttpTransport {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.api_base, config.timeout)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &ApiRequest, credentials: &Credentials) -> Result<ApiResponse> {
        let url = self.url(&request.path);
        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };
        builder = builder.basic_auth(&credentials.key, Some(&credentials.secret));
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        tracing::debug!(method = ?request.method, %url, "shipstation request");
        let response = builder.send().map_err(|e| {
            let reason = if e.is_timeout() { "timed out" } else { "failed" };
            WarehouseError::Transport(format!("{:?} {url} {reason}: {e}", request.method))
        })?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| WarehouseError::Transport(format!("reading body from {url}: {e}")))?;
        tracing::debug!(status, bytes = body.len(), "shipstation response");

        Ok(ApiResponse { status, body })
    }
}
