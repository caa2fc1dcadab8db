//! reqwest-backed transport.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::{HttpRequest, HttpResponse, Method, Transport};

pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    /// Build a client with a bounded per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = match request.method {
            Method::Get => self.http.get(&request.url),
            Method::Post => self.http.post(&request.url),
        };

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(cookie) = request.cookie_header() {
            builder = builder.header(COOKIE, cookie);
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if !request.form.is_empty() {
            builder = builder.form(&request.form);
        }

        debug!(method = %request.method, url = %request.url, "Sending request");

        let resp = builder
            .send()
            .await
            .with_context(|| format!("{} {} failed", request.method, request.url))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {}", request.url))?;

        debug!(url = %request.url, status, bytes = body.len(), "Response received");

        Ok(HttpResponse { status, body })
    }
}
