// ABOUTME: Shared HTTP client with connection pooling for upstream API calls
// ABOUTME: Constructed once at startup with configured timeouts and injected into adapters
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

use homedash_core::constants::network::{
    DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS, DEFAULT_UPSTREAM_TIMEOUT_SECS, USER_AGENT,
};
use homedash_core::errors::{AdapterError, AdapterResult};
use reqwest::{Client, ClientBuilder, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Longest upstream error body kept in an error message
const MAX_ERROR_BODY_CHARS: usize = 256;

/// How an adapter authenticates against its upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiAuth<'a> {
    /// API key sent in a named header
    Header(&'static str, &'a str),
    /// `Authorization: Bearer <token>`
    Bearer(&'a str),
}

/// Pooled HTTP client shared by every adapter
///
/// Every request carries the configured deadline; expiry is reported as
/// [`AdapterError::Timeout`] so callers can answer with a gateway timeout.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    timeout_secs: u64,
}

impl UpstreamClient {
    /// Build a client with request and connect timeouts
    #[must_use]
    pub fn new(timeout_secs: u64, connect_timeout_secs: u64) -> Self {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            timeout_secs,
        }
    }

    /// Request deadline in seconds
    #[must_use]
    pub const fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// GET a JSON document from `base_url` + `path`
    ///
    /// # Errors
    ///
    /// Returns `Timeout` on deadline expiry, `Unreachable` when the connection
    /// fails, `Upstream` on a non-success status and `UnexpectedResponse` when
    /// the body does not decode as `T`
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        base_url: &str,
        path: &str,
        auth: ApiAuth<'_>,
    ) -> AdapterResult<T> {
        let response = self.send(Method::GET, base_url, path, auth).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AdapterError::from_reqwest(&e, self.timeout_secs))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| AdapterError::UnexpectedResponse(format!("{path}: {e}")))
    }

    /// GET an endpoint and only check that it answers with a success status
    ///
    /// # Errors
    ///
    /// Same classification as [`UpstreamClient::get_json`], minus decoding
    pub async fn probe(&self, base_url: &str, path: &str, auth: ApiAuth<'_>) -> AdapterResult<()> {
        self.send(Method::GET, base_url, path, auth).await.map(|_| ())
    }

    /// DELETE an upstream resource; any success status counts
    ///
    /// # Errors
    ///
    /// Same classification as [`UpstreamClient::get_json`], minus decoding
    pub async fn delete(&self, base_url: &str, path: &str, auth: ApiAuth<'_>) -> AdapterResult<()> {
        self.send(Method::DELETE, base_url, path, auth)
            .await
            .map(|_| ())
    }

    async fn send(
        &self,
        method: Method,
        base_url: &str,
        path: &str,
        auth: ApiAuth<'_>,
    ) -> AdapterResult<reqwest::Response> {
        let url = format!("{base_url}{path}");
        debug!(method = %method, url = %url, "Calling upstream");

        let request = Self::authorize(self.client.request(method, &url), auth);
        let response = request
            .send()
            .await
            .map_err(|e| AdapterError::from_reqwest(&e, self.timeout_secs))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = if body.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_owned()
        } else {
            body.chars().take(MAX_ERROR_BODY_CHARS).collect()
        };
        Err(AdapterError::Upstream {
            status: status.as_u16(),
            message,
        })
    }

    fn authorize(request: RequestBuilder, auth: ApiAuth<'_>) -> RequestBuilder {
        match auth {
            ApiAuth::Header(name, value) if !value.is_empty() => request.header(name, value),
            ApiAuth::Bearer(token) if !token.is_empty() => request.bearer_auth(token),
            ApiAuth::Header(..) | ApiAuth::Bearer(_) => request,
        }
    }
}

impl Default for UpstreamClient {
    fn default() -> Self {
        Self::new(
            DEFAULT_UPSTREAM_TIMEOUT_SECS,
            DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS,
        )
    }
}
