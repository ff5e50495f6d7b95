//! Liquidity Provider Client
//!
//! Typed access to a provider's REST API over an injected [`HttpClient`].
//! Bodies are checked for required fields before typed decoding so a
//! malformed answer fails with the list of what was missing.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::clock::Sleeper;
use crate::common::error::{FlyoverError, Result};
use crate::retry::{retry, RetryPolicy};
use crate::types::{
    require_fields, AcceptedQuote, PeginQuoteRequest, PeginQuoteResponse, PeginQuoteStatus,
    PegoutQuoteRequest, PegoutQuoteResponse, PegoutQuoteStatus,
};

/// Header carrying the captcha token on quote acceptance
pub const CAPTCHA_HEADER: &str = "X-Captcha-Token";

/// HTTP transport errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpError {
    #[error("request to {url} failed: {detail}")]
    Transport { url: String, detail: String },

    #[error("{url} answered {status}: {body}")]
    Status { url: String, status: u16, body: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub include_captcha: bool,
}

/// Minimal HTTP transport; request and response bodies are JSON text
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &str) -> std::result::Result<String, HttpError>;

    async fn post(
        &self,
        url: &str,
        body: &str,
        options: RequestOptions,
    ) -> std::result::Result<String, HttpError>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Client,
    captcha_token: Option<String>,
}

impl ReqwestHttpClient {
    pub fn new(captcha_token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            captcha_token,
        }
    }

    async fn finish(url: &str, resp: reqwest::Response) -> std::result::Result<String, HttpError> {
        let status = resp.status();
        let body = resp.text().await.map_err(|e| HttpError::Transport {
            url: url.to_string(),
            detail: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(HttpError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str) -> std::result::Result<String, HttpError> {
        let resp = self.client.get(url).send().await.map_err(|e| HttpError::Transport {
            url: url.to_string(),
            detail: e.to_string(),
        })?;
        Self::finish(url, resp).await
    }

    async fn post(
        &self,
        url: &str,
        body: &str,
        options: RequestOptions,
    ) -> std::result::Result<String, HttpError> {
        let mut request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string());
        if options.include_captcha {
            if let Some(token) = &self.captcha_token {
                request = request.header(CAPTCHA_HEADER, token);
            }
        }

        let resp = request.send().await.map_err(|e| HttpError::Transport {
            url: url.to_string(),
            detail: e.to_string(),
        })?;
        Self::finish(url, resp).await
    }
}

/// Provider API client
#[derive(Clone)]
pub struct LpsClient {
    http: Arc<dyn HttpClient>,
    sleeper: Arc<dyn Sleeper>,
    status_retry: RetryPolicy,
}

impl LpsClient {
    pub fn new(http: Arc<dyn HttpClient>, sleeper: Arc<dyn Sleeper>, status_retry: RetryPolicy) -> Self {
        Self {
            http,
            sleeper,
            status_retry,
        }
    }

    /// `GET /pegin/status`, retried per policy
    pub async fn pegin_status(&self, base_url: &str, quote_hash: &str) -> Result<PeginQuoteStatus> {
        self.status(base_url, "pegin", quote_hash).await
    }

    /// `GET /pegout/status`, retried per policy
    pub async fn pegout_status(&self, base_url: &str, quote_hash: &str) -> Result<PegoutQuoteStatus> {
        self.status(base_url, "pegout", quote_hash).await
    }

    async fn status<T: DeserializeOwned>(&self, base_url: &str, direction: &str, quote_hash: &str) -> Result<T> {
        let base_url = base_url.trim_end_matches('/');
        let url = format!("{}/{}/status?quoteHash={}", base_url, direction, quote_hash);

        let body = retry(&self.status_retry, self.sleeper.as_ref(), || self.http.get(&url))
            .await
            .map_err(|e| {
                warn!(target: "flyover::lps", url = %url, error = %e, "status fetch exhausted retries");
                FlyoverError::LpsDidNotReturnStatus {
                    server_url: base_url.to_string(),
                    detail: e.to_string(),
                }
            })?;

        decode(base_url, &body, &["detail", "status"])
    }

    /// `POST /pegin/getQuote`
    pub async fn pegin_quotes(&self, base_url: &str, request: &PeginQuoteRequest) -> Result<Vec<PeginQuoteResponse>> {
        self.quotes(base_url, "pegin", serialize(request)?).await
    }

    /// `POST /pegout/getQuotes`
    pub async fn pegout_quotes(&self, base_url: &str, request: &PegoutQuoteRequest) -> Result<Vec<PegoutQuoteResponse>> {
        self.quotes(base_url, "pegout", serialize(request)?).await
    }

    async fn quotes<T: DeserializeOwned>(&self, base_url: &str, direction: &str, body: String) -> Result<Vec<T>> {
        let base_url = base_url.trim_end_matches('/');
        let route = if direction == "pegin" { "getQuote" } else { "getQuotes" };
        let url = format!("{}/{}/{}", base_url, direction, route);
        debug!(target: "flyover::lps", url = %url, "requesting quotes");

        let raw = self
            .http
            .post(&url, &body, RequestOptions::default())
            .await
            .map_err(|e| invalid_response(base_url, e))?;

        let values: Vec<serde_json::Value> = serde_json::from_str(&raw).map_err(|e| invalid_response(base_url, e))?;
        for value in &values {
            require_fields(value, &["quote", "quoteHash"])?;
        }
        serde_json::from_str(&raw).map_err(|e| invalid_response(base_url, e))
    }

    /// `POST /pegin/acceptQuote`, captcha protected
    pub async fn accept_pegin_quote(&self, base_url: &str, quote_hash: &str) -> Result<AcceptedQuote> {
        self.accept(base_url, "pegin", quote_hash, &["signature", "bitcoinDepositAddressHash"])
            .await
    }

    /// `POST /pegout/acceptQuote`, captcha protected
    pub async fn accept_pegout_quote(&self, base_url: &str, quote_hash: &str) -> Result<AcceptedQuote> {
        self.accept(base_url, "pegout", quote_hash, &["signature", "lbcAddress"])
            .await
    }

    async fn accept(&self, base_url: &str, direction: &str, quote_hash: &str, required: &[&str]) -> Result<AcceptedQuote> {
        let base_url = base_url.trim_end_matches('/');
        let url = format!("{}/{}/acceptQuote", base_url, direction);
        let body = serde_json::json!({ "quoteHash": quote_hash }).to_string();

        let raw = self
            .http
            .post(&url, &body, RequestOptions { include_captcha: true })
            .await
            .map_err(|e| invalid_response(base_url, e))?;

        decode(base_url, &raw, required)
    }
}

/// Encode straight to text; `serde_json::Value` cannot hold a u128 above u64::MAX
fn serialize<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| FlyoverError::InvalidLpsResponse {
        server_url: String::new(),
        detail: format!("unserializable request: {}", e),
    })
}

fn invalid_response(server_url: &str, e: impl std::fmt::Display) -> FlyoverError {
    FlyoverError::InvalidLpsResponse {
        server_url: server_url.to_string(),
        detail: e.to_string(),
    }
}

/// Check required fields on the raw body, then decode from the original
/// text so large integers keep their full precision.
fn decode<T: DeserializeOwned>(server_url: &str, raw: &str, required: &[&str]) -> Result<T> {
    let value: serde_json::Value = serde_json::from_str(raw).map_err(|e| invalid_response(server_url, e))?;
    require_fields(&value, required)?;
    serde_json::from_str(raw).map_err(|e| invalid_response(server_url, e))
}
