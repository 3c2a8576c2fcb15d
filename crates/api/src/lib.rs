//! Console API client utilities.
//!
//! This module provides a lightweight client for the administrative console
//! backend. It focuses on:
//!
//! - Constructing an HTTP client with sensible defaults
//! - Reading the base URL and bearer token from the environment
//! - Validating `DICTUM_API_BASE` for safety
//! - Unwrapping the console's `{ code, msg, data }` response envelope
//!
//! The primary entry point is [`ConsoleClient`]. Create an instance via
//! [`ConsoleClient::new_from_env`], and then fetch payloads with
//! [`ConsoleClient::get_json`].
//!
//! # Example
//!
//! ```ignore
//! use dictum_api::ConsoleClient;
//!
//! async fn statuses() -> Result<serde_json::Value, dictum_api::ApiError> {
//!     let client = ConsoleClient::new_from_env()?;
//!     client.get_json("/sys/dict/status").await
//! }
//! ```

use std::env;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Url, header};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Environment variable holding the console base URL.
pub const API_BASE_ENV: &str = "DICTUM_API_BASE";
/// Environment variable holding an optional bearer token.
pub const API_TOKEN_ENV: &str = "DICTUM_API_TOKEN";
/// Base URL used when `DICTUM_API_BASE` is unset.
pub const DEFAULT_API_BASE: &str = "http://localhost:8080";
/// Envelope codes that denote success.
const SUCCESS_CODES: &[i64] = &[0, 200];
/// Hostnames allowed for local development regardless of scheme.
const LOCALHOST_DOMAINS: &[&str] = &["localhost", "127.0.0.1"];

/// Errors surfaced by console API calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The configured base URL is unusable.
    #[error("invalid DICTUM_API_BASE '{base}': {reason}")]
    InvalidBaseUrl { base: String, reason: String },
    /// The bearer token contains characters that cannot appear in a header.
    #[error("DICTUM_API_TOKEN is not a valid header value")]
    InvalidToken,
    /// Network or protocol failure reported by the HTTP client.
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The server answered with a non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    /// The response envelope carried a failure code.
    #[error("request rejected with code {code}: {message}")]
    Rejected { code: i64, message: String },
    /// The body was not valid JSON.
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
/// Thin wrapper around a configured `reqwest::Client` for console access.
///
/// The client pre-configures default headers and builds requests against a
/// validated base URL.
pub struct ConsoleClient {
    pub base_url: String,
    pub http: Client,
    pub user_agent: String,
}

impl ConsoleClient {
    /// Construct a [`ConsoleClient`] from `DICTUM_API_BASE` and
    /// `DICTUM_API_TOKEN`.
    pub fn new_from_env() -> Result<Self, ApiError> {
        let base_url = env::var(API_BASE_ENV).unwrap_or_else(|_| DEFAULT_API_BASE.into());
        let api_token = env::var(API_TOKEN_ENV).ok().filter(|token| !token.trim().is_empty());
        Self::new(base_url, api_token)
    }

    /// Construct a client for an explicit base URL and optional bearer token.
    pub fn new(base_url: impl Into<String>, api_token: Option<String>) -> Result<Self, ApiError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        validate_base_url(&base_url)?;

        let mut default_headers = header::HeaderMap::new();
        if let Some(api_token) = api_token {
            let authorization_header_value = format!("Bearer {}", api_token);
            let value = header::HeaderValue::from_str(&authorization_header_value).map_err(|_| ApiError::InvalidToken)?;
            default_headers.insert(header::AUTHORIZATION, value);
        }
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(default_headers)
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            base_url,
            http,
            user_agent: format!("dictum/0.1; {}", env::consts::OS),
        })
    }

    /// Build a `reqwest::RequestBuilder` for a method and API-relative path.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "building request");

        self.http
            .request(method, url)
            .header(header::USER_AGENT, &self.user_agent)
    }

    /// GET an API-relative path and return the unwrapped payload.
    pub async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        let response = self.request(Method::GET, path).send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        let body: Value = serde_json::from_str(&text)?;
        unwrap_envelope(body)
    }
}

/// Strip the console's `{ code, msg, data }` envelope.
///
/// Bodies without a `code` member are returned unchanged. A success code
/// yields `data` (JSON `null` when absent); any other code becomes
/// [`ApiError::Rejected`] carrying `msg`.
pub fn unwrap_envelope(body: Value) -> Result<Value, ApiError> {
    let Value::Object(mut envelope) = body else {
        return Ok(body);
    };
    let Some(code) = envelope.get("code") else {
        return Ok(Value::Object(envelope));
    };
    let code = code.as_i64().or_else(|| code.as_str().and_then(|text| text.parse().ok()));
    match code {
        Some(code) if SUCCESS_CODES.contains(&code) => Ok(envelope.remove("data").unwrap_or(Value::Null)),
        code => Err(ApiError::Rejected {
            code: code.unwrap_or(-1),
            message: envelope
                .get("msg")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        }),
    }
}

/// Validate that a base URL is acceptable for use by the client.
///
/// Rules:
/// - `localhost` or `127.0.0.1`: `http` or `https`
/// - otherwise: scheme must be HTTPS
fn validate_base_url(base: &str) -> Result<(), ApiError> {
    let invalid = |reason: String| ApiError::InvalidBaseUrl {
        base: base.to_string(),
        reason,
    };
    let parsed_base_url = Url::parse(base).map_err(|error| invalid(error.to_string()))?;
    let host_name = parsed_base_url
        .host_str()
        .ok_or_else(|| invalid("must include a host".into()))?;

    let scheme = parsed_base_url.scheme();
    if LOCALHOST_DOMAINS
        .iter()
        .any(|&allowed| host_name.eq_ignore_ascii_case(allowed))
    {
        return match scheme {
            "http" | "https" => Ok(()),
            other => Err(invalid(format!("unsupported scheme '{}://'", other))),
        };
    }

    if scheme != "https" {
        return Err(invalid(format!("must use https for non-localhost hosts; got '{}://'", scheme)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_success_returns_data() {
        let body = json!({"code": 0, "msg": "ok", "data": {"total": 1, "rows": [{"label": "A"}]}});
        let data = unwrap_envelope(body).expect("success envelope");
        assert_eq!(data, json!({"total": 1, "rows": [{"label": "A"}]}));
    }

    #[test]
    fn envelope_failure_code_is_rejected() {
        let body = json!({"code": 401, "msg": "session expired"});
        match unwrap_envelope(body) {
            Err(ApiError::Rejected { code, message }) => {
                assert_eq!(code, 401);
                assert_eq!(message, "session expired");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn bodies_without_code_pass_through() {
        let list = json!([{"id": 1}]);
        assert_eq!(unwrap_envelope(list.clone()).expect("bare list"), list);
        let object = json!({"rows": []});
        assert_eq!(unwrap_envelope(object.clone()).expect("bare object"), object);
    }

    #[test]
    fn base_url_rules() {
        assert!(validate_base_url("http://localhost:8080").is_ok());
        assert!(validate_base_url("https://console.example.com").is_ok());
        assert!(validate_base_url("http://console.example.com").is_err());
        assert!(validate_base_url("not a url").is_err());
        assert!(validate_base_url("ftp://127.0.0.1").is_err());
    }

    #[test]
    fn request_joins_base_and_path() {
        let client = ConsoleClient::new("http://localhost:8080/", None).expect("client");
        let request = client.request(Method::GET, "/sys/dict/status").build().expect("build request");
        assert_eq!(request.url().as_str(), "http://localhost:8080/sys/dict/status");
    }

    #[tokio::test]
    async fn https_requests_reach_the_connector() {
        let client = ConsoleClient::new("https://127.0.0.1:9", None).expect("client");
        let error = client.get_json("/sys/dict/status").await.expect_err("nothing listens on port 9");
        assert!(matches!(error, ApiError::Transport(_)));
        assert!(
            !format!("{:?}", error).contains("scheme is not http"),
            "https must be supported by the transport: {:?}",
            error
        );
    }
}
