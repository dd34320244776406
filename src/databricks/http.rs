//! HTTP utilities for Unity Catalog REST API calls

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use super::models::ErrorResponse;
use crate::error::ApiError;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| c.is_control(), "")
}

/// Map a non-success response to an [`ApiError`]
///
/// Absence is signalled by HTTP 404 or by an error code ending in
/// `DOES_NOT_EXIST` (e.g. `CATALOG_DOES_NOT_EXIST`, `METASTORE_DOES_NOT_EXIST`).
pub fn error_from_response(status: u16, body: &str) -> ApiError {
    let parsed: ErrorResponse = serde_json::from_str(body).unwrap_or_default();
    let error_code = parsed.error_code.unwrap_or_default();
    let message = parsed
        .message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("HTTP {}", status));

    if status == StatusCode::NOT_FOUND.as_u16() || error_code.ends_with("DOES_NOT_EXIST") {
        ApiError::NotFound { message }
    } else if status == StatusCode::UNAUTHORIZED.as_u16() {
        ApiError::Unauthorized
    } else if status == StatusCode::FORBIDDEN.as_u16() {
        ApiError::PermissionDenied { message }
    } else if status == StatusCode::CONFLICT.as_u16() || error_code.ends_with("ALREADY_EXISTS") {
        ApiError::Conflict { message }
    } else {
        ApiError::Status {
            status,
            error_code,
            message,
        }
    }
}

/// Transport settings for the HTTP client
#[derive(Debug, Clone, Copy)]
pub struct HttpOptions {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// HTTP client wrapper for Unity Catalog API calls
#[derive(Clone)]
pub struct UcHttpClient {
    client: Client,
}

impl UcHttpClient {
    /// Create a new HTTP client
    pub fn new(options: HttpOptions) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!("ucprov/", env!("CARGO_PKG_VERSION")))
            .timeout(options.timeout)
            .connect_timeout(options.connect_timeout)
            .build()?;

        Ok(Self { client })
    }

    /// Make a GET request and decode the JSON response
    pub async fn get<T: DeserializeOwned>(&self, url: &Url, token: &str) -> Result<T, ApiError> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .bearer_auth(token)
            .send()
            .await?;

        Self::decode(response).await
    }

    /// Make a POST request with a JSON body and decode the JSON response
    pub async fn post<T: DeserializeOwned>(
        &self,
        url: &Url,
        token: &str,
        body: &Value,
    ) -> Result<T, ApiError> {
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(url.clone())
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(error_from_response(status.as_u16(), &body));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Format an API error for display
/// Avoids echoing raw API bodies back to the terminal
pub fn format_api_error(error: &ApiError) -> String {
    match error {
        ApiError::Unauthorized => {
            "Authentication failed. Check DATABRICKS_TOKEN or the token in your profile.".to_string()
        }
        ApiError::PermissionDenied { .. } => {
            "Permission denied. Check your Unity Catalog privileges (metastore admin or CREATE rights).".to_string()
        }
        ApiError::NotFound { .. } => "Resource not found.".to_string(),
        ApiError::Conflict { .. } => {
            "Resource conflict. The resource may already exist or be in use.".to_string()
        }
        ApiError::Status { status: 429, .. } => {
            "Rate limit exceeded. Please try again later.".to_string()
        }
        ApiError::Status { status: 400, message, .. } => {
            format!("Invalid request: {}", truncate(message, 120))
        }
        ApiError::Status { status, .. } if *status >= 500 => {
            "Unity Catalog service temporarily unavailable. Please try again.".to_string()
        }
        ApiError::Status { status, .. } => format!("Request failed with status {}.", status),
        ApiError::Transport(e) if e.is_timeout() => {
            "Request timed out. Check your network connection and try again.".to_string()
        }
        ApiError::Transport(_) => {
            "Request failed. Check your network connection and workspace host.".to_string()
        }
        ApiError::Json(_) => "Unexpected response from the Unity Catalog API.".to_string(),
        ApiError::Url(_) => "Invalid workspace URL.".to_string(),
        ApiError::InvalidName(name) => format!("'{}' is not a valid object name.", name),
    }
}

fn truncate(message: &str, max_chars: usize) -> String {
    let sanitized: String = message
        .chars()
        .filter(|c| !c.is_control())
        .take(max_chars)
        .collect();

    if sanitized.chars().count() < message.chars().count() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}
