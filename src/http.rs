//! HTTP adapter for the interactions endpoint
//!
//! `POST {api_base}/api/interactions` with a PascalCase JSON body. Error
//! responses are read as RFC 7807 ProblemDetails when possible.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::committer::InteractionApi;
use crate::error::{InteractionError, Result};
use crate::types::InteractionRequest;

pub const DEFAULT_API_BASE: &str = "http://localhost:8080";

/// Request body as the backend DTO expects it
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InteractionPayload<'a> {
    pub article_id: i64,
    #[serde(rename = "Type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'a str>,
}

impl<'a> From<&'a InteractionRequest> for InteractionPayload<'a> {
    fn from(request: &'a InteractionRequest) -> Self {
        Self {
            article_id: request.article_id.0,
            kind: request.kind.wire_code(),
            reason: request.reason.as_deref().filter(|r| !r.is_empty()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProblemDetails {
    title: Option<String>,
    detail: Option<String>,
    message: Option<String>,
    error_code: Option<String>,
    extensions: Option<ProblemExtensions>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProblemExtensions {
    error_code: Option<String>,
}

/// Turn a failed response into an error. 401 always means "sign in again".
pub fn parse_api_error(status: u16, body: &str) -> InteractionError {
    if status == StatusCode::UNAUTHORIZED.as_u16() {
        return InteractionError::Unauthenticated;
    }

    if body.trim().is_empty() {
        return InteractionError::Api {
            status,
            message: format!("Request failed ({status})"),
            code: None,
        };
    }

    match serde_json::from_str::<ProblemDetails>(body) {
        Ok(problem) => {
            let code = problem
                .extensions
                .and_then(|ext| ext.error_code)
                .or(problem.error_code);
            let message = problem
                .detail
                .or(problem.title)
                .or(problem.message)
                .or_else(|| code.clone())
                .unwrap_or_else(|| format!("Request failed ({status})"));

            InteractionError::Api {
                status,
                message,
                code,
            }
        }
        Err(_) => InteractionError::Api {
            status,
            message: body.to_string(),
            code: None,
        },
    }
}

pub struct HttpInteractionApi {
    base_url: String,
    http_client: reqwest::Client,
}

impl HttpInteractionApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InteractionError::Config(format!("HTTP client: {e}")))?;

        Ok(Self::with_client(base_url, http_client))
    }

    pub fn with_client(base_url: &str, http_client: reqwest::Client) -> Self {
        let trimmed = base_url.trim().trim_end_matches('/');
        let base_url = if trimmed.is_empty() {
            DEFAULT_API_BASE.to_string()
        } else {
            trimmed.to_string()
        };

        Self {
            base_url,
            http_client,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/interactions", self.base_url)
    }
}

#[async_trait]
impl InteractionApi for HttpInteractionApi {
    async fn post_interaction(
        &self,
        request: &InteractionRequest,
        access_token: Option<&str>,
    ) -> Result<()> {
        let url = self.endpoint();
        let mut builder = self
            .http_client
            .post(&url)
            .json(&InteractionPayload::from(request));

        if let Some(token) = access_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| InteractionError::Transport(format!("POST {url} failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            // 200 with or without JSON, 204: body is not used
            debug!(status = status.as_u16(), article_id = %request.article_id, "Interaction accepted");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(parse_api_error(status.as_u16(), &body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ArticleId, InteractionKind};

    #[test]
    fn test_payload_shape() {
        let request = InteractionRequest::new(ArticleId(42), InteractionKind::Discard);
        let json = serde_json::to_value(InteractionPayload::from(&request)).unwrap();
        assert_eq!(json, serde_json::json!({"ArticleId": 42, "Type": 2}));
    }

    #[test]
    fn test_payload_with_reason() {
        let request = InteractionRequest::report(ArticleId(5), Some("misleading".to_string()));
        let json = serde_json::to_value(InteractionPayload::from(&request)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"ArticleId": 5, "Type": 3, "Reason": "misleading"})
        );
    }

    #[test]
    fn test_unauthorized_maps_to_unauthenticated() {
        assert!(parse_api_error(401, "whatever").is_unauthenticated());
    }

    #[test]
    fn test_problem_details_precedence() {
        let body = r#"{"title":"Bad Request","detail":"Article not found","extensions":{"errorCode":"ARTICLE_NOT_FOUND"}}"#;
        match parse_api_error(400, body) {
            InteractionError::Api { status, message, code } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Article not found");
                assert_eq!(code.as_deref(), Some("ARTICLE_NOT_FOUND"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_code_only_problem() {
        match parse_api_error(409, r#"{"errorCode":"ALREADY_DISCARDED"}"#) {
            InteractionError::Api { message, code, .. } => {
                assert_eq!(message, "ALREADY_DISCARDED");
                assert_eq!(code.as_deref(), Some("ALREADY_DISCARDED"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_plain_text_and_empty_bodies() {
        match parse_api_error(500, "upstream exploded") {
            InteractionError::Api { message, .. } => assert_eq!(message, "upstream exploded"),
            other => panic!("unexpected error: {other:?}"),
        }
        match parse_api_error(503, "") {
            InteractionError::Api { message, .. } => assert_eq!(message, "Request failed (503)"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_base_url_trimmed() {
        let api = HttpInteractionApi::with_client("https://api.example.com///", reqwest::Client::new());
        assert_eq!(api.endpoint(), "https://api.example.com/api/interactions");

        let api = HttpInteractionApi::with_client("  ", reqwest::Client::new());
        assert_eq!(api.endpoint(), "http://localhost:8080/api/interactions");
    }
}
