/*
 * Responsibility
 * - HTTP 境界で返すエラー (AppError) の定義
 * - IntoResponse 実装 (status / WWW-Authenticate / JSON error body)
 * - 認証の Rejection を 401 / 403 / 500 に変換する
 */
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::services::auth::Rejection;
use crate::services::tools::RequiredScopes;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid token: {description}")]
    InvalidToken {
        description: String,
        resource_metadata: String,
    },
    #[error("insufficient scope")]
    InsufficientScope { challenge: Option<String> },
    #[error("internal server error")]
    Internal,
}

impl AppError {
    /// Boundary translation of an authentication `Rejection`.
    pub fn from_rejection(rejection: Rejection, resource_metadata: &Url) -> Self {
        match rejection {
            Rejection::InvalidToken(description) => AppError::InvalidToken {
                description,
                resource_metadata: resource_metadata.to_string(),
            },
            // Raised by the identity provider itself: no challenge to offer.
            Rejection::InsufficientScope(_) => AppError::InsufficientScope { challenge: None },
            Rejection::Internal(_) => AppError::Internal,
        }
    }

    /// Tool access gate denial (RFC 6750 step-up challenge).
    pub fn insufficient_scope(required: &RequiredScopes, resource_metadata: &Url) -> Self {
        let challenge = bearer_challenge(&[
            ("error", "insufficient_scope"),
            ("scope", required.to_scope_string().as_str()),
            ("resource_metadata", resource_metadata.as_str()),
        ]);
        AppError::InsufficientScope {
            challenge: Some(challenge),
        }
    }
}

/// `Bearer k1="v1", k2="v2"`.
///
/// Values are restricted to the RFC 6750 attribute charset
/// (`%x20-21 / %x23-5B / %x5D-7E`): `"` becomes `'`, control characters are
/// dropped and anything else outside the set (non-ASCII, `\`) becomes `?`.
pub fn bearer_challenge(params: &[(&str, &str)]) -> String {
    let params = params
        .iter()
        .map(|(k, v)| format!("{k}=\"{}\"", sanitize(v)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("Bearer {params}")
}

fn sanitize(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' => '\'',
            ' '..='~' if c != '\\' => c,
            _ => '?',
        })
        .collect()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, challenge) = match self {
            AppError::InvalidToken {
                description,
                resource_metadata,
            } => {
                let challenge = bearer_challenge(&[
                    ("error", "invalid_token"),
                    ("error_description", description.as_str()),
                    ("resource_metadata", resource_metadata.as_str()),
                ]);
                (
                    StatusCode::UNAUTHORIZED,
                    "invalid_token",
                    description,
                    Some(challenge),
                )
            }
            AppError::InsufficientScope { challenge } => (
                StatusCode::FORBIDDEN,
                "insufficient_scope",
                "insufficient scope".into(),
                challenge,
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                "internal server error".into(),
                None,
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };
        let mut response = (status, Json(body)).into_response();

        // Always visible ASCII after sanitize()
        if let Some(value) = challenge.and_then(|c| HeaderValue::from_str(&c).ok()) {
            response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
        }

        response
    }
}
