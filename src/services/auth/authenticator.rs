//! Bearer token → `Session`.
//!
//! Steps:
//! 1. `Authorization` header must be present
//! 2. scheme must be `bearer` (case-insensitive) with a non-empty credential
//! 3. the credential is verified by the injected `TokenVerifier`
//! 4. `sub` and a client identifier (`client_id`, else `azp`) are required
//! 5. `scope` / `exp` / identity attributes are copied when present
//!
//! Every failure is logged here, before the middleware turns it into a response.

use std::sync::Arc;

use axum::http::{HeaderMap, header};
use serde_json::Value;

use crate::api::mcp::extractors::{Session, SessionExtra};

use super::rejection::Rejection;
use super::verifier::{Claims, TokenVerifier};

const MISSING_HEADER: &str = "Missing authorization header";
const INVALID_HEADER: &str = "Invalid authorization header";
const MISSING_SUB: &str = "Token is missing required subject (sub) claim";
const MISSING_CLIENT: &str =
    "Token is missing required client identification (client_id or azp claim).";

#[derive(Clone)]
pub struct Authenticator {
    verifier: Arc<dyn TokenVerifier>,
}

impl Authenticator {
    pub fn new(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { verifier }
    }

    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Session, Rejection> {
        let result = self.try_authenticate(headers).await;

        match &result {
            Ok(session) => {
                tracing::debug!(
                    sub = %session.subject(),
                    client_id = %session.client_id,
                    scopes = ?session.scopes,
                    "bearer token accepted"
                );
            }
            Err(Rejection::Internal(detail)) => {
                tracing::error!(error = %detail, "authentication failed unexpectedly");
            }
            Err(rejection) => {
                tracing::warn!(reason = %rejection, "authentication rejected");
            }
        }

        result
    }

    async fn try_authenticate(&self, headers: &HeaderMap) -> Result<Session, Rejection> {
        let token = bearer_credential(headers)?;
        let claims = self.verifier.verify(token).await?;
        session_from_claims(token, &claims)
    }
}

/// Extract the credential of an `Authorization: Bearer <token>` header.
fn bearer_credential(headers: &HeaderMap) -> Result<&str, Rejection> {
    let raw = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| Rejection::invalid_token(MISSING_HEADER))?
        .to_str()
        .map_err(|_| Rejection::invalid_token(INVALID_HEADER))?;

    let mut parts = raw.split(' ');
    let scheme = parts.next().unwrap_or_default();
    let credential = parts.next().unwrap_or_default();

    if !scheme.eq_ignore_ascii_case("bearer") || credential.is_empty() {
        return Err(Rejection::invalid_token(INVALID_HEADER));
    }

    Ok(credential)
}

/// Assemble a `Session` from verified claims.
pub fn session_from_claims(token: &str, claims: &Claims) -> Result<Session, Rejection> {
    let sub = non_empty_str(claims, "sub").ok_or_else(|| Rejection::invalid_token(MISSING_SUB))?;

    let client_id = non_empty_str(claims, "client_id")
        .or_else(|| non_empty_str(claims, "azp"))
        .ok_or_else(|| Rejection::invalid_token(MISSING_CLIENT))?;

    let scopes = match claims.get("scope") {
        Some(Value::String(scope)) => scope
            .split(' ')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };

    let mut extra = SessionExtra::new(sub);
    extra.client_id = non_empty_str(claims, "client_id").map(str::to_string);
    extra.azp = non_empty_str(claims, "azp").map(str::to_string);
    extra.name = non_empty_str(claims, "name").map(str::to_string);
    extra.email = non_empty_str(claims, "email").map(str::to_string);

    Ok(Session {
        token: token.to_string(),
        client_id: client_id.to_string(),
        scopes,
        expires_at: claims.get("exp").and_then(epoch_seconds),
        extra,
    })
}

fn non_empty_str<'a>(claims: &'a Claims, key: &str) -> Option<&'a str> {
    claims
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

// `exp` of 0 counts as absent.
fn epoch_seconds(value: &Value) -> Option<u64> {
    let secs = value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && *f >= 0.0)
            .map(|f| f as u64)
    })?;
    (secs != 0).then_some(secs)
}
