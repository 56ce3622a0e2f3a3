//! Identity-provider seam: `verify(credential) -> Claims | VerifyError`.
//!
//! The Authenticator only depends on this trait, so it can run against an
//! in-memory verifier in tests and against Auth0 in production.

use async_trait::async_trait;
use thiserror::Error;

/// Decoded claim set of a verified access token.
pub type Claims = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Error)]
pub enum VerifyError {
    /// The credential itself is bad (signature, issuer, audience, expiry, format).
    #[error("{0}")]
    Rejected(String),

    /// The credential is valid but the provider refused it for lack of scope.
    #[error("{0}")]
    InsufficientScope(String),

    /// Anything else (provider unreachable, unexpected payloads, ...).
    #[error("identity provider failure: {0:#}")]
    Unexpected(anyhow::Error),
}

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify signature / iss / aud / exp of `token` and return its claims.
    async fn verify(&self, token: &str) -> Result<Claims, VerifyError>;
}
