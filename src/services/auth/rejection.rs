use thiserror::Error;

use super::verifier::VerifyError;

/// Why a request could not be turned into a `Session`.
///
/// - `InvalidToken`: missing / malformed header or a token that failed verification (401)
/// - `InsufficientScope`: valid token the identity provider refused for scope (403)
/// - `Internal`: anything unexpected; the detail is for logs only (500)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("insufficient scope: {0}")]
    InsufficientScope(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Rejection {
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken(message.into())
    }
}

impl From<VerifyError> for Rejection {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::Rejected(message) => Rejection::InvalidToken(message),
            VerifyError::InsufficientScope(message) => Rejection::InsufficientScope(message),
            unexpected @ VerifyError::Unexpected(_) => Rejection::Internal(unexpected.to_string()),
        }
    }
}
