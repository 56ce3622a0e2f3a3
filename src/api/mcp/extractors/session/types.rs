/*
 * Responsibility
 * - Handler / tool から見える「認証済みセッション」の型
 * - middleware (Authenticator) が組み立てて request extensions に格納する
 *
 * Notes
 * - トークン検証や claim の解釈は services::auth 側の責務
 * - ここは型 (契約) のみ
 */
use std::fmt;

use serde::Serialize;

/// Identity attributes copied from the verified claims.
///
/// `sub` is always present; the rest only when the claim was a non-empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionExtra {
    pub sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub azp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl SessionExtra {
    pub fn new(sub: impl Into<String>) -> Self {
        Self {
            sub: sub.into(),
            client_id: None,
            azp: None,
            name: None,
            email: None,
        }
    }
}

/// Authenticated session for a single request.
///
/// - `client_id` is never empty (`client_id` claim, falling back to `azp`)
/// - `scopes` keeps claim order and duplicates
/// - `expires_at` is epoch seconds, only when the token carried `exp`
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub client_id: String,
    pub scopes: Vec<String>,
    pub expires_at: Option<u64>,
    pub extra: SessionExtra,
}

impl Session {
    pub fn subject(&self) -> &str {
        &self.extra.sub
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print the bearer credential
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("client_id", &self.client_id)
            .field("scopes", &self.scopes)
            .field("expires_at", &self.expires_at)
            .field("extra", &self.extra)
            .finish()
    }
}
