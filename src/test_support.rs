//! Shared fixtures for unit tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::api::mcp::extractors::{Session, SessionExtra};
use crate::services::auth::{Authenticator, Claims, ProtectedResource, TokenVerifier, VerifyError};
use crate::services::tools::{ToolRegistry, register_tools};
use crate::state::AppState;

enum Outcome {
    Accept(Claims),
    Fail(fn() -> VerifyError),
}

/// In-memory verifier keyed by the raw credential.
#[derive(Default)]
pub struct StubVerifier {
    outcomes: HashMap<String, Outcome>,
}

impl StubVerifier {
    pub fn accept(mut self, token: &str, claims: Claims) -> Self {
        self.outcomes.insert(token.to_string(), Outcome::Accept(claims));
        self
    }

    pub fn fail(mut self, token: &str, err: fn() -> VerifyError) -> Self {
        self.outcomes.insert(token.to_string(), Outcome::Fail(err));
        self
    }
}

#[async_trait]
impl TokenVerifier for StubVerifier {
    async fn verify(&self, token: &str) -> Result<Claims, VerifyError> {
        match self.outcomes.get(token) {
            Some(Outcome::Accept(claims)) => Ok(claims.clone()),
            Some(Outcome::Fail(err)) => Err(err()),
            None => Err(VerifyError::Rejected("invalid signature".into())),
        }
    }
}

pub fn claims(value: Value) -> Claims {
    match value {
        Value::Object(map) => map,
        other => panic!("claims must be a JSON object, got {other}"),
    }
}

pub fn session(sub: &str, scopes: &[&str]) -> Session {
    let mut extra = SessionExtra::new(sub);
    extra.client_id = Some("client-1".into());
    Session {
        token: format!("token-for-{sub}"),
        client_id: "client-1".into(),
        scopes: scopes.iter().map(|s| s.to_string()).collect(),
        expires_at: None,
        extra,
    }
}

pub fn server_url() -> Url {
    Url::parse("http://localhost:3001").unwrap()
}

pub fn app_state(verifier: StubVerifier) -> AppState {
    let mut registry = ToolRegistry::default();
    register_tools(&mut registry).unwrap();

    let resource = ProtectedResource::new(
        server_url(),
        "https://tenant.example.auth0.com/".to_string(),
        registry.scopes(),
    );

    AppState::new(
        Arc::new(Authenticator::new(Arc::new(verifier))),
        Arc::new(registry),
        Arc::new(resource),
    )
}
