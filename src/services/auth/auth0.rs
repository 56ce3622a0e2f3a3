use std::time::{Duration, Instant};

use anyhow::{Context, anyhow, bail};
use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};

use super::verifier::{Claims, TokenVerifier, VerifyError};

// Key set fetches (cold start included) happen at most this often.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct OidcDiscovery {
    issuer: String,
    jwks_uri: String,
}

struct RemoteKeys {
    http: reqwest::Client,
    discovery_url: String,
}

/// RS256 access-token verifier for an Auth0 tenant.
///
/// - issuer: `https://{domain}/`
/// - signing keys: `jwks_uri` from the tenant's OIDC discovery document, loaded lazily
/// - refreshes are single-flight: one fetch at a time, at most one per `MIN_REFRESH_INTERVAL`
/// - `iss` / `aud` / `exp` / `nbf` checked by `jsonwebtoken::Validation`
pub struct Auth0Verifier {
    issuer: String,
    validation: Validation,
    remote: Option<RemoteKeys>,
    keys: RwLock<Option<JwkSet>>,
    // Holds the start of the last fetch attempt, successful or not
    last_refresh: Mutex<Option<Instant>>,
}

impl std::fmt::Debug for Auth0Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auth0Verifier")
            .field("issuer", &self.issuer)
            .field("validation", &self.validation)
            .finish()
    }
}

impl Auth0Verifier {
    pub fn new(domain: &str, audience: &str, leeway_seconds: u64, http: reqwest::Client) -> Self {
        let issuer = issuer_for(domain);
        let discovery_url = format!("{issuer}.well-known/openid-configuration");
        let remote = RemoteKeys {
            http,
            discovery_url,
        };
        Self::build(issuer, audience, leeway_seconds, Some(remote), None)
    }

    /// Verifier with a fixed key set and no network access.
    #[cfg(test)]
    pub fn with_keys(domain: &str, audience: &str, leeway_seconds: u64, set: JwkSet) -> Self {
        Self::build(issuer_for(domain), audience, leeway_seconds, None, Some(set))
    }

    /// Verifier that discovers keys from an explicit discovery document URL.
    #[cfg(test)]
    fn with_discovery_url(
        domain: &str,
        audience: &str,
        http: reqwest::Client,
        discovery_url: String,
    ) -> Self {
        let remote = RemoteKeys {
            http,
            discovery_url,
        };
        Self::build(issuer_for(domain), audience, 0, Some(remote), None)
    }

    fn build(
        issuer: String,
        audience: &str,
        leeway_seconds: u64,
        remote: Option<RemoteKeys>,
        keys: Option<JwkSet>,
    ) -> Self {
        Self {
            validation: validation(&issuer, audience, leeway_seconds),
            issuer,
            remote,
            keys: RwLock::new(keys),
            last_refresh: Mutex::new(None),
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    async fn cached_key(&self, kid: &str) -> Option<Jwk> {
        self.keys.read().await.as_ref()?.find(kid).cloned()
    }

    async fn signing_key(&self, kid: &str) -> Result<Jwk, VerifyError> {
        if let Some(jwk) = self.cached_key(kid).await {
            return Ok(jwk);
        }

        let unknown_kid = || VerifyError::Rejected(format!("no signing key found for kid {kid:?}"));
        let Some(remote) = self.remote.as_ref() else {
            return Err(unknown_kid());
        };

        let mut last_refresh = self.last_refresh.lock().await;

        // Another request may have refreshed while this one waited.
        if let Some(jwk) = self.cached_key(kid).await {
            return Ok(jwk);
        }

        if (*last_refresh).is_some_and(|at| at.elapsed() < MIN_REFRESH_INTERVAL) {
            if self.keys.read().await.is_none() {
                return Err(VerifyError::Unexpected(anyhow!(
                    "signing keys unavailable: last fetch failed, retrying after {}s",
                    MIN_REFRESH_INTERVAL.as_secs()
                )));
            }
            return Err(unknown_kid());
        }

        *last_refresh = Some(Instant::now());
        let set = self
            .fetch_keys(remote)
            .await
            .map_err(VerifyError::Unexpected)?;
        let found = set.find(kid).cloned();

        tracing::info!(issuer = %self.issuer, keys = set.keys.len(), "signing keys refreshed");
        *self.keys.write().await = Some(set);

        found.ok_or_else(unknown_kid)
    }

    async fn fetch_keys(&self, remote: &RemoteKeys) -> anyhow::Result<JwkSet> {
        let discovery: OidcDiscovery = remote
            .http
            .get(&remote.discovery_url)
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .with_context(|| format!("fetching {}", remote.discovery_url))?
            .json()
            .await
            .context("decoding OIDC discovery document")?;

        if discovery.issuer != self.issuer {
            bail!(
                "discovery issuer mismatch: expected {}, got {}",
                self.issuer,
                discovery.issuer
            );
        }

        remote
            .http
            .get(&discovery.jwks_uri)
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .with_context(|| format!("fetching {}", discovery.jwks_uri))?
            .json::<JwkSet>()
            .await
            .context("decoding JWKS")
    }
}

#[async_trait]
impl TokenVerifier for Auth0Verifier {
    async fn verify(&self, token: &str) -> Result<Claims, VerifyError> {
        let header = decode_header(token).map_err(rejected)?;
        let kid = header
            .kid
            .ok_or_else(|| VerifyError::Rejected("token header is missing \"kid\"".into()))?;

        let jwk = self.signing_key(&kid).await?;
        let key = DecodingKey::from_jwk(&jwk).map_err(rejected)?;

        let data = decode::<Claims>(token, &key, &self.validation).map_err(rejected)?;
        Ok(data.claims)
    }
}

fn issuer_for(domain: &str) -> String {
    let domain = domain
        .trim()
        .trim_start_matches("https://")
        .trim_end_matches('/');
    format!("https://{domain}/")
}

fn validation(issuer: &str, audience: &str, leeway_seconds: u64) -> Validation {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_issuer(&[issuer]);
    validation.set_audience(&[audience]);
    validation.leeway = leeway_seconds;
    validation.validate_nbf = true;
    validation
}

fn rejected(err: jsonwebtoken::errors::Error) -> VerifyError {
    let message = match err.kind() {
        ErrorKind::ExpiredSignature => "token has expired".to_string(),
        ErrorKind::ImmatureSignature => "token is not yet valid".to_string(),
        ErrorKind::InvalidSignature => "signature verification failed".to_string(),
        ErrorKind::InvalidIssuer => "unexpected \"iss\" claim value".to_string(),
        ErrorKind::InvalidAudience => "unexpected \"aud\" claim value".to_string(),
        ErrorKind::InvalidAlgorithm => "unsupported token algorithm".to_string(),
        ErrorKind::MissingRequiredClaim(claim) => format!("missing required \"{claim}\" claim"),
        _ => format!("invalid token: {err}"),
    };
    VerifyError::Rejected(message)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::{Json, Router, routing::get};
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::{Value, json};

    use super::*;

    const PRIVATE_KEY: &[u8] = include_bytes!("testdata/rs256_private.pem");
    const JWKS: &str = include_str!("testdata/jwks.json");
    const DOMAIN: &str = "tenant.example.auth0.com";
    const AUDIENCE: &str = "https://mcp.example.com";

    fn verifier() -> Auth0Verifier {
        let set: JwkSet = serde_json::from_str(JWKS).unwrap();
        Auth0Verifier::with_keys(DOMAIN, AUDIENCE, 0, set)
    }

    fn now() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    fn sign(kid: &str, claims: &Value) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(kid.to_string());
        let key = EncodingKey::from_rsa_pem(PRIVATE_KEY).unwrap();
        encode(&header, claims, &key).unwrap()
    }

    fn valid_claims() -> Value {
        json!({
            "iss": format!("https://{DOMAIN}/"),
            "aud": [AUDIENCE, format!("https://{DOMAIN}/userinfo")],
            "sub": "auth0|u1",
            "azp": "client-1",
            "scope": "tool:greet",
            "exp": now() + 600,
        })
    }

    fn rejection_message(err: VerifyError) -> String {
        match err {
            VerifyError::Rejected(message) => message,
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn issuer_is_normalized_from_domain() {
        assert_eq!(issuer_for("tenant.auth0.com"), "https://tenant.auth0.com/");
        assert_eq!(issuer_for("https://tenant.auth0.com/"), "https://tenant.auth0.com/");
    }

    #[tokio::test]
    async fn accepts_token_signed_by_known_key() {
        let token = sign("test-key-1", &valid_claims());

        let claims = verifier().verify(&token).await.unwrap();
        assert_eq!(claims["sub"], "auth0|u1");
        assert_eq!(claims["scope"], "tool:greet");
    }

    #[tokio::test]
    async fn rejects_wrong_audience() {
        let mut claims = valid_claims();
        claims["aud"] = json!("https://someone-else.example.com");
        let token = sign("test-key-1", &claims);

        let err = verifier().verify(&token).await.unwrap_err();
        assert_eq!(rejection_message(err), "unexpected \"aud\" claim value");
    }

    #[tokio::test]
    async fn rejects_wrong_issuer() {
        let mut claims = valid_claims();
        claims["iss"] = json!("https://evil.example.com/");
        let token = sign("test-key-1", &claims);

        let err = verifier().verify(&token).await.unwrap_err();
        assert_eq!(rejection_message(err), "unexpected \"iss\" claim value");
    }

    #[tokio::test]
    async fn rejects_expired_token() {
        let mut claims = valid_claims();
        claims["exp"] = json!(now() - 3600);
        let token = sign("test-key-1", &claims);

        let err = verifier().verify(&token).await.unwrap_err();
        assert_eq!(rejection_message(err), "token has expired");
    }

    #[tokio::test]
    async fn rejects_unknown_kid_without_network() {
        let token = sign("rotated-key", &valid_claims());

        let err = verifier().verify(&token).await.unwrap_err();
        assert!(rejection_message(err).contains("rotated-key"));
    }

    #[tokio::test]
    async fn rejects_garbage() {
        let err = verifier().verify("not-a-jwt").await.unwrap_err();
        assert!(matches!(err, VerifyError::Rejected(_)));
    }

    #[tokio::test]
    async fn rejects_tampered_payload() {
        let token = sign("test-key-1", &valid_claims());
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = sign("test-key-1", &json!({"sub": "admin"}));
        let forged_payload = forged.split('.').nth(1).unwrap().to_string();
        parts[1] = &forged_payload;

        let err = verifier().verify(&parts.join(".")).await.unwrap_err();
        assert!(matches!(err, VerifyError::Rejected(_)));
    }

    #[derive(Default)]
    struct IdpHits {
        discovery: AtomicUsize,
        jwks: AtomicUsize,
    }

    /// Local stand-in for the tenant's discovery and JWKS endpoints.
    async fn spawn_idp(issuer: String) -> (String, Arc<IdpHits>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let hits = Arc::new(IdpHits::default());
        let document = json!({"issuer": issuer, "jwks_uri": format!("{base}/jwks")});

        let discovery_hits = hits.clone();
        let jwks_hits = hits.clone();
        let app = Router::new()
            .route(
                "/.well-known/openid-configuration",
                get(move || {
                    let hits = discovery_hits.clone();
                    let document = document.clone();
                    async move {
                        hits.discovery.fetch_add(1, Ordering::SeqCst);
                        // Keep concurrent callers waiting on the same fetch
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Json(document)
                    }
                }),
            )
            .route(
                "/jwks",
                get(move || {
                    let hits = jwks_hits.clone();
                    async move {
                        hits.jwks.fetch_add(1, Ordering::SeqCst);
                        Json(serde_json::from_str::<Value>(JWKS).unwrap())
                    }
                }),
            );
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        (format!("{base}/.well-known/openid-configuration"), hits)
    }

    fn remote_verifier(discovery_url: String) -> Arc<Auth0Verifier> {
        Arc::new(Auth0Verifier::with_discovery_url(
            DOMAIN,
            AUDIENCE,
            reqwest::Client::new(),
            discovery_url,
        ))
    }

    #[tokio::test]
    async fn concurrent_cold_start_fetches_keys_once() {
        let (url, hits) = spawn_idp(format!("https://{DOMAIN}/")).await;
        let verifier = remote_verifier(url);
        let token = sign("test-key-1", &valid_claims());

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let verifier = verifier.clone();
                let token = token.clone();
                tokio::spawn(async move { verifier.verify(&token).await })
            })
            .collect();
        for task in tasks {
            let claims = task.await.unwrap().unwrap();
            assert_eq!(claims["sub"], "auth0|u1");
        }

        assert_eq!(hits.discovery.load(Ordering::SeqCst), 1);
        assert_eq!(hits.jwks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_kids_within_interval_do_not_refetch() {
        let (url, hits) = spawn_idp(format!("https://{DOMAIN}/")).await;
        let verifier = remote_verifier(url);

        verifier
            .verify(&sign("test-key-1", &valid_claims()))
            .await
            .unwrap();
        for kid in ["rotated-1", "rotated-2", "rotated-3"] {
            let err = verifier
                .verify(&sign(kid, &valid_claims()))
                .await
                .unwrap_err();
            assert!(rejection_message(err).contains(kid));
        }

        assert_eq!(hits.discovery.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_fetch_backs_off() {
        let (url, hits) = spawn_idp("https://impostor.example.com/".to_string()).await;
        let verifier = remote_verifier(url);
        let token = sign("test-key-1", &valid_claims());

        let first = verifier.verify(&token).await.unwrap_err();
        assert!(first.to_string().contains("discovery issuer mismatch"));

        let second = verifier.verify(&token).await.unwrap_err();
        assert!(matches!(second, VerifyError::Unexpected(_)));
        assert!(second.to_string().contains("signing keys unavailable"));

        assert_eq!(hits.discovery.load(Ordering::SeqCst), 1);
        assert_eq!(hits.jwks.load(Ordering::SeqCst), 0);
    }
}
