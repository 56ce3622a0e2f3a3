//! CORS policy for browser-based MCP clients (e.g. an inspector UI).
//!
//! Policy:
//! - Development: any origin, WITHOUT credentials.
//! - Production: allowlist from `CORS_ALLOWED_ORIGINS`; empty allowlist allows none.
//! - `WWW-Authenticate` is exposed so browsers can read the OAuth challenge of a 401.

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::Config;

pub fn apply(router: Router, config: &Config) -> Router {
    let cors = if config.app_env.is_production() {
        let allowed: Vec<HeaderValue> = config
            .cors_allowed_origins
            .iter()
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();

        CorsLayer::new().allow_origin(AllowOrigin::list(allowed))
    } else {
        CorsLayer::new().allow_origin(Any)
    }
    .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
    .allow_headers([
        header::AUTHORIZATION,
        header::CONTENT_TYPE,
        header::ACCEPT,
        HeaderName::from_static("mcp-protocol-version"),
        HeaderName::from_static("mcp-session-id"),
        HeaderName::from_static("x-request-id"),
    ])
    .expose_headers([
        header::WWW_AUTHENTICATE,
        HeaderName::from_static("mcp-session-id"),
        HeaderName::from_static("x-request-id"),
    ])
    .max_age(std::time::Duration::from_secs(60 * 10));

    router.layer(cors)
}
