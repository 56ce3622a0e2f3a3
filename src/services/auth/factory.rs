/// Factory: build the `Authenticator` (backed by Auth0) from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::error::AppError;
use crate::services::auth::{Auth0Verifier, Authenticator};

pub fn build_authenticator(config: &Config) -> Result<(Arc<Authenticator>, String), AppError> {
    let http = reqwest::Client::builder()
        .timeout(config.idp_timeout)
        .build()
        .map_err(|e| {
            tracing::error!(error = %e, "failed to build identity provider HTTP client");
            AppError::Internal
        })?;

    let verifier = Auth0Verifier::new(
        &config.auth0_domain,
        &config.auth0_audience,
        config.access_token_leeway_seconds,
        http,
    );
    let issuer = verifier.issuer().to_string();

    Ok((Arc::new(Authenticator::new(Arc::new(verifier))), issuer))
}
