/*
 * Responsibility
 * - GET /.well-known/oauth-protected-resource (RFC 9728, 認証なし)
 */
use axum::{Json, extract::State, response::IntoResponse};

use crate::state::AppState;

pub async fn protected_resource_metadata(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.resource.document().clone())
}
