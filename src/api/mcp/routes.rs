/*
 * Responsibility
 * - MCP server の URL 構造を定義
 * - /health と /.well-known/oauth-protected-resource は認証なし
 * - /mcp だけに Bearer 認証 (middleware::auth::access) を掛ける
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::mcp::handlers::{
    discovery::protected_resource_metadata, health::health, rpc::rpc,
};
use crate::middleware;
use crate::services::auth::metadata::WELL_KNOWN_PATH;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let mcp = Router::new().route("/mcp", post(rpc));
    let mcp = middleware::auth::access::apply(mcp, state.clone());

    let mut public = Router::new()
        .route("/health", get(health))
        .route(WELL_KNOWN_PATH, get(protected_resource_metadata));

    // Path-suffixed variant when MCP_SERVER_URL carries a path
    let metadata_path = state.resource.metadata_path();
    if metadata_path != WELL_KNOWN_PATH {
        public = public.route(metadata_path, get(protected_resource_metadata));
    }

    public.merge(mcp)
}
