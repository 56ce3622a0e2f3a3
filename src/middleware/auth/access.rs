//! Bearer 認証 → Session を extensions に入れる
//!
//! - `Authorization: Bearer <jwt>` を Authenticator (Auth0 検証) に渡す
//! - 失敗時は Rejection を AppError (401 / 403 / 500) に変換して返す
//! - 成功時は Session を request extensions に格納し、handler へ渡す

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::state::AppState;

/// MCP endpoint に認証を掛けるための middleware を適用する。
///
/// 例：
/// ```ignore
/// let mcp = Router::new().route("/mcp", post(rpc));
/// let mcp = middleware::auth::access::apply(mcp, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    // 失敗のログは Authenticator 側で出力済み
    let session = state
        .authenticator
        .authenticate(req.headers())
        .await
        .map_err(|rejection| AppError::from_rejection(rejection, state.resource.metadata_url()))?;

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(session);

    Ok(next.run(req).await)
}
