use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::state::AppState;

use super::Session;

/// Handler で Session を (あれば) 受け取るための extractor
/// middleware が Session を request.extensions() に insert 済みである前提
/// 見つからない場合は None (scope 判定では「scope なし」として扱う)
pub struct MaybeSession(pub Option<Session>);

impl FromRequestParts<AppState> for MaybeSession
where
    AppState: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeSession(parts.extensions.get::<Session>().cloned()))
    }
}
