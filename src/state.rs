/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - authenticator: Bearer 検証 (Auth0)
 *   - tools: 登録済みツールと必要 scope
 *   - resource: RFC 9728 metadata / resource_metadata URL
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::services::auth::{Authenticator, ProtectedResource};
use crate::services::tools::ToolRegistry;

#[derive(Clone)]
pub struct AppState {
    pub authenticator: Arc<Authenticator>,
    pub tools: Arc<ToolRegistry>,
    pub resource: Arc<ProtectedResource>,
}

impl AppState {
    pub fn new(
        authenticator: Arc<Authenticator>,
        tools: Arc<ToolRegistry>,
        resource: Arc<ProtectedResource>,
    ) -> Self {
        Self {
            authenticator,
            tools,
            resource,
        }
    }
}
