/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: Bearer 認証 / cors: CORS / http: request-id, trace, limit, timeout
 */
pub mod auth;
pub mod cors;
pub mod http;
