/*
 * Responsibility
 * - auth: Bearer トークン検証 → Session、protected resource metadata
 * - tools: ツール定義 / レジストリ / scope gate
 */
pub mod auth;
pub mod tools;
