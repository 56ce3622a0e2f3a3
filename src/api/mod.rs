/*
 * Responsibility
 * - HTTP API の公開ポイント
 */
pub mod mcp;
