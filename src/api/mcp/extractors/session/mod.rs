/*!
 * Session extractor
 *
 * Responsibility:
 * - 認証済みリクエストの Session を handler に提供する
 * - axum 依存は extractor に閉じ込め、型定義は types に分離する
 *
 * Public API:
 * - Session / SessionExtra
 * - MaybeSession
 */

mod extractor;
mod types;

pub use extractor::MaybeSession;
pub use types::{Session, SessionExtra};
