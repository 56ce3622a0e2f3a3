pub mod auth0;
pub mod authenticator;
pub mod factory;
pub mod metadata;
pub mod rejection;
pub mod verifier;

pub use auth0::Auth0Verifier;
pub use authenticator::Authenticator;
pub use factory::build_authenticator;
pub use metadata::ProtectedResource;
pub use rejection::Rejection;
pub use verifier::{Claims, TokenVerifier, VerifyError};
