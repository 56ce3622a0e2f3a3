mod session;

pub use session::{MaybeSession, Session, SessionExtra};
