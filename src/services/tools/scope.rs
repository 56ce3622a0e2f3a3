use crate::api::mcp::extractors::Session;

/// Scopes a tool requires. Access needs every one of them (exact match).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredScopes(Vec<String>);

impl RequiredScopes {
    pub fn new<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(scopes.into_iter().map(Into::into).collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// True iff every required scope is granted to `session`.
    ///
    /// No session means no scopes.
    pub fn can_access(&self, session: Option<&Session>) -> bool {
        let granted = session.map(|s| s.scopes.as_slice()).unwrap_or_default();
        self.0
            .iter()
            .all(|required| granted.iter().any(|g| g == required))
    }

    pub fn missing(&self, session: Option<&Session>) -> Vec<&str> {
        self.iter()
            .filter(|required| !session.is_some_and(|s| s.has_scope(required)))
            .collect()
    }

    /// Space-delimited form, as used in `scope` claims and challenges.
    pub fn to_scope_string(&self) -> String {
        self.0.join(" ")
    }
}
