use serde::{Deserialize, Serialize};

/// Access/refresh credential pair issued at sign-in and replaced on every refresh.
///
/// # Example
/// ```
/// use ignite_gym::auth::TokenPair;
///
/// let pair = TokenPair::new("access", "refresh");
/// assert!(pair.has_refresh_token());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    pub fn has_refresh_token(&self) -> bool {
        !self.refresh_token.trim().is_empty()
    }
}
