use crate::auth::BootstrapState;
use crate::token_store::Token;
use std::fmt;

/// Who is asking, as established by the [`Authenticator`][crate::auth::Authenticator].
///
/// The identity is resolved once per request and passed explicitly to classification,
/// evaluation and the Admin API. A `Token` identity is a snapshot of the stored token, including
/// its permissions, taken under the store's read lock.
#[derive(Debug, Clone)]
pub enum Identity {
    /// The process-wide master key. Its authority depends on the [`BootstrapState`].
    Master,
    Token(Token),
}

impl Identity {
    pub fn is_master(&self) -> bool {
        matches!(self, Identity::Master)
    }

    /// The master key counts as an administrator only until the first administrator token
    /// exists.
    pub fn is_admin(&self, state: BootstrapState) -> bool {
        match self {
            Identity::Master => state == BootstrapState::Unconfigured,
            Identity::Token(token) => token.is_admin,
        }
    }

    pub fn token(&self) -> Option<&Token> {
        match self {
            Identity::Master => None,
            Identity::Token(token) => Some(token),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Master => f.write_str("master key"),
            Identity::Token(token) => write!(f, "token {} ({:?})", token.id, token.name),
        }
    }
}
