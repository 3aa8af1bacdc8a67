use crate::auth::secret::{SecretDigest, SecretHasher};
use crate::auth::Identity;
use crate::error::Error;
use crate::token_store::TokenStore;
use serde::Serialize;
use std::fmt;

/// Derived from the token store: `Unconfigured` until the first administrator token is created,
/// `Configured` forever after.
#[derive(Serialize, Debug, Clone, Copy, Eq, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BootstrapState {
    Unconfigured,
    Configured,
}

impl BootstrapState {
    /// Read the state from a store. Callers that act on the result must hold the store lock
    /// they read it under until the action completes.
    pub fn of(store: &(dyn TokenStore + Send + Sync)) -> Self {
        if store.admin_ever_created() {
            BootstrapState::Configured
        } else {
            BootstrapState::Unconfigured
        }
    }
}

impl fmt::Display for BootstrapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootstrapState::Unconfigured => f.write_str("UNCONFIGURED"),
            BootstrapState::Configured => f.write_str("CONFIGURED"),
        }
    }
}

/// Recognises the master key and decides whether it may still act as an administrator.
#[derive(Debug, Clone)]
pub struct BootstrapGuard {
    hasher: SecretHasher,
    master_digest: SecretDigest,
}

impl BootstrapGuard {
    pub fn new(hasher: SecretHasher, master_key: &str) -> Self {
        let master_digest = hasher.digest(master_key);
        Self {
            hasher,
            master_digest,
        }
    }

    pub fn is_master_key(&self, presented: &str) -> bool {
        self.hasher.digest(presented).ct_eq(&self.master_digest)
    }

    /// Require administrator authority from `identity` for a token-management mutation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MasterKeyLocked`] for the master key once `state` is
    /// [`BootstrapState::Configured`], and [`Error::PermissionDenied`] for scoped tokens.
    pub fn require_admin(identity: &Identity, state: BootstrapState) -> Result<(), Error> {
        match identity {
            Identity::Master if state == BootstrapState::Configured => Err(Error::MasterKeyLocked),
            Identity::Master => Ok(()),
            Identity::Token(token) if token.is_admin => Ok(()),
            Identity::Token(_) => Err(Error::PermissionDenied),
        }
    }
}
