use crate::auth::secret::{self, SecretHasher};
use crate::auth::{BootstrapGuard, Identity};
use crate::error::Error;
use crate::token_store::TokenStore;

/// Resolves a presented credential to an [`Identity`]. Performs no authorization.
#[derive(Debug, Clone)]
pub struct Authenticator {
    guard: BootstrapGuard,
    hasher: SecretHasher,
}

impl Authenticator {
    pub fn new(guard: BootstrapGuard, hasher: SecretHasher) -> Self {
        Self { guard, hasher }
    }

    /// The master key always resolves, whatever the bootstrap state. Whether it may act is
    /// decided where it is used.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingApiKey`] for an absent or blank credential and
    /// [`Error::InvalidApiKey`] when no token has this secret.
    pub async fn resolve(
        &self,
        store: &(dyn TokenStore + Send + Sync),
        credential: Option<&str>,
    ) -> Result<Identity, Error> {
        let credential = credential
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(Error::MissingApiKey)?;

        if self.guard.is_master_key(credential) {
            return Ok(Identity::Master);
        }

        match store.find_by_secret(&self.hasher.digest(credential)).await {
            Some(token) => Ok(Identity::Token(token)),
            None => {
                tracing::debug!("rejected unknown API key {}", secret::mask(credential));
                Err(Error::InvalidApiKey)
            }
        }
    }
}
