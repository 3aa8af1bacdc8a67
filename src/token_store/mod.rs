//! Token storage.
//!
//! Supports a generic interface for creating, looking up and deleting [`Token`]s along with
//! the zone [`Permission`]s of scoped tokens.
//!
//! Two implementations are provided, [`memory::InMemoryTokenStore`] and [`file::FileTokenStore`].
//! The former is not durable across restarts. The latter will write its state to disk for each
//! mutation and load this state again on startup.
//!
//! Consumers share a store as a [`DynTokenStore`]. Reads take the read half of the lock and run
//! in parallel. Mutations take the write half, so a check-then-act sequence (bootstrap lock,
//! last-administrator protection) performed while holding the write guard is atomic with respect
//! to every other caller.

use crate::auth::secret::SecretDigest;
use crate::error::Error;
use std::sync::Arc;
use tokio::sync::RwLock;

pub mod file;
pub mod memory;
mod token;

#[allow(clippy::module_name_repetitions)]
pub use file::FileTokenStore;
#[allow(clippy::module_name_repetitions)]
pub use memory::InMemoryTokenStore;
pub use token::{InvalidZoneId, NewToken, Permission, Token, TokenId, ZoneId};

/// `DynTokenStore` is a type alias for a [`TokenStore`] that can be used by multiple read/write
/// consumers that coordinate through an [`Arc`] and a [`RwLock`] wrapping the [`TokenStore`].
#[allow(clippy::module_name_repetitions)]
pub type DynTokenStore = Arc<RwLock<dyn TokenStore + Send + Sync>>;

/// An async trait describing durable storage of [`Token`]s.
#[async_trait::async_trait]
pub trait TokenStore {
    /// Insert a token, assigning its id and creation time.
    async fn create_token(
        &mut self,
        token: NewToken,
        secret_digest: SecretDigest,
    ) -> Result<Token, Error>;

    /// Get the token with the given id, or [`Error::TokenNotFound`].
    async fn get_token(&self, id: TokenId) -> Result<Token, Error>;

    /// List every token in ascending id order.
    async fn list_tokens(&self) -> Vec<Token>;

    /// Delete the token with the given id, returning it.
    ///
    /// Deleting the only remaining administrator token fails with
    /// [`Error::CannotDeleteLastAdmin`].
    async fn delete_token(&mut self, id: TokenId) -> Result<Token, Error>;

    /// Find the token whose secret has the given digest.
    async fn find_by_secret(&self, secret_digest: &SecretDigest) -> Option<Token>;

    /// Whether an administrator token has ever been created in this store. Never reset, even if
    /// the administrator count later drops.
    fn admin_ever_created(&self) -> bool;

    /// Whether the store can currently serve and persist requests.
    async fn check_ready(&self) -> Result<(), Error> {
        Ok(())
    }
}
