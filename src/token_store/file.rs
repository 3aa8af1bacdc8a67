//! A JSON file-backed implementation of the [`TokenStore`][super::TokenStore] trait.
//!
//! Mutations are applied to a copy of the in-memory state, which only replaces the live state
//! once it has been durably written. A failed write therefore leaves both the file and the
//! served state exactly as they were: no token is created, revoked, or counted towards the
//! bootstrap lock unless it is on disk.
//!
//! Writes go to a staging file next to the state file which is synced and then renamed over it,
//! so the state file is always either the old or the new complete document.
use crate::auth::secret::SecretDigest;
use crate::error::Error;
use crate::token_store::memory::InMemoryTokenStore;
use crate::token_store::{NewToken, Token, TokenId, TokenStore};
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// A token store persisted to a JSON file.
///
/// The file holds secret digests, never secrets, but should still be readable only by the
/// service user. Deleting it returns the service to the unconfigured state, in which the master
/// key may create a new administrator.
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct FileTokenStore {
    state: InMemoryTokenStore,
    path: PathBuf,
}

impl FileTokenStore {
    /// Open the store at `path`. A missing file is initialised with an empty state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidJSON`] if the file isn't a valid token state, and [`Error::IO`] if
    /// it can't be read or, when missing, created.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let state = match fs::read(&path).await {
            Ok(contents) => serde_json::from_slice(&contents)?,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                let empty = InMemoryTokenStore::default();
                persist(&path, &empty).await?;
                empty
            }
            Err(err) => return Err(err.into()),
        };
        Ok(Self { state, path })
    }

    /// Make `next` the live state once it is on disk.
    async fn commit(&mut self, next: InMemoryTokenStore) -> Result<(), Error> {
        persist(&self.path, &next).await?;
        self.state = next;
        Ok(())
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(|| OsString::from("tokens"), ToOwned::to_owned);
    name.push(".tmp");
    path.with_file_name(name)
}

async fn persist(path: &Path, state: &InMemoryTokenStore) -> Result<(), Error> {
    let contents = serde_json::to_vec_pretty(state)?;
    let staging = staging_path(path);
    if let Err(err) = write_synced(&staging, &contents).await {
        // Best effort; the live file is untouched either way.
        let _ = fs::remove_file(&staging).await;
        return Err(err.into());
    }
    fs::rename(&staging, path).await?;
    Ok(())
}

async fn write_synced(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(contents).await?;
    file.sync_all().await
}

#[async_trait::async_trait]
impl TokenStore for FileTokenStore {
    async fn create_token(
        &mut self,
        token: NewToken,
        secret_digest: SecretDigest,
    ) -> Result<Token, Error> {
        let mut next = self.state.clone();
        let token = next.create_token(token, secret_digest).await?;
        self.commit(next).await?;
        Ok(token)
    }

    async fn get_token(&self, id: TokenId) -> Result<Token, Error> {
        self.state.get_token(id).await
    }

    async fn list_tokens(&self) -> Vec<Token> {
        self.state.list_tokens().await
    }

    async fn delete_token(&mut self, id: TokenId) -> Result<Token, Error> {
        let mut next = self.state.clone();
        let token = next.delete_token(id).await?;
        self.commit(next).await?;
        Ok(token)
    }

    async fn find_by_secret(&self, secret_digest: &SecretDigest) -> Option<Token> {
        self.state.find_by_secret(secret_digest).await
    }

    fn admin_ever_created(&self) -> bool {
        self.state.admin_ever_created()
    }

    async fn check_ready(&self) -> Result<(), Error> {
        fs::metadata(&self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::secret::SecretHasher;

    fn admin(name: &str) -> NewToken {
        NewToken {
            name: name.to_string(),
            is_admin: true,
            permissions: vec![],
        }
    }

    fn hasher() -> SecretHasher {
        SecretHasher::new(b"k").unwrap()
    }

    #[tokio::test]
    async fn missing_file_is_created_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");

        let store = FileTokenStore::open(&path).await.unwrap();
        assert!(store.list_tokens().await.is_empty());
        assert!(!store.admin_ever_created());
        assert!(path.exists());
        assert!(store.check_ready().await.is_ok());
    }

    #[tokio::test]
    async fn state_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");

        let mut store = FileTokenStore::open(&path).await.unwrap();
        let a = store.create_token(admin("a"), hasher().digest("alpha")).await.unwrap();
        let b = store.create_token(admin("b"), hasher().digest("bravo")).await.unwrap();
        store.delete_token(a.id).await.unwrap();

        let mut reloaded = FileTokenStore::open(&path).await.unwrap();
        assert!(reloaded.admin_ever_created());
        let ids: Vec<TokenId> = reloaded.list_tokens().await.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![b.id]);
        assert!(reloaded.find_by_secret(&hasher().digest("bravo")).await.is_some());
        assert!(reloaded.find_by_secret(&hasher().digest("alpha")).await.is_none());

        let c = reloaded.create_token(admin("c"), hasher().digest("c")).await.unwrap();
        assert_eq!(c.id, 3, "ids are never reused after reload");
        assert!(!staging_path(&path).exists());
    }

    #[tokio::test]
    async fn corrupt_state_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        std::fs::write(&path, b"{not json").unwrap();
        let result = FileTokenStore::open(&path).await;
        assert!(matches!(result, Err(Error::InvalidJSON(_))));
    }

    #[tokio::test]
    async fn failed_write_leaves_state_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let state_dir = dir.path().join("state");
        std::fs::create_dir(&state_dir).unwrap();
        let path = state_dir.join("tokens.json");
        let mut store = FileTokenStore::open(&path).await.unwrap();

        std::fs::remove_dir_all(&state_dir).unwrap();
        let result = store.create_token(admin("a"), hasher().digest("a")).await;
        assert!(matches!(result, Err(Error::IO(_))));
        assert!(!store.admin_ever_created());
        assert!(store.list_tokens().await.is_empty());
        assert!(store.check_ready().await.is_err());

        std::fs::create_dir(&state_dir).unwrap();
        let a = store.create_token(admin("a"), hasher().digest("a")).await.unwrap();
        assert_eq!(a.id, 1);
        let b = store.create_token(admin("b"), hasher().digest("b")).await.unwrap();

        std::fs::remove_dir_all(&state_dir).unwrap();
        assert!(store.delete_token(b.id).await.is_err());
        assert!(store.find_by_secret(&hasher().digest("b")).await.is_some());
    }

    #[tokio::test]
    async fn failed_write_keeps_previous_file_intact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        let mut store = FileTokenStore::open(&path).await.unwrap();
        store.create_token(admin("a"), hasher().digest("a")).await.unwrap();

        // A directory in the staging file's place makes the next write fail.
        std::fs::create_dir(staging_path(&path)).unwrap();
        assert!(store.create_token(admin("b"), hasher().digest("b")).await.is_err());

        let reloaded = FileTokenStore::open(&path).await.unwrap();
        let names: Vec<String> = reloaded.list_tokens().await.into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["a".to_string()]);
    }
}
