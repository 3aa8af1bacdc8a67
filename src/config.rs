use crate::auth::secret::SecretHasher;
use crate::error::Error;
use crate::token_store::{DynTokenStore, FileTokenStore, InMemoryTokenStore};
use serde::Deserialize;
use serde_with::{serde_as, DurationSeconds};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

pub type SharedConfig = Arc<Config>;

/// Environment variable consulted when the config file has no `master_api_key`.
pub const MASTER_API_KEY_ENV: &str = "ZONEWARDEN_MASTER_API_KEY";

const DEFAULT_UPSTREAM_BASE_URL: &str = "https://api.bunny.net";
const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

#[serde_as]
#[derive(Deserialize, Clone)]
pub struct Config {
    /// The upstream account key. Also the bootstrap master credential.
    #[serde(default)]
    pub master_api_key: String,
    pub token_hash_key: String,
    pub token_store_state_path: Option<String>,
    pub api_bind_addr: SocketAddr,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub api_timeout: Duration,
    #[serde(default = "default_upstream_base_url")]
    pub upstream_base_url: String,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "default_upstream_timeout")]
    pub upstream_timeout: Duration,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_upstream_base_url() -> String {
    DEFAULT_UPSTREAM_BASE_URL.to_string()
}

fn default_upstream_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

impl Config {
    /// Load and validate a JSON config file. An empty or absent `master_api_key` is taken from
    /// the `ZONEWARDEN_MASTER_API_KEY` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IO`] or [`Error::InvalidJSON`] if the file can't be read or parsed, and
    /// [`Error::InvalidConfig`] if validation fails.
    pub fn try_from_file(p: impl AsRef<Path>) -> Result<Self, Error> {
        let f = File::open(p)?;
        let reader = BufReader::new(f);
        let mut conf: Config = serde_json::from_reader(reader)?;
        if conf.master_api_key.trim().is_empty() {
            conf.master_api_key = std::env::var(MASTER_API_KEY_ENV).unwrap_or_default();
        }
        conf.validate()?;
        Ok(conf)
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for a blank master key or hash key, or an upstream URL
    /// that isn't `http://` or `https://`.
    pub fn validate(&self) -> Result<(), Error> {
        if self.master_api_key.trim().is_empty() {
            return Err(Error::InvalidConfig(format!(
                "master_api_key is required (or set {MASTER_API_KEY_ENV})"
            )));
        }
        if self.token_hash_key.trim().is_empty() {
            return Err(Error::InvalidConfig("token_hash_key is required".into()));
        }
        if !(self.upstream_base_url.starts_with("https://")
            || self.upstream_base_url.starts_with("http://"))
        {
            return Err(Error::InvalidConfig(format!(
                "upstream_base_url {:?} must be an http:// or https:// URL",
                self.upstream_base_url
            )));
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the hash key is rejected.
    pub fn secret_hasher(&self) -> Result<SecretHasher, Error> {
        SecretHasher::new(self.token_hash_key.as_bytes())
    }

    /// Open the configured token store: file-backed when `token_store_state_path` is set,
    /// in-memory otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the state file can't be read, created or parsed.
    pub async fn token_store(&self) -> Result<DynTokenStore, Error> {
        Ok(match &self.token_store_state_path {
            Some(path) => {
                tracing::info!("loading token state from {path}");
                Arc::new(RwLock::new(FileTokenStore::open(path).await?))
            }
            None => {
                tracing::warn!("no token_store_state_path configured, tokens won't persist");
                Arc::new(RwLock::new(InMemoryTokenStore::default()))
            }
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("master_api_key", &"<redacted>")
            .field("token_hash_key", &"<redacted>")
            .field("token_store_state_path", &self.token_store_state_path)
            .field("api_bind_addr", &self.api_bind_addr)
            .field("api_timeout", &self.api_timeout)
            .field("upstream_base_url", &self.upstream_base_url)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}
