//! Token secret generation, keyed digests and masking.
//!
//! Secrets are never stored. The [`crate::token_store::TokenStore`] only sees an HMAC-SHA256
//! [`SecretDigest`] keyed with the configured `token_hash_key`, and every comparison between
//! digests is constant time.

use crate::error::Error;
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

const SECRET_LEN_BYTES: usize = 32;
const DIGEST_LEN_BYTES: usize = 32;

/// Generate a fresh token secret: 32 bytes from the OS RNG, hex encoded.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_LEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Redact a credential for logging, keeping only its last four characters.
pub fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    match chars.len() {
        0..=7 => "****".to_string(),
        n => format!("****{}", chars[n - 4..].iter().collect::<String>()),
    }
}

/// A keyed digest of a token secret.
#[derive(Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretDigest(#[serde(with = "hex::serde")] [u8; DIGEST_LEN_BYTES]);

impl SecretDigest {
    pub fn ct_eq(&self, other: &SecretDigest) -> bool {
        self.0[..].ct_eq(&other.0[..]).into()
    }
}

impl fmt::Debug for SecretDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretDigest(..)")
    }
}

#[derive(Clone)]
pub struct SecretHasher {
    mac: HmacSha256,
}

impl SecretHasher {
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the key is rejected by the MAC.
    pub fn new(key: &[u8]) -> Result<Self, Error> {
        let mac = HmacSha256::new_from_slice(key)
            .map_err(|err| Error::InvalidConfig(format!("token hash key: {err}")))?;
        Ok(Self { mac })
    }

    pub fn digest(&self, secret: &str) -> SecretDigest {
        let mut mac = self.mac.clone();
        mac.update(secret.as_bytes());
        let mut out = [0u8; DIGEST_LEN_BYTES];
        out.copy_from_slice(&mac.finalize().into_bytes());
        SecretDigest(out)
    }
}

impl fmt::Debug for SecretHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretHasher(..)")
    }
}
