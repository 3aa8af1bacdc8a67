use crate::auth::secret::SecretDigest;
use crate::auth::{Action, RecordType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;
use time::OffsetDateTime;

pub type TokenId = u64;

/// An upstream zone identifier. Zero is never a valid zone.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash)]
#[serde(transparent)]
pub struct ZoneId(NonZeroU64);

impl ZoneId {
    pub fn new(id: u64) -> Option<Self> {
        NonZeroU64::new(id).map(Self)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

#[derive(thiserror::Error, Debug)]
#[error("invalid zone id \"{0}\"")]
pub struct InvalidZoneId(String);

impl FromStr for ZoneId {
    type Err = InvalidZoneId;

    /// Only plain ASCII digits are accepted, so `+7` or `007 ` don't alias zone 7.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidZoneId(s.to_string()));
        }
        s.parse::<NonZeroU64>()
            .map(Self)
            .map_err(|_| InvalidZoneId(s.to_string()))
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A zone grant held by a scoped token.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct Permission {
    pub zone_id: ZoneId,
    pub allowed_actions: BTreeSet<Action>,
    pub record_types: BTreeSet<RecordType>,
}

impl Permission {
    pub fn allows(&self, action: Action) -> bool {
        self.allowed_actions.contains(&action)
    }

    /// Action and record type are independent gates: record mutations need both.
    pub fn permits(&self, action: Action, record_type: Option<RecordType>) -> bool {
        if !self.allows(action) {
            return false;
        }
        if !action.is_record_mutation() {
            return true;
        }
        record_type.map_or(false, |t| self.record_types.contains(&t))
    }
}

/// A stored credential. The secret itself is not kept, only its keyed digest.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Token {
    pub id: TokenId,
    pub name: String,
    pub is_admin: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    pub(crate) secret_digest: SecretDigest,
}

impl Token {
    pub fn permission_for(&self, zone: ZoneId) -> Option<&Permission> {
        self.permissions.iter().find(|p| p.zone_id == zone)
    }
}

/// A validated token ready to be inserted. Ids and timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewToken {
    pub name: String,
    pub is_admin: bool,
    pub permissions: Vec<Permission>,
}
