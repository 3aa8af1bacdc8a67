use crate::admin::IssuedToken;
use crate::auth::{BootstrapState, Identity};
use crate::logging::LogLevel;
use crate::token_store::{Permission, Token, TokenId};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A token as listed by the Admin API. Never includes the secret.
#[derive(Serialize, Debug, Clone)]
pub(super) struct TokenSummary {
    pub id: TokenId,
    pub name: String,
    pub is_admin: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Token> for TokenSummary {
    fn from(token: Token) -> Self {
        Self {
            id: token.id,
            name: token.name,
            is_admin: token.is_admin,
            created_at: token.created_at,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub(super) struct TokenDetail {
    #[serde(flatten)]
    pub summary: TokenSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<Permission>,
}

impl From<Token> for TokenDetail {
    fn from(mut token: Token) -> Self {
        let permissions = std::mem::take(&mut token.permissions);
        Self {
            summary: token.into(),
            permissions,
        }
    }
}

/// The one response that ever carries a token's secret.
#[derive(Serialize, Debug, Clone)]
pub(super) struct CreatedToken {
    #[serde(flatten)]
    pub detail: TokenDetail,
    pub token: String,
}

impl From<IssuedToken> for CreatedToken {
    fn from(issued: IssuedToken) -> Self {
        Self {
            detail: issued.token.into(),
            token: issued.secret,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub(super) struct Whoami {
    pub is_master_key: bool,
    pub is_admin: bool,
    pub bootstrap_state: BootstrapState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<TokenDetail>,
}

impl Whoami {
    pub fn new(identity: Identity, bootstrap_state: BootstrapState) -> Self {
        Self {
            is_master_key: identity.is_master(),
            is_admin: identity.is_admin(bootstrap_state),
            bootstrap_state,
            token: match identity {
                Identity::Master => None,
                Identity::Token(token) => Some(token.into()),
            },
        }
    }
}

/// Request and response body of `/admin/api/loglevel`.
#[derive(Deserialize, Serialize, Debug, Clone, Copy)]
#[serde(deny_unknown_fields)]
pub(super) struct LogLevelChange {
    pub level: LogLevel,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::secret::SecretHasher;
    use serde_json::json;

    fn token() -> Token {
        Token {
            id: 4,
            name: "ci".into(),
            is_admin: true,
            created_at: OffsetDateTime::UNIX_EPOCH,
            permissions: vec![],
            secret_digest: SecretHasher::new(b"k").unwrap().digest("s"),
        }
    }

    #[test]
    fn created_token_shape() {
        let created = CreatedToken::from(IssuedToken {
            token: token(),
            secret: "abcd".into(),
        });
        assert_eq!(
            serde_json::to_value(created).unwrap(),
            json!({
                "id": 4,
                "name": "ci",
                "is_admin": true,
                "created_at": "1970-01-01T00:00:00Z",
                "token": "abcd",
            })
        );
    }

    #[test]
    fn whoami_for_locked_master() {
        let whoami = Whoami::new(Identity::Master, BootstrapState::Configured);
        assert_eq!(
            serde_json::to_value(whoami).unwrap(),
            json!({
                "is_master_key": true,
                "is_admin": false,
                "bootstrap_state": "CONFIGURED",
            })
        );
    }

    #[test]
    fn summaries_never_carry_digests() {
        let value = serde_json::to_value(TokenSummary::from(token())).unwrap();
        assert!(value.get("secret_digest").is_none());
    }
}
