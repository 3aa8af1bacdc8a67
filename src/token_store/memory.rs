use crate::auth::secret::SecretDigest;
use crate::error::Error;
use crate::token_store::{NewToken, Token, TokenId, TokenStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::OffsetDateTime;

#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct InMemoryTokenStore {
    next_id: TokenId,
    admin_ever_created: bool,
    tokens: BTreeMap<TokenId, Token>,
}

impl InMemoryTokenStore {
    fn admin_count(&self) -> usize {
        self.tokens.values().filter(|t| t.is_admin).count()
    }
}

#[async_trait::async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn create_token(
        &mut self,
        token: NewToken,
        secret_digest: SecretDigest,
    ) -> Result<Token, Error> {
        self.next_id += 1;
        let token = Token {
            id: self.next_id,
            name: token.name,
            is_admin: token.is_admin,
            created_at: OffsetDateTime::now_utc(),
            permissions: token.permissions,
            secret_digest,
        };
        if token.is_admin {
            self.admin_ever_created = true;
        }
        self.tokens.insert(token.id, token.clone());
        Ok(token)
    }

    async fn get_token(&self, id: TokenId) -> Result<Token, Error> {
        self.tokens.get(&id).cloned().ok_or(Error::TokenNotFound(id))
    }

    async fn list_tokens(&self) -> Vec<Token> {
        self.tokens.values().cloned().collect()
    }

    async fn delete_token(&mut self, id: TokenId) -> Result<Token, Error> {
        let target = self.tokens.get(&id).ok_or(Error::TokenNotFound(id))?;
        if target.is_admin && self.admin_count() <= 1 {
            return Err(Error::CannotDeleteLastAdmin);
        }
        self.tokens.remove(&id).ok_or(Error::TokenNotFound(id))
    }

    async fn find_by_secret(&self, secret_digest: &SecretDigest) -> Option<Token> {
        // Compare against every token so the scan time doesn't depend on where a match sits.
        let mut found = None;
        for token in self.tokens.values() {
            if token.secret_digest.ct_eq(secret_digest) && found.is_none() {
                found = Some(token);
            }
        }
        found.cloned()
    }

    fn admin_ever_created(&self) -> bool {
        self.admin_ever_created
    }
}
