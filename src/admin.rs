//! Token lifecycle management behind the Admin API.
//!
//! Every mutation takes the token store's write lock once and performs its checks and its write
//! under that single guard. This makes the bootstrap transition and last-administrator
//! protection atomic: two concurrent administrator creations by the master key serialize, and the
//! second observes [`BootstrapState::Configured`].

use crate::auth::secret::{self, SecretHasher};
use crate::auth::{Action, Authenticator, BootstrapGuard, BootstrapState, Identity, RecordType};
use crate::error::Error;
use crate::token_store::{DynTokenStore, NewToken, Permission, Token, TokenId, TokenStore, ZoneId};
use serde::Deserialize;
use std::collections::BTreeSet;

/// The body of a token creation request.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct TokenGrant {
    pub name: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub zones: Vec<ZoneId>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub record_types: Vec<RecordType>,
}

impl TokenGrant {
    /// Validate the grant and expand it into one [`Permission`] per distinct zone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] for a blank name, an administrator grant carrying zone
    /// grants, a scoped grant missing zones, actions or record types, or a scoped grant naming an
    /// administrator-only action.
    pub fn validate(self) -> Result<NewToken, Error> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(invalid("token name is required"));
        }

        if self.is_admin {
            if !(self.zones.is_empty() && self.actions.is_empty() && self.record_types.is_empty())
            {
                return Err(invalid("administrator tokens take no zone grants"));
            }
            return Ok(NewToken {
                name: name.to_string(),
                is_admin: true,
                permissions: vec![],
            });
        }

        if self.zones.is_empty() {
            return Err(invalid("scoped tokens require at least one zone"));
        }
        if self.actions.is_empty() {
            return Err(invalid("scoped tokens require at least one action"));
        }
        if self.record_types.is_empty() {
            return Err(invalid("scoped tokens require at least one record type"));
        }
        if let Some(action) = self.actions.iter().find(|a| a.is_admin_only()) {
            return Err(invalid(&format!(
                "action {action} is administrator-only and can't be granted"
            )));
        }

        let allowed_actions: BTreeSet<Action> = self.actions.into_iter().collect();
        let record_types: BTreeSet<RecordType> = self.record_types.into_iter().collect();
        let zones: BTreeSet<ZoneId> = self.zones.into_iter().collect();
        let permissions = zones
            .into_iter()
            .map(|zone_id| Permission {
                zone_id,
                allowed_actions: allowed_actions.clone(),
                record_types: record_types.clone(),
            })
            .collect();

        Ok(NewToken {
            name: name.to_string(),
            is_admin: false,
            permissions,
        })
    }
}

fn invalid(msg: &str) -> Error {
    Error::InvalidRequest(msg.to_string())
}

/// A newly created token with its secret. The secret is never available again.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: Token,
    pub secret: String,
}

#[derive(Clone)]
pub struct Admin {
    tokens: DynTokenStore,
    authenticator: Authenticator,
    hasher: SecretHasher,
}

impl Admin {
    pub fn new(tokens: DynTokenStore, authenticator: Authenticator, hasher: SecretHasher) -> Self {
        Self {
            tokens,
            authenticator,
            hasher,
        }
    }

    /// # Errors
    ///
    /// Returns [`Error::MissingApiKey`] or [`Error::InvalidApiKey`] if the credential doesn't
    /// resolve.
    pub async fn authenticate(&self, credential: Option<&str>) -> Result<Identity, Error> {
        let store = self.tokens.read().await;
        self.authenticator.resolve(&*store, credential).await
    }

    pub async fn bootstrap_state(&self) -> BootstrapState {
        BootstrapState::of(&*self.tokens.read().await)
    }

    /// Create a token on behalf of `caller`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MasterKeyLocked`] for the master key once an administrator token has
    /// been created, [`Error::PermissionDenied`] for scoped callers,
    /// [`Error::NoAdminTokenExists`] for a scoped token requested before any administrator
    /// exists, and [`Error::InvalidRequest`] for an invalid grant.
    pub async fn create_token(
        &self,
        caller: &Identity,
        grant: TokenGrant,
    ) -> Result<IssuedToken, Error> {
        let mut store = self.tokens.write().await;
        let caller = refresh(&*store, caller).await?;
        let state = BootstrapState::of(&*store);
        BootstrapGuard::require_admin(&caller, state)?;

        if state == BootstrapState::Unconfigured && !grant.is_admin {
            return Err(Error::NoAdminTokenExists);
        }
        let new_token = grant.validate()?;

        let secret = secret::generate_secret();
        let token = store
            .create_token(new_token, self.hasher.digest(&secret))
            .await?;
        drop(store);

        tracing::info!(
            "{caller} created {} token {} ({:?})",
            if token.is_admin { "admin" } else { "scoped" },
            token.id,
            token.name
        );
        if state == BootstrapState::Unconfigured {
            tracing::info!("first administrator token created, master key is now locked");
        }
        Ok(IssuedToken { token, secret })
    }

    /// Check that `caller` currently holds administrator authority, for operations outside the
    /// token lifecycle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidApiKey`] for a token deleted since it authenticated, and
    /// [`Error::MasterKeyLocked`] or [`Error::PermissionDenied`] for callers without
    /// administrator authority.
    pub async fn require_admin(&self, caller: &Identity) -> Result<(), Error> {
        let store = self.tokens.read().await;
        let caller = refresh(&*store, caller).await?;
        BootstrapGuard::require_admin(&caller, BootstrapState::of(&*store))
    }

    pub async fn list_tokens(&self) -> Vec<Token> {
        self.tokens.read().await.list_tokens().await
    }

    /// # Errors
    ///
    /// Returns [`Error::TokenNotFound`] if no token has the id.
    pub async fn get_token(&self, id: TokenId) -> Result<Token, Error> {
        self.tokens.read().await.get_token(id).await
    }

    /// Delete a token on behalf of `caller`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MasterKeyLocked`] or [`Error::PermissionDenied`] for callers without
    /// administrator authority, [`Error::TokenNotFound`] for an unknown id, and
    /// [`Error::CannotDeleteLastAdmin`] when the target is the only administrator token.
    pub async fn delete_token(&self, caller: &Identity, id: TokenId) -> Result<Token, Error> {
        let mut store = self.tokens.write().await;
        let caller = refresh(&*store, caller).await?;
        BootstrapGuard::require_admin(&caller, BootstrapState::of(&*store))?;
        let token = store.delete_token(id).await?;
        drop(store);

        tracing::info!("{caller} deleted token {} ({:?})", token.id, token.name);
        Ok(token)
    }
}

/// Re-read a token caller under the held lock so a token deleted since it authenticated can't
/// act.
async fn refresh(
    store: &(dyn TokenStore + Send + Sync),
    caller: &Identity,
) -> Result<Identity, Error> {
    match caller {
        Identity::Master => Ok(Identity::Master),
        Identity::Token(token) => match store.get_token(token.id).await {
            Ok(current) => Ok(Identity::Token(current)),
            Err(Error::TokenNotFound(_)) => Err(Error::InvalidApiKey),
            Err(err) => Err(err),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token_store::{FileTokenStore, InMemoryTokenStore};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    const MASTER: &str = "master-secret";

    fn admin_over(store: DynTokenStore) -> Admin {
        let hasher = SecretHasher::new(b"test-hash-key").unwrap();
        let guard = BootstrapGuard::new(hasher.clone(), MASTER);
        Admin::new(store, Authenticator::new(guard, hasher.clone()), hasher)
    }

    fn admin_api() -> Admin {
        admin_over(Arc::new(RwLock::new(InMemoryTokenStore::default())))
    }

    fn admin_grant(name: &str) -> TokenGrant {
        TokenGrant {
            name: name.to_string(),
            is_admin: true,
            ..TokenGrant::default()
        }
    }

    fn scoped_grant(name: &str, zones: &[u64]) -> TokenGrant {
        TokenGrant {
            name: name.to_string(),
            is_admin: false,
            zones: zones.iter().map(|z| ZoneId::new(*z).unwrap()).collect(),
            actions: vec![Action::ListRecords, Action::AddRecord],
            record_types: vec![RecordType::TXT],
        }
    }

    async fn bootstrap(admin: &Admin) -> (Identity, IssuedToken) {
        let issued = admin
            .create_token(&Identity::Master, admin_grant("root"))
            .await
            .unwrap();
        let identity = admin.authenticate(Some(&issued.secret)).await.unwrap();
        (identity, issued)
    }

    #[tokio::test]
    async fn master_key_locks_after_first_admin() {
        let admin = admin_api();
        assert_eq!(admin.bootstrap_state().await, BootstrapState::Unconfigured);

        let (_, issued) = bootstrap(&admin).await;
        assert!(issued.token.is_admin);
        assert_eq!(admin.bootstrap_state().await, BootstrapState::Configured);

        let master = admin.authenticate(Some(MASTER)).await.unwrap();
        let result = admin.create_token(&master, admin_grant("again")).await;
        assert!(matches!(result, Err(Error::MasterKeyLocked)));
        let result = admin.delete_token(&master, issued.token.id).await;
        assert!(matches!(result, Err(Error::MasterKeyLocked)));
    }

    #[tokio::test]
    async fn unsaved_first_admin_does_not_lock_master_key() {
        let dir = tempfile::tempdir().unwrap();
        let state_dir = dir.path().join("state");
        std::fs::create_dir(&state_dir).unwrap();
        let store = FileTokenStore::open(state_dir.join("tokens.json")).await.unwrap();
        let admin = admin_over(Arc::new(RwLock::new(store)));

        std::fs::remove_dir_all(&state_dir).unwrap();
        let result = admin.create_token(&Identity::Master, admin_grant("root")).await;
        assert!(matches!(result, Err(Error::IO(_))));
        assert_eq!(admin.bootstrap_state().await, BootstrapState::Unconfigured);
        assert!(admin.list_tokens().await.is_empty());

        std::fs::create_dir(&state_dir).unwrap();
        let issued = admin
            .create_token(&Identity::Master, admin_grant("root"))
            .await
            .unwrap();
        assert!(issued.token.is_admin);
        assert_eq!(admin.bootstrap_state().await, BootstrapState::Configured);
    }

    #[tokio::test]
    async fn require_admin_follows_bootstrap_state() {
        let admin = admin_api();
        admin.require_admin(&Identity::Master).await.unwrap();

        let (root, _) = bootstrap(&admin).await;
        admin.require_admin(&root).await.unwrap();
        assert!(matches!(
            admin.require_admin(&Identity::Master).await,
            Err(Error::MasterKeyLocked)
        ));

        let s = admin
            .create_token(&root, scoped_grant("acme", &[7]))
            .await
            .unwrap();
        let scoped = admin.authenticate(Some(&s.secret)).await.unwrap();
        assert!(matches!(
            admin.require_admin(&scoped).await,
            Err(Error::PermissionDenied)
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_bootstrap_has_one_winner() {
        for _ in 0..20 {
            let admin = admin_api();
            let handles: Vec<_> = (0..4)
                .map(|i| {
                    let admin = admin.clone();
                    tokio::spawn(async move {
                        admin
                            .create_token(&Identity::Master, admin_grant(&format!("root-{i}")))
                            .await
                    })
                })
                .collect();

            let mut created = 0;
            for handle in handles {
                match handle.await.unwrap() {
                    Ok(_) => created += 1,
                    Err(Error::MasterKeyLocked) => {}
                    Err(err) => panic!("unexpected error: {err}"),
                }
            }
            assert_eq!(created, 1);
            assert_eq!(admin.list_tokens().await.len(), 1);
        }
    }

    #[tokio::test]
    async fn scoped_tokens_need_an_admin_first() {
        let admin = admin_api();
        let result = admin
            .create_token(&Identity::Master, scoped_grant("early", &[7]))
            .await;
        assert!(matches!(result, Err(Error::NoAdminTokenExists)));
        assert!(admin.list_tokens().await.is_empty());
    }

    #[tokio::test]
    async fn last_admin_is_protected() {
        let admin = admin_api();
        let (root, issued) = bootstrap(&admin).await;

        let result = admin.delete_token(&root, issued.token.id).await;
        assert!(matches!(result, Err(Error::CannotDeleteLastAdmin)));
        assert!(admin.get_token(issued.token.id).await.is_ok());
    }

    #[tokio::test]
    async fn handoff_between_admins_leaves_scoped_tokens_alone() {
        let admin = admin_api();
        let (root, a) = bootstrap(&admin).await;
        let s = admin
            .create_token(&root, scoped_grant("acme", &[7]))
            .await
            .unwrap();
        let b = admin.create_token(&root, admin_grant("second")).await.unwrap();

        admin.delete_token(&root, a.token.id).await.unwrap();
        assert!(matches!(
            admin.authenticate(Some(&a.secret)).await,
            Err(Error::InvalidApiKey)
        ));

        let scoped = admin.authenticate(Some(&s.secret)).await.unwrap();
        assert_eq!(scoped.token().map(|t| t.id), Some(s.token.id));

        let b_identity = admin.authenticate(Some(&b.secret)).await.unwrap();
        let result = admin.delete_token(&b_identity, b.token.id).await;
        assert!(matches!(result, Err(Error::CannotDeleteLastAdmin)));
    }

    #[tokio::test]
    async fn deleted_callers_cannot_act() {
        let admin = admin_api();
        let (root, _) = bootstrap(&admin).await;
        let b = admin.create_token(&root, admin_grant("b")).await.unwrap();
        let b_identity = admin.authenticate(Some(&b.secret)).await.unwrap();

        admin.delete_token(&root, b.token.id).await.unwrap();
        let result = admin.create_token(&b_identity, admin_grant("c")).await;
        assert!(matches!(result, Err(Error::InvalidApiKey)));
    }

    #[tokio::test]
    async fn scoped_tokens_cannot_manage_tokens() {
        let admin = admin_api();
        let (root, issued) = bootstrap(&admin).await;
        let s = admin
            .create_token(&root, scoped_grant("acme", &[7]))
            .await
            .unwrap();
        let scoped = admin.authenticate(Some(&s.secret)).await.unwrap();

        let result = admin.create_token(&scoped, scoped_grant("x", &[7])).await;
        assert!(matches!(result, Err(Error::PermissionDenied)));
        let result = admin.delete_token(&scoped, issued.token.id).await;
        assert!(matches!(result, Err(Error::PermissionDenied)));
    }

    #[tokio::test]
    async fn one_permission_per_distinct_zone() {
        let admin = admin_api();
        let (root, _) = bootstrap(&admin).await;
        let s = admin
            .create_token(&root, scoped_grant("multi", &[9, 7, 9]))
            .await
            .unwrap();
        let zones: Vec<u64> = s.token.permissions.iter().map(|p| p.zone_id.get()).collect();
        assert_eq!(zones, vec![7, 9]);
        for p in &s.token.permissions {
            assert!(p.allows(Action::AddRecord));
            assert!(p.record_types.contains(&RecordType::TXT));
        }
    }

    #[test]
    fn grant_validation() {
        let cases = [
            TokenGrant {
                name: "  ".into(),
                ..admin_grant("")
            },
            TokenGrant {
                zones: vec![ZoneId::new(1).unwrap()],
                ..admin_grant("admin-with-zones")
            },
            TokenGrant {
                zones: vec![],
                ..scoped_grant("no-zones", &[])
            },
            TokenGrant {
                actions: vec![],
                ..scoped_grant("no-actions", &[7])
            },
            TokenGrant {
                record_types: vec![],
                ..scoped_grant("no-types", &[7])
            },
            TokenGrant {
                actions: vec![Action::ListRecords, Action::CreateZone],
                ..scoped_grant("admin-action", &[7])
            },
        ];
        for grant in cases {
            let name = grant.name.clone();
            assert!(
                matches!(grant.validate(), Err(Error::InvalidRequest(_))),
                "{name:?} should be rejected"
            );
        }
        assert!(scoped_grant("ok", &[7]).validate().is_ok());
        assert!(admin_grant("ok").validate().is_ok());
    }

    #[test]
    fn grants_parse_symbolic_names() {
        let grant: TokenGrant = serde_json::from_str(
            r#"{"name":"acme","zones":[7],"actions":["add_record"],"record_types":["txt"]}"#,
        )
        .unwrap();
        assert!(!grant.is_admin);
        assert_eq!(grant.record_types, vec![RecordType::TXT]);

        let bad = serde_json::from_str::<TokenGrant>(r#"{"name":"x","zones":[0]}"#);
        assert!(bad.is_err());
    }
}
