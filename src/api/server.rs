use crate::admin::Admin;
use crate::api::routes;
use crate::auth::{Authenticator, BootstrapGuard};
use crate::config::SharedConfig;
use crate::error::Error;
use crate::logging::LogFilter;
use crate::token_store::DynTokenStore;
use crate::upstream::DynUpstream;
use std::future::Future;

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub config: SharedConfig,
    pub tokens: DynTokenStore,
    pub authenticator: Authenticator,
    pub admin: Admin,
    pub upstream: DynUpstream,
    pub log_filter: LogFilter,
}

impl AppState {
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the configured token hash key is rejected.
    pub fn new(
        config: SharedConfig,
        tokens: DynTokenStore,
        upstream: DynUpstream,
        log_filter: LogFilter,
    ) -> Result<Self, Error> {
        let hasher = config.secret_hasher()?;
        let guard = BootstrapGuard::new(hasher.clone(), &config.master_api_key);
        let authenticator = Authenticator::new(guard, hasher.clone());
        let admin = Admin::new(tokens.clone(), authenticator.clone(), hasher);
        Ok(Self {
            config,
            tokens,
            authenticator,
            admin,
            upstream,
            log_filter,
        })
    }
}

pub fn new(state: AppState) -> impl Future<Output = hyper::Result<()>> {
    let addr = state.config.api_bind_addr;
    axum::Server::bind(&addr).serve(routes::router(state).into_make_service())
}
