//! Error types.

use crate::auth::classifier::ClassifyError;
use crate::token_store::TokenId;

/// Error enumerates the possible Zone Warden error states.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Returned when a request carries neither an `AccessKey` header nor a bearer
    /// `Authorization` header, or the value is blank.
    #[error("missing API key")]
    MissingApiKey,

    /// Returned when the presented credential matches neither the master key nor any stored
    /// token secret.
    #[error("invalid API key")]
    InvalidApiKey,

    /// Returned when a proxied request can't be reduced to an
    /// [`Action`][crate::auth::Action] descriptor.
    #[error(transparent)]
    Classification(#[from] ClassifyError),

    /// Returned when the caller's grants don't cover the requested zone, action or record type,
    /// or when a scoped token attempts an administrator-only operation.
    #[error("permission denied")]
    PermissionDenied,

    /// Returned when the master key is used for anything beyond self-identification after
    /// the first administrator token has been created.
    #[error("master_key_locked")]
    MasterKeyLocked,

    /// Returned when deleting the only remaining administrator token.
    #[error("cannot_delete_last_admin")]
    CannotDeleteLastAdmin,

    /// Returned when a scoped token is requested before any administrator token exists.
    #[error("no_admin_token_exists")]
    NoAdminTokenExists,

    /// Returned when no token has the requested id.
    #[error("token {0} not found")]
    TokenNotFound(TokenId),

    /// Returned when an Admin API request is well-formed JSON but semantically invalid.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Returned when an Admin API request body isn't valid JSON for the endpoint.
    #[error("malformed request body: {0}")]
    MalformedRequest(#[source] serde_json::Error),

    /// Returned when the [`Config`][crate::config::Config] fails validation.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Returned when a generic IO error occurs.
    #[error("an IO error occurred")]
    IO(#[from] std::io::Error),

    /// Returned when processing JSON from disk (e.g. when
    /// [loading a `Config`][crate::config::Config::try_from_file], or
    /// [opening a `FileTokenStore`][crate::token_store::file::FileTokenStore::open])
    /// fails due to invalid JSON content.
    #[error("invalid JSON")]
    InvalidJSON(#[from] serde_json::Error),

    /// Returned when the runtime log filter can't be replaced.
    #[error("log filter update failed")]
    LogFilter(#[from] tracing_subscriber::reload::Error),

    /// Returned when forwarding an authorized request to the DNS provider fails.
    #[error("upstream request failed")]
    Upstream(#[from] reqwest::Error),
}
