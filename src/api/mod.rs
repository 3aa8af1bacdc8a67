//! HTTP API: the DNS proxy and the token Admin API.
//!
//! Every endpoint except `/healthcheck` and `/ready` expects a credential in the `AccessKey`
//! header or, when that is absent or blank, as `Authorization: Bearer <secret>`. Errors are
//! returned as `{"error": "<message>"}`.
//!
//! Request bodies are buffered before anything else happens, so a body larger than
//! `max_body_bytes` is refused with HTTP 413 even for an unauthenticated caller.
//!
//! Every response carries an `X-Request-ID` header: the caller's own id when it is at most 128
//! characters of letters, digits, `-`, `_` or `.`, otherwise a fresh UUID. The same id is
//! recorded on the request's log span.
//!
//! # API Endpoints
//!
//! ## `/healthcheck` (GET)
//!
//!   Returns HTTP 200 (OK) and the JSON body `{"ok":"healthy"}` when the service is operational.
//!
//! ## `/ready` (GET)
//!
//!   Returns HTTP 200 and `{"status":"ok"}` when the token store can be reached, or HTTP 503
//!   and `{"status":"not_ready","error":"token store unavailable"}` when it can't.
//!
//! ## `/admin/api/tokens` (POST)
//!
//!   Creates a token. Expects a JSON request body of the form:
//!
//!   ```json
//!   { "name": "acme-bot", "is_admin": false, "zones": [7], "actions": ["add_record"], "record_types": ["TXT"] }
//!   ```
//!
//!   Administrator tokens are requested with `"is_admin": true` and no zone grants. Before any
//!   administrator token exists, only the master key may call this endpoint and only an
//!   administrator token may be created. Afterwards the master key is refused with HTTP 403
//!   `master_key_locked`.
//!
//!   Returns HTTP 201 (Created) with the token, including its `token` secret. The secret is
//!   never returned again.
//!
//! ## `/admin/api/tokens` (GET)
//!
//!   Lists every token, without secrets or permissions.
//!
//! ## `/admin/api/tokens/{id}` (GET, DELETE)
//!
//!   Returns one token with its permissions, or deletes it (HTTP 204). Deleting the only
//!   administrator token fails with HTTP 409 `cannot_delete_last_admin`.
//!
//! ## `/admin/api/whoami` (GET)
//!
//!   Describes the calling identity. Works for the master key in any bootstrap state.
//!
//! ## `/admin/api/loglevel` (POST)
//!
//!   Changes the service's log level at runtime. Expects `{"level": "debug"}`, one of `trace`,
//!   `debug`, `info`, `warn` or `error`, and echoes it back. Requires administrator authority.
//!
//! ## Everything else
//!
//!   Proxied to the DNS provider with the account key once the caller is authenticated (401),
//!   the request is classified (400) and the caller's grants allow it (403). The provider's
//!   status, content type and body are relayed unchanged.

mod api_error;
mod model;
mod request_id;
mod routes;
pub mod server;

pub use routes::router;
pub use server::{new, AppState};
