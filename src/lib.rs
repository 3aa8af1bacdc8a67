//! Zone Warden
//!
//! An authorizing proxy for the [bunny.net] DNS API.
//!
//! The bunny.net account key grants full control of every zone in an account. Zone Warden holds
//! that key itself and hands out scoped tokens instead: each token is limited to specific zones,
//! specific API actions within those zones, and specific record types for record writes. A token
//! that may only add `TXT` records to one zone is enough for an [ACME] [DNS-01] client, and
//! useless to anyone who steals it for anything else.
//!
//! The account key doubles as a bootstrap credential. It can create the first administrator
//! token and is locked out of token management from then on.
//!
//! [bunny.net]: https://docs.bunny.net/reference/dnszonepublic_index
//! [ACME]: https://www.rfc-editor.org/rfc/rfc8555
//! [DNS-01]: https://www.rfc-editor.org/rfc/rfc8555#section-8.4
//!
#![warn(clippy::pedantic)]

pub mod admin;
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod token_store;
pub mod upstream;

pub use api::new as new_http;
pub use api::AppState;
pub use config::{Config, SharedConfig};
pub use logging::{LogFilter, LogLevel};
pub use token_store::{FileTokenStore, InMemoryTokenStore};
pub use upstream::HttpUpstream;
