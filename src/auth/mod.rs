//! The authorization engine.
//!
//! Every proxied request passes through three stages, in order:
//!
//! 1. The [`Authenticator`] resolves the presented credential to an [`Identity`].
//! 2. The [`classifier`] reduces the method, path and body to a [`Descriptor`].
//! 3. The [`evaluator`] decides whether the identity may perform the descriptor.
//!
//! The [`BootstrapGuard`] decides whether the master key still carries administrator authority.
//! Nothing here performs network I/O or holds state of its own; the current
//! [`BootstrapState`] and token grants are read from the
//! [`TokenStore`][crate::token_store::TokenStore] per request.

mod action;
pub mod authenticator;
pub mod bootstrap;
pub mod classifier;
pub mod evaluator;
mod identity;
mod record_type;
pub mod secret;

pub use action::Action;
pub use authenticator::Authenticator;
pub use bootstrap::{BootstrapGuard, BootstrapState};
pub use classifier::{classify, ClassifyError, Descriptor};
pub use evaluator::{check, Decision, DenyReason};
pub use identity::Identity;
pub use record_type::{RecordType, UnknownRecordType};
