use crate::auth::{BootstrapState, Descriptor, Identity};
use crate::error::Error;
use crate::token_store::Token;

/// The outcome of a permission check.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DenyReason {
    Forbidden,
    /// The master key was presented after an administrator token was created.
    MasterKeyLocked,
}

impl Decision {
    /// # Errors
    ///
    /// Maps [`Decision::Deny`] to [`Error::PermissionDenied`] or [`Error::MasterKeyLocked`].
    pub fn into_result(self) -> Result<(), Error> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(DenyReason::Forbidden) => Err(Error::PermissionDenied),
            Decision::Deny(DenyReason::MasterKeyLocked) => Err(Error::MasterKeyLocked),
        }
    }
}

/// Decide whether `identity` may perform the classified request `descriptor`.
///
/// Administrators are never constrained. Scoped tokens never pass an administrator-only action,
/// and otherwise need a permission for the target zone granting the action and, for record
/// mutations, the record type.
pub fn check(identity: &Identity, state: BootstrapState, descriptor: &Descriptor) -> Decision {
    let token = match identity {
        Identity::Master if state == BootstrapState::Configured => {
            return Decision::Deny(DenyReason::MasterKeyLocked)
        }
        Identity::Master => return Decision::Allow,
        Identity::Token(token) if token.is_admin => return Decision::Allow,
        Identity::Token(token) => token,
    };

    if !descriptor.action.is_admin_only() && scoped_allows(token, descriptor) {
        Decision::Allow
    } else {
        Decision::Deny(DenyReason::Forbidden)
    }
}

fn scoped_allows(token: &Token, descriptor: &Descriptor) -> bool {
    match descriptor.zone {
        Some(zone) => token
            .permission_for(zone)
            .map_or(false, |p| p.permits(descriptor.action, descriptor.record_type)),
        // Only account-wide listing reaches here without a zone.
        None => token.permissions.iter().any(|p| p.allows(descriptor.action)),
    }
}
