use thiserror::Error;

use crate::Roles;

/// Indicates the caller held insufficient roles to be granted access to a
/// controlled resource
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Error)]
#[error("insufficient roles")]
pub struct InsufficientRoles;

/// An access policy based on held roles
///
/// Each alternative is a set of roles that must all be held, and access is
/// allowed when any alternative is. A policy without alternatives denies
/// every request, while an empty alternative is satisfied by any caller.
///
/// ```
/// use aliri_traits::Policy;
/// use realmsync_claims::{roles, RolePolicy};
///
/// let policy = RolePolicy::allow_one(roles!["ADMIN"])
///     .or_allow(roles!["SUPERVISOR", "AUTHORIZER"]);
///
/// assert!(policy.evaluate(&roles!["ADMIN", "USER"]).is_ok());
/// assert!(policy.evaluate(&roles!["SUPERVISOR", "AUTHORIZER"]).is_ok());
/// assert!(policy.evaluate(&roles!["SUPERVISOR"]).is_err());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[must_use]
pub struct RolePolicy {
    alternatives: Vec<Roles>,
}

impl RolePolicy {
    /// Constructs a policy that has no permissible alternatives
    #[inline]
    pub const fn deny_all() -> Self {
        Self {
            alternatives: Vec::new(),
        }
    }

    /// Constructs a policy that requires this set of roles
    #[inline]
    pub fn allow_one(roles: Roles) -> Self {
        Self::deny_all().or_allow(roles)
    }

    /// Add an alternate allowable set of roles
    pub fn or_allow(mut self, roles: Roles) -> Self {
        self.alternatives.push(roles);
        self
    }
}

impl aliri_traits::Policy for RolePolicy {
    type Request = Roles;
    type Denial = InsufficientRoles;

    fn evaluate(&self, held: &Self::Request) -> Result<(), Self::Denial> {
        if self.alternatives.iter().any(|required| held.contains_all(required)) {
            Ok(())
        } else {
            Err(InsufficientRoles)
        }
    }
}

/// Construct a policy from a list of role set alternatives
///
/// ```
/// use realmsync_claims::{roles, role_policy, RolePolicy};
///
/// let policy = role_policy![roles!["ADMIN"], roles!["AUTHORIZER", "USER"]];
///
/// assert_eq!(
///     policy,
///     RolePolicy::deny_all()
///         .or_allow(roles!["ADMIN"])
///         .or_allow(roles!["AUTHORIZER", "USER"]),
/// );
/// ```
#[macro_export]
macro_rules! role_policy {
    ($($roles:expr),* $(,)?) => {
        $crate::RolePolicy::deny_all()
        $(
            .or_allow($roles)
        )*
    };
}
