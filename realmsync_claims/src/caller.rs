use aliri::jwt::CoreClaims;
use aliri_traits::Policy;
use serde::Serialize;

use crate::{AccessClaims, ClaimResolver, InsufficientRoles, RoleNameRef, RolePolicy, Roles};

/// The authenticated principal behind a single request
///
/// Built once from verified claims, a caller carries everything needed to
/// make authorization decisions for the rest of the request.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Caller {
    #[serde(skip_serializing_if = "Option::is_none")]
    subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
    authorities: Roles,
    client_roles: Roles,
}

impl Caller {
    /// Resolves the caller from verified claims
    ///
    /// Realm roles become the caller's authorities. Client roles are those of
    /// the resolver's default client.
    pub fn from_claims(claims: &AccessClaims, resolver: &ClaimResolver) -> Self {
        Self {
            subject: claims.sub().map(|s| s.as_str().to_owned()),
            username: claims.preferred_username().map(str::to_owned),
            display_name: claims.name().map(str::to_owned),
            authorities: resolver.resolve_realm(claims.claims()),
            client_roles: resolver.resolve(claims.claims(), None),
        }
    }

    /// The subject identifier of the caller
    #[inline]
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// The login name of the caller
    #[inline]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// The display name of the caller
    #[inline]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// The realm roles held by the caller
    #[inline]
    pub fn authorities(&self) -> &Roles {
        &self.authorities
    }

    /// The roles held for the default client
    #[inline]
    pub fn client_roles(&self) -> &Roles {
        &self.client_roles
    }

    /// Whether the caller holds the realm role
    #[inline]
    pub fn has_role(&self, role: &RoleNameRef) -> bool {
        self.authorities.contains(role)
    }

    /// Checks the caller's realm roles against the policy
    pub fn authorize(&self, policy: &RolePolicy) -> Result<(), InsufficientRoles> {
        let result = policy.evaluate(&self.authorities);
        if result.is_err() {
            tracing::debug!(
                subject = self.subject.as_deref().unwrap_or("<unknown>"),
                held = ?self.authorities.sorted(),
                "caller denied by role policy"
            );
        }
        result
    }
}
