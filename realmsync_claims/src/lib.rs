//! Role resolution over Keycloak access token claims
//!
//! Keycloak places the roles granted to a caller in two claims of the access
//! token payload:
//!
//! * realm roles under `realm_access.roles`
//! * client roles under `resource_access.{client}.roles`, one entry per client
//!
//! ```json
//! {
//!   "sub": "0b8c4a5e-2d1f-4c1e-9f65-2a1b9a7c6d10",
//!   "realm_access": { "roles": ["ADMIN", "default-roles-acme"] },
//!   "resource_access": {
//!     "backoffice": { "roles": ["editor"] },
//!     "account": { "roles": ["manage-account"] }
//!   }
//! }
//! ```
//!
//! The [`ClaimResolver`] turns an already verified claim map into a flat
//! [`Roles`] set. It never fails: a missing or oddly shaped claim simply
//! resolves to no roles. A [`Caller`] bundles the resolved roles of a single
//! request so that authorization checks can be made against a [`RolePolicy`]
//! without consulting any ambient state.
//!
//! ```
//! use realmsync_claims::{roles, role_policy, ClaimResolver, ClientName, RoleSource};
//! use aliri_traits::Policy;
//!
//! let claims = serde_json::json!({
//!     "realm_access": { "roles": ["ADMIN"] },
//!     "resource_access": { "backoffice": { "roles": ["editor", "viewer"] } },
//! });
//! let claims = claims.as_object().unwrap();
//!
//! let resolver = ClaimResolver::new(ClientName::from_static("backoffice"));
//!
//! assert_eq!(resolver.resolve(claims, None), roles!["editor", "viewer"]);
//! assert_eq!(resolver.resolve_from(claims, RoleSource::Realm), roles!["ADMIN"]);
//!
//! let policy = role_policy![roles!["ADMIN"], roles!["SUPERVISOR", "AUTHORIZER"]];
//! assert!(policy.evaluate(&resolver.resolve_realm(claims)).is_ok());
//! ```

#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

mod braids;
mod caller;
mod claims;
mod policy;
mod resolve;
mod roles;

pub use braids::*;
pub use caller::Caller;
pub use claims::AccessClaims;
pub use policy::{InsufficientRoles, RolePolicy};
pub use resolve::{ClaimResolver, RoleSource, REALM_ACCESS, RESOURCE_ACCESS};
pub use roles::Roles;

/// Prefix of the realm-default composite role that Keycloak grants to
/// every user on its own
pub const DEFAULT_ROLES_PREFIX: &str = "default-roles-";

/// Whether the role is the provider-managed realm-default role
///
/// The realm-default role is assigned implicitly by the identity provider
/// and must never appear in an explicit assignment or removal.
#[inline]
pub fn is_realm_default_role(role: &RoleNameRef) -> bool {
    role.as_str().starts_with(DEFAULT_ROLES_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_realm_default_role_for_any_realm() {
        assert!(is_realm_default_role(RoleNameRef::from_static(
            "default-roles-acme"
        )));
        assert!(is_realm_default_role(RoleNameRef::from_static(
            "default-roles-ceptra_op"
        )));
    }

    #[test]
    fn ordinary_roles_are_not_realm_default() {
        assert!(!is_realm_default_role(RoleNameRef::from_static("editor")));
        assert!(!is_realm_default_role(RoleNameRef::from_static(
            "roles-default"
        )));
    }
}
