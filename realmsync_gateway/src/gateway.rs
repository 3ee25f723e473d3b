use std::collections::HashSet;

use async_trait::async_trait;
use http::StatusCode;

use crate::{
    dto::{ExternalRole, ExternalUser, RolePage},
    RealmNameRef, UpstreamError, UserId, UserIdRef,
};

/// Size of the window used when listing the roles available to a user
pub const AVAILABLE_ROLES_PAGE_SIZE: u32 = 101;

/// Most windows requested when listing every available role
pub const MAX_AVAILABLE_ROLE_WINDOWS: u32 = 100;

/// A successful answer from the identity provider
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Upstream<T> {
    /// The status the provider answered with
    pub status: StatusCode,
    /// The decoded body
    pub payload: T,
}

impl<T> Upstream<T> {
    /// Pairs a decoded payload with its status
    #[inline]
    pub fn new(status: StatusCode, payload: T) -> Self {
        Self { status, payload }
    }

    /// Discards the status
    #[inline]
    pub fn into_payload(self) -> T {
        self.payload
    }
}

/// The remote actions performed against an identity provider
///
/// Every action names its realm explicitly and is a single remote call, with
/// the exception of [`list_all_available_realm_roles`][Self::list_all_available_realm_roles].
#[async_trait]
pub trait IdentityProviderGateway: Send + Sync {
    /// Users whose username is exactly `username`
    async fn find_users_by_exact_username(
        &self,
        realm: &RealmNameRef,
        username: &str,
    ) -> Result<Upstream<Vec<ExternalUser>>, UpstreamError>;

    /// Users matching `term` in their username, names, or email
    async fn find_users_by_search_term(
        &self,
        realm: &RealmNameRef,
        term: &str,
    ) -> Result<Upstream<Vec<ExternalUser>>, UpstreamError>;

    /// Creates a user, answering with the identifier the provider assigned
    async fn create_user(
        &self,
        realm: &RealmNameRef,
        user: &ExternalUser,
    ) -> Result<Upstream<UserId>, UpstreamError>;

    /// Replaces the profile of an existing user
    async fn update_user(
        &self,
        realm: &RealmNameRef,
        id: &UserIdRef,
        user: &ExternalUser,
    ) -> Result<Upstream<()>, UpstreamError>;

    /// One window of the realm roles that may still be assigned to the user
    async fn list_available_realm_roles(
        &self,
        realm: &RealmNameRef,
        id: &UserIdRef,
        first: u32,
        max: u32,
    ) -> Result<Upstream<RolePage>, UpstreamError>;

    /// The realm roles directly assigned to the user
    async fn list_assigned_realm_roles(
        &self,
        realm: &RealmNameRef,
        id: &UserIdRef,
    ) -> Result<Upstream<Vec<ExternalRole>>, UpstreamError>;

    /// Grants realm roles to the user
    async fn assign_realm_roles(
        &self,
        realm: &RealmNameRef,
        id: &UserIdRef,
        roles: &[ExternalRole],
    ) -> Result<Upstream<()>, UpstreamError>;

    /// Removes realm roles from the user
    async fn revoke_realm_roles(
        &self,
        realm: &RealmNameRef,
        id: &UserIdRef,
        roles: &[ExternalRole],
    ) -> Result<Upstream<()>, UpstreamError>;

    /// Every realm role that may still be assigned to the user
    ///
    /// Windows of [`AVAILABLE_ROLES_PAGE_SIZE`] are requested until one comes
    /// back short, or until a window brings no role not already seen. More
    /// than [`MAX_AVAILABLE_ROLE_WINDOWS`] windows are reported as an
    /// unavailable provider.
    async fn list_all_available_realm_roles(
        &self,
        realm: &RealmNameRef,
        id: &UserIdRef,
    ) -> Result<Vec<ExternalRole>, UpstreamError> {
        let mut seen = HashSet::new();
        let mut roles = Vec::new();
        let mut first = 0;

        for _ in 0..MAX_AVAILABLE_ROLE_WINDOWS {
            let page = self
                .list_available_realm_roles(realm, id, first, AVAILABLE_ROLES_PAGE_SIZE)
                .await?
                .into_payload();
            let more = page.is_possibly_truncated();
            let known = roles.len();

            first += page.max();
            for role in page.into_roles() {
                if seen.insert(role.name.clone()) {
                    roles.push(role);
                }
            }

            if !more {
                return Ok(roles);
            }

            if roles.len() == known {
                tracing::warn!(first, "available roles window brought no new roles");
                return Ok(roles);
            }

            tracing::debug!(first, "available roles continue past window");
        }

        Err(UpstreamError::Unavailable {
            reason: format!(
                "available roles did not end within {MAX_AVAILABLE_ROLE_WINDOWS} windows"
            ),
        })
    }
}
