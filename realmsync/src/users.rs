use std::sync::Arc;

use axum::http::StatusCode;
use realmsync_gateway::{
    dto::{ExternalRole, ExternalUser},
    IdentityProviderGateway, RealmName, RealmNameRef, UserId, UserIdRef, AVAILABLE_ROLES_PAGE_SIZE,
};
use serde::Serialize;

use crate::{validate::validate_user, ResponseEnvelope, ServiceError};

/// Single-call user operations against the identity provider
///
/// Each operation either succeeds or fails as a whole and answers with a
/// [`ResponseEnvelope`].
#[derive(Clone)]
pub struct UserService {
    gateway: Arc<dyn IdentityProviderGateway>,
    realm: RealmName,
}

impl std::fmt::Debug for UserService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserService")
            .field("realm", &self.realm)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct UserIdentifier {
    id: UserId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AvailableRoles {
    roles: Vec<ExternalRole>,
    possibly_truncated: bool,
}

impl UserService {
    /// Operates on users of `realm` through `gateway`
    pub fn new(gateway: Arc<dyn IdentityProviderGateway>, realm: RealmName) -> Self {
        Self { gateway, realm }
    }

    /// The realm this service operates on
    #[inline]
    pub fn realm(&self) -> &RealmNameRef {
        &self.realm
    }

    /// Creates a user, answering `201 Created` with its new identifier
    #[tracing::instrument(level = "debug", skip_all, fields(realm = %self.realm, username = %user.username))]
    pub async fn create_user(&self, user: &ExternalUser) -> ResponseEnvelope {
        let result = self.try_create_user(user).await;
        envelope(StatusCode::CREATED, result.map(|id| UserIdentifier { id }))
    }

    async fn try_create_user(&self, user: &ExternalUser) -> Result<UserId, ServiceError> {
        validate_user(user)?;

        let id = self
            .gateway
            .create_user(&self.realm, user)
            .await?
            .into_payload();
        tracing::info!(user.id = %id, "created user");

        Ok(id)
    }

    /// Looks up the identifier of the user with exactly this username
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn find_user_id(&self, username: &str) -> ResponseEnvelope {
        let result = self.try_find_user_id(username).await;
        envelope(StatusCode::OK, result.map(|id| UserIdentifier { id }))
    }

    async fn try_find_user_id(&self, username: &str) -> Result<UserId, ServiceError> {
        let users = self
            .gateway
            .find_users_by_exact_username(&self.realm, username)
            .await?
            .into_payload();

        users
            .into_iter()
            .find_map(|u| u.id)
            .ok_or_else(|| ServiceError::NotFound(format!("no user named {username}")))
    }

    /// Users whose username, names, or email match `term`
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn search_users(&self, term: &str) -> ResponseEnvelope {
        let result = self
            .gateway
            .find_users_by_search_term(&self.realm, term)
            .await
            .map(|found| found.into_payload())
            .map_err(ServiceError::from);

        envelope(StatusCode::OK, result)
    }

    /// The first window of realm roles that may still be granted to the user
    ///
    /// The answer flags whether the window was filled to capacity, in which
    /// case more roles may exist.
    #[tracing::instrument(level = "debug", skip_all, fields(realm = %self.realm, user.id = %id))]
    pub async fn available_roles(&self, id: &UserIdRef) -> ResponseEnvelope {
        let result = self
            .gateway
            .list_available_realm_roles(&self.realm, id, 0, AVAILABLE_ROLES_PAGE_SIZE)
            .await
            .map(|page| {
                let page = page.into_payload();
                let possibly_truncated = page.is_possibly_truncated();
                if possibly_truncated {
                    tracing::debug!(max = page.max(), "available roles may be truncated");
                }
                AvailableRoles {
                    roles: page
                        .into_roles()
                        .into_iter()
                        .filter(|r| !r.is_realm_default())
                        .collect(),
                    possibly_truncated,
                }
            })
            .map_err(ServiceError::from);

        envelope(StatusCode::OK, result)
    }
}

fn envelope<T: Serialize>(status: StatusCode, result: Result<T, ServiceError>) -> ResponseEnvelope {
    match result {
        Ok(data) => ResponseEnvelope::success(status, &data),
        Err(err) => err.into(),
    }
}
