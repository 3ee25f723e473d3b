use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::{header, StatusCode};
use reqwest::Url;
use reqwest_middleware::{ClientWithMiddleware, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::{
    dto::{ExternalRole, ExternalUser, RolePage},
    IdentityProviderGateway, RealmNameRef, Upstream, UpstreamError, UserId, UserIdRef,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// An [`IdentityProviderGateway`] speaking the Keycloak admin REST API
///
/// Authorization is left to the middleware stack of the client. Each call is
/// bounded by a timeout, after which the provider is reported unavailable.
#[derive(Clone, Debug)]
pub struct KeycloakGateway {
    client: ClientWithMiddleware,
    base_url: Url,
    timeout: Duration,
}

struct Exchange {
    status: StatusCode,
    location: Option<String>,
    body: Bytes,
}

impl Exchange {
    fn decode<T: DeserializeOwned>(&self) -> Result<Upstream<T>, UpstreamError> {
        let payload = serde_json::from_slice(&self.body)?;
        Ok(Upstream::new(self.status, payload))
    }

    fn empty(&self) -> Upstream<()> {
        Upstream::new(self.status, ())
    }
}

impl KeycloakGateway {
    /// Constructs a gateway for the provider at `base_url`
    ///
    /// Admin endpoints are resolved beneath the base URL, so a provider
    /// served under a path prefix such as `/auth` is supported.
    pub fn new(client: ClientWithMiddleware, base_url: Url) -> Self {
        Self {
            client,
            base_url,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Bounds each call to the provider by `timeout`
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }

    fn admin_url(&self, realm: &RealmNameRef, tail: &[&str]) -> Result<Url, UpstreamError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| UpstreamError::Unavailable {
                reason: format!("provider URL {} cannot hold a path", self.base_url),
            })?
            .pop_if_empty()
            .extend(["admin", "realms", realm.as_str()])
            .extend(tail);
        Ok(url)
    }

    fn user_url(
        &self,
        realm: &RealmNameRef,
        id: &UserIdRef,
        tail: &[&str],
    ) -> Result<Url, UpstreamError> {
        let mut segments = vec!["users", id.as_str()];
        segments.extend_from_slice(tail);
        self.admin_url(realm, &segments)
    }

    async fn exchange(&self, request: RequestBuilder) -> Result<Exchange, UpstreamError> {
        let call = async {
            let resp = request.send().await?;
            let status = resp.status();
            let location = resp
                .headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);
            let body = resp.bytes().await?;

            Ok::<_, UpstreamError>(Exchange {
                status,
                location,
                body,
            })
        };

        let exchange = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(exchange)) => exchange,
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "identity provider unreachable");
                return Err(err);
            }
            Err(_) => {
                tracing::warn!(timeout = ?self.timeout, "identity provider call timed out");
                return Err(UpstreamError::Unavailable {
                    reason: format!("no response within {:?}", self.timeout),
                });
            }
        };

        if !exchange.status.is_success() {
            let err = UpstreamError::status(exchange.status, String::from_utf8_lossy(&exchange.body));
            tracing::warn!(
                status = exchange.status.as_u16(),
                reason = err.reason(),
                "identity provider rejected call"
            );
            return Err(err);
        }

        tracing::debug!(status = exchange.status.as_u16(), "identity provider accepted call");
        Ok(exchange)
    }
}

fn created_id(location: Option<&str>) -> Result<UserId, UpstreamError> {
    location
        .and_then(|l| l.trim_end_matches('/').rsplit('/').next())
        .filter(|id| !id.is_empty())
        .map(UserId::from)
        .ok_or_else(|| UpstreamError::Decode {
            reason: "created user has no location".to_owned(),
        })
}

#[async_trait]
impl IdentityProviderGateway for KeycloakGateway {
    #[tracing::instrument(level = "debug", skip_all, fields(realm = %realm), err)]
    async fn find_users_by_exact_username(
        &self,
        realm: &RealmNameRef,
        username: &str,
    ) -> Result<Upstream<Vec<ExternalUser>>, UpstreamError> {
        let url = self.admin_url(realm, &["users"])?;
        let request = self
            .client
            .get(url)
            .query(&[("exact", "true"), ("username", username)]);
        self.exchange(request).await?.decode()
    }

    #[tracing::instrument(level = "debug", skip_all, fields(realm = %realm), err)]
    async fn find_users_by_search_term(
        &self,
        realm: &RealmNameRef,
        term: &str,
    ) -> Result<Upstream<Vec<ExternalUser>>, UpstreamError> {
        let url = self.admin_url(realm, &["users"])?;
        let request = self.client.get(url).query(&[("search", term)]);
        self.exchange(request).await?.decode()
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(realm = %realm, user.username = %user.username),
        err
    )]
    async fn create_user(
        &self,
        realm: &RealmNameRef,
        user: &ExternalUser,
    ) -> Result<Upstream<UserId>, UpstreamError> {
        let url = self.admin_url(realm, &["users"])?;
        let exchange = self.exchange(self.client.post(url).json(user)).await?;
        let id = created_id(exchange.location.as_deref())?;
        tracing::info!(user.id = %id, "created user");
        Ok(Upstream::new(exchange.status, id))
    }

    #[tracing::instrument(level = "debug", skip_all, fields(realm = %realm, user.id = %id), err)]
    async fn update_user(
        &self,
        realm: &RealmNameRef,
        id: &UserIdRef,
        user: &ExternalUser,
    ) -> Result<Upstream<()>, UpstreamError> {
        let url = self.user_url(realm, id, &[])?;
        Ok(self.exchange(self.client.put(url).json(user)).await?.empty())
    }

    #[tracing::instrument(level = "debug", skip_all, fields(realm = %realm, user.id = %id), err)]
    async fn list_available_realm_roles(
        &self,
        realm: &RealmNameRef,
        id: &UserIdRef,
        first: u32,
        max: u32,
    ) -> Result<Upstream<RolePage>, UpstreamError> {
        let url = self.user_url(realm, id, &["role-mappings", "realm", "available"])?;
        let request = self.client.get(url).query(&[("first", first), ("max", max)]);
        let Upstream { status, payload } = self.exchange(request).await?.decode()?;
        let page = RolePage::new(payload, first, max);

        if page.is_possibly_truncated() {
            tracing::debug!(count = page.roles().len(), "available roles window is full");
        }

        Ok(Upstream::new(status, page))
    }

    #[tracing::instrument(level = "debug", skip_all, fields(realm = %realm, user.id = %id), err)]
    async fn list_assigned_realm_roles(
        &self,
        realm: &RealmNameRef,
        id: &UserIdRef,
    ) -> Result<Upstream<Vec<ExternalRole>>, UpstreamError> {
        let url = self.user_url(realm, id, &["role-mappings", "realm"])?;
        self.exchange(self.client.get(url)).await?.decode()
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(realm = %realm, user.id = %id, roles = roles.len()),
        err
    )]
    async fn assign_realm_roles(
        &self,
        realm: &RealmNameRef,
        id: &UserIdRef,
        roles: &[ExternalRole],
    ) -> Result<Upstream<()>, UpstreamError> {
        let url = self.user_url(realm, id, &["role-mappings", "realm"])?;
        Ok(self.exchange(self.client.post(url).json(roles)).await?.empty())
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(realm = %realm, user.id = %id, roles = roles.len()),
        err
    )]
    async fn revoke_realm_roles(
        &self,
        realm: &RealmNameRef,
        id: &UserIdRef,
        roles: &[ExternalRole],
    ) -> Result<Upstream<()>, UpstreamError> {
        let url = self.user_url(realm, id, &["role-mappings", "realm"])?;
        Ok(self.exchange(self.client.delete(url).json(roles)).await?.empty())
    }
}
