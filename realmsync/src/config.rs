use std::{net::SocketAddr, time::Duration};

use aliri_tokens::{ClientId, ClientSecret};
use clap::Parser;
use realmsync_claims::{ClientName, RoleName, RolePolicy, Roles};
use realmsync_gateway::RealmName;
use reqwest::Url;
use thiserror::Error;

/// The identity provider URL cannot have path segments appended to it
#[derive(Clone, Copy, Debug, Error)]
#[error("auth server URL cannot be used as a base URL")]
pub struct InvalidBaseUrl;

/// Runtime configuration, read from flags with environment fallbacks
#[derive(Debug, Parser)]
#[command(name = "realmsync", version, about)]
pub struct Config {
    /// Address to serve the API on
    #[arg(long, env = "REALMSYNC_LISTEN", default_value = "127.0.0.1:8080")]
    pub listen: SocketAddr,

    /// Base URL of the Keycloak server
    #[arg(long, env = "KEYCLOAK_AUTH_SERVER_URL")]
    pub auth_server_url: Url,

    /// Realm holding the managed users and roles
    #[arg(long, env = "KEYCLOAK_REALM")]
    pub realm: RealmName,

    /// Confidential client used for admin API calls
    #[arg(long, env = "KEYCLOAK_CLIENT_ID")]
    pub client_id: ClientId,

    /// Secret of the confidential client
    #[arg(long, env = "KEYCLOAK_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: ClientSecret,

    /// Token endpoint, when it differs from the realm's own
    #[arg(long, env = "KEYCLOAK_TOKEN_ENDPOINT")]
    pub token_endpoint: Option<Url>,

    /// Client whose roles are resolved when none is named [default: the client ID]
    #[arg(long, env = "REALMSYNC_DEFAULT_CLIENT")]
    pub default_client: Option<ClientName>,

    /// Audience required of incoming access tokens
    #[arg(long, env = "REALMSYNC_AUDIENCE")]
    pub audience: Option<String>,

    /// Realm roles granting administrative access, any one of which suffices
    #[arg(
        long = "admin-role",
        env = "REALMSYNC_ADMIN_ROLE",
        value_delimiter = ',',
        default_value = "ADMIN"
    )]
    pub admin_roles: Vec<RoleName>,

    /// Seconds to wait on each call to the identity provider
    #[arg(
        long,
        env = "REALMSYNC_UPSTREAM_TIMEOUT_SECS",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub upstream_timeout_secs: u64,

    /// Restore a user's original roles when an update fails part way
    #[arg(long, env = "REALMSYNC_COMPENSATE_ON_FAILURE")]
    pub compensate_on_failure: bool,

    /// Seconds between refreshes of the token verification keys
    #[arg(
        long,
        env = "REALMSYNC_JWKS_REFRESH_SECS",
        default_value_t = 600,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub jwks_refresh_secs: u64,
}

impl Config {
    /// The issuer of tokens minted by the realm
    pub fn issuer(&self) -> Result<Url, InvalidBaseUrl> {
        self.realm_url(&[])
    }

    /// The realm's signing key set
    pub fn jwks_url(&self) -> Result<Url, InvalidBaseUrl> {
        self.realm_url(&["protocol", "openid-connect", "certs"])
    }

    /// The endpoint used to obtain admin API tokens
    pub fn token_url(&self) -> Result<Url, InvalidBaseUrl> {
        match &self.token_endpoint {
            Some(url) => Ok(url.clone()),
            None => self.realm_url(&["protocol", "openid-connect", "token"]),
        }
    }

    /// The client consulted when resolving client roles
    pub fn default_client(&self) -> ClientName {
        self.default_client
            .clone()
            .unwrap_or_else(|| ClientName::from(self.client_id.as_str()))
    }

    /// The policy callers must satisfy to manage users
    pub fn admin_policy(&self) -> RolePolicy {
        self.admin_roles
            .iter()
            .cloned()
            .map(Roles::single)
            .fold(RolePolicy::deny_all(), RolePolicy::or_allow)
    }

    /// The bound on each call to the identity provider
    #[inline]
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    /// The interval between refreshes of the verification keys
    #[inline]
    pub fn jwks_refresh(&self) -> Duration {
        Duration::from_secs(self.jwks_refresh_secs)
    }

    fn realm_url(&self, segments: &[&str]) -> Result<Url, InvalidBaseUrl> {
        let mut url = self.auth_server_url.clone();
        url.path_segments_mut()
            .map_err(|()| InvalidBaseUrl)?
            .pop_if_empty()
            .push("realms")
            .push(self.realm.as_str())
            .extend(segments);
        Ok(url)
    }
}
