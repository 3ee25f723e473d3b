//! Access to the Keycloak admin REST API
//!
//! The [`IdentityProviderGateway`] trait names each remote action the
//! backend performs against the identity provider. [`KeycloakGateway`] is its
//! implementation over a [`ClientWithMiddleware`][reqwest_middleware::ClientWithMiddleware].
//!
//! Outbound calls authenticate as a confidential client. A
//! [`KeycloakTokenSource`] performs the client credentials grant and is meant
//! to feed an [`aliri_tokens::TokenWatcher`], which keeps a fresh token
//! available in the background. The middleware built by
//! [`provider_token_middleware`] then attaches the current token to every
//! request aimed at the provider.
//!
//! ```no_run
//! use aliri_tokens::{backoff::ErrorBackoffConfig, jitter::RandomEarlyJitter, TokenWatcher};
//! use aliri_clock::DurationSecs;
//! use realmsync_gateway::{
//!     provider_token_middleware, IdentityProviderGateway, KeycloakGateway, KeycloakTokenSource,
//!     RealmNameRef,
//! };
//! use reqwest_middleware::ClientBuilder;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let base_url: reqwest::Url = "https://sso.example.com".parse()?;
//! let token_url = "https://sso.example.com/realms/acme/protocol/openid-connect/token".parse()?;
//!
//! let token_source = KeycloakTokenSource::new(
//!     reqwest::Client::new(),
//!     token_url,
//!     "realmsync-admin".into(),
//!     "s3cr3t".into(),
//! );
//! let watcher = TokenWatcher::spawn_from_token_source(
//!     token_source,
//!     RandomEarlyJitter::new(DurationSecs(60)),
//!     ErrorBackoffConfig::default(),
//! )
//! .await?;
//!
//! let client = ClientBuilder::new(reqwest::Client::new())
//!     .with(provider_token_middleware(watcher, &base_url)?)
//!     .build();
//!
//! let gateway = KeycloakGateway::new(client, base_url);
//! let users = gateway
//!     .find_users_by_exact_username(RealmNameRef::from_static("acme"), "ada")
//!     .await?;
//! println!("{} users", users.payload.len());
//! # Ok(())
//! # }
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
pub mod dto;
mod error;
mod gateway;
mod keycloak;
mod middleware;
mod token;

pub use braids::*;
pub use error::UpstreamError;
pub use gateway::{
    IdentityProviderGateway, Upstream, AVAILABLE_ROLES_PAGE_SIZE, MAX_AVAILABLE_ROLE_WINDOWS,
};
pub use keycloak::KeycloakGateway;
pub use middleware::{provider_token_middleware, BearerTokenMiddleware, MissingHost};
pub use token::{KeycloakTokenSource, TokenRequestError};
