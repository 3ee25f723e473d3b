//! Administrative backend keeping users and realm roles in step with Keycloak
//!
//! The backend holds no user or role state of its own. Every operation is
//! carried out against the identity provider through an
//! [`IdentityProviderGateway`][realmsync_gateway::IdentityProviderGateway] and
//! answered with a [`ResponseEnvelope`].
//!
//! Updating a user is the one operation spanning several remote calls. The
//! [`RoleReconciler`] validates the desired roles against what the realm
//! offers, revokes the roles currently held, replaces the profile, and
//! assigns the desired roles, in that order:
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use realmsync::{RoleReconciler, UserUpdate};
//! use realmsync_gateway::{dto::ExternalUser, KeycloakGateway, RealmName, UserIdRef};
//!
//! # async fn run(client: reqwest_middleware::ClientWithMiddleware) {
//! let gateway = KeycloakGateway::new(client, "https://sso.example.com".parse().unwrap());
//! let reconciler = RoleReconciler::new(Arc::new(gateway), RealmName::from_static("acme"));
//!
//! let update = UserUpdate::new(
//!     ExternalUser {
//!         username: "ada".to_owned(),
//!         email: Some("ada@example.com".to_owned()),
//!         ..ExternalUser::default()
//!     },
//!     ["viewer"],
//! );
//!
//! let envelope = reconciler
//!     .update_user(UserIdRef::from_static("5e1b7c2a"), update)
//!     .await;
//! println!("{}: {}", envelope.status(), envelope.message());
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

pub mod config;
mod envelope;
mod error;
pub mod http;
mod reconcile;
mod users;
mod validate;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use envelope::ResponseEnvelope;
pub use error::{ServiceError, ValidationError};
pub use reconcile::RoleReconciler;
pub use users::UserService;
pub use validate::{validate_user, UserUpdate};
