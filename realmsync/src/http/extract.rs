use std::{fmt, sync::Arc};

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use realmsync_claims::{AccessClaims, Caller, ClaimResolver, RolePolicy};

/// What extractors need to turn verified claims into an authorized caller
#[derive(Clone, Debug)]
pub struct Authz {
    resolver: ClaimResolver,
    admin_policy: Arc<RolePolicy>,
}

impl Authz {
    /// Resolves callers with `resolver` and admits administrators by `admin_policy`
    pub fn new(resolver: ClaimResolver, admin_policy: RolePolicy) -> Self {
        Self {
            resolver,
            admin_policy: Arc::new(admin_policy),
        }
    }

    fn caller(&self, parts: &Parts) -> Result<Caller, AccessDenied> {
        let claims = parts
            .extensions
            .get::<AccessClaims>()
            .ok_or(AccessDenied::MissingClaims)?;

        Ok(Caller::from_claims(claims, &self.resolver))
    }
}

/// The request could not be authorized
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessDenied {
    /// No verified claims were attached to the request
    MissingClaims,
    /// The caller does not hold the required roles
    InsufficientRoles,
}

impl fmt::Display for AccessDenied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingClaims => f.write_str("token claims missing"),
            Self::InsufficientRoles => f.write_str("insufficient roles"),
        }
    }
}

impl std::error::Error for AccessDenied {}

impl IntoResponse for AccessDenied {
    fn into_response(self) -> Response {
        let status = match self {
            Self::MissingClaims => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InsufficientRoles => StatusCode::FORBIDDEN,
        };

        (status, self.to_string()).into_response()
    }
}

/// Any caller presenting a verified token
#[derive(Clone, Debug)]
pub struct Authenticated(pub Caller);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    Authz: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AccessDenied;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Authz::from_ref(state).caller(parts).map(Self)
    }
}

/// A caller satisfying the administrative role policy
#[derive(Clone, Debug)]
pub struct Admin(pub Caller);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Admin
where
    Authz: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AccessDenied;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let authz = Authz::from_ref(state);
        let caller = authz.caller(parts)?;

        caller
            .authorize(&authz.admin_policy)
            .map_err(|_| AccessDenied::InsufficientRoles)?;

        Ok(Self(caller))
    }
}
