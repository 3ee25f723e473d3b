use aliri::jwt;
use aliri_clock::UnixTime;
use aliri_oauth2::{HasScope, Scope};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{ClientName, ClientNameRef};

/// The payload of a Keycloak access token
///
/// Registered claims are kept as typed fields. Everything else, including
/// `realm_access` and `resource_access`, is retained verbatim so that roles
/// can be resolved from it by a [`ClaimResolver`][crate::ClaimResolver].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    #[serde(default, skip_serializing_if = "jwt::Audiences::is_empty")]
    aud: jwt::Audiences,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iss: Option<jwt::Issuer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sub: Option<jwt::Subject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp: Option<UnixTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nbf: Option<UnixTime>,
    /// Authorized party, the client the token was issued to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    azp: Option<ClientName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    preferred_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default = "Scope::empty")]
    scope: Scope,
    #[serde(flatten)]
    other: Map<String, Value>,
}

impl AccessClaims {
    /// The authorized party the token was issued to
    #[inline]
    pub fn azp(&self) -> Option<&ClientNameRef> {
        self.azp.as_deref()
    }

    /// The login name of the caller
    #[inline]
    pub fn preferred_username(&self) -> Option<&str> {
        self.preferred_username.as_deref()
    }

    /// The display name of the caller
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The claims not modeled as typed fields
    #[inline]
    pub fn claims(&self) -> &Map<String, Value> {
        &self.other
    }
}

impl jwt::CoreClaims for AccessClaims {
    #[inline]
    fn nbf(&self) -> Option<UnixTime> {
        self.nbf
    }

    #[inline]
    fn exp(&self) -> Option<UnixTime> {
        self.exp
    }

    #[inline]
    fn aud(&self) -> &jwt::Audiences {
        &self.aud
    }

    #[inline]
    fn iss(&self) -> Option<&jwt::IssuerRef> {
        self.iss.as_deref()
    }

    #[inline]
    fn sub(&self) -> Option<&jwt::SubjectRef> {
        self.sub.as_deref()
    }
}

impl HasScope for AccessClaims {
    #[inline]
    fn scope(&self) -> &Scope {
        &self.scope
    }
}
