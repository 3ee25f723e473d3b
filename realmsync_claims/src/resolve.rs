use serde_json::{Map, Value};

use crate::{ClientName, ClientNameRef, RoleName, Roles};

/// Claim holding the roles granted per client
pub const RESOURCE_ACCESS: &str = "resource_access";

/// Claim holding the realm-wide roles
pub const REALM_ACCESS: &str = "realm_access";

const ROLES: &str = "roles";

/// Where in the claim map roles are resolved from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoleSource<'a> {
    /// `resource_access.{client}.roles`
    Client(&'a ClientNameRef),
    /// The union of `resource_access.*.roles` across every client
    AllClients,
    /// `realm_access.roles`
    Realm,
}

/// Resolves the roles carried by a verified access token
///
/// The resolver expects claims that have already been verified; it performs
/// no cryptographic checks of its own. Resolution never fails. Any claim
/// that is absent or does not have the expected shape contributes no roles.
#[derive(Clone, Debug)]
pub struct ClaimResolver {
    default_client: ClientName,
}

impl ClaimResolver {
    /// Constructs a resolver that falls back to `default_client` when no
    /// client is named
    #[inline]
    pub fn new(default_client: ClientName) -> Self {
        Self { default_client }
    }

    /// The client consulted when no client is named
    #[inline]
    pub fn default_client(&self) -> &ClientNameRef {
        &self.default_client
    }

    /// Roles granted to the caller for `client`, or for the default client
    /// when `client` is `None`
    pub fn resolve(&self, claims: &Map<String, Value>, client: Option<&ClientNameRef>) -> Roles {
        let client = client.unwrap_or(&self.default_client);
        self.resolve_from(claims, RoleSource::Client(client))
    }

    /// Roles granted to the caller across every client
    pub fn resolve_all_clients(&self, claims: &Map<String, Value>) -> Roles {
        self.resolve_from(claims, RoleSource::AllClients)
    }

    /// Realm-wide roles, used as the caller's granted authorities
    pub fn resolve_realm(&self, claims: &Map<String, Value>) -> Roles {
        self.resolve_from(claims, RoleSource::Realm)
    }

    /// Resolves roles from the given source
    pub fn resolve_from(&self, claims: &Map<String, Value>, source: RoleSource<'_>) -> Roles {
        let mut roles = Roles::empty();

        match source {
            RoleSource::Client(client) => {
                if let Some(entry) = resource_access(claims).and_then(|a| a.get(client.as_str())) {
                    collect_roles(entry, &mut roles);
                } else {
                    tracing::trace!(%client, "no resource access entry for client");
                }
            }
            RoleSource::AllClients => {
                if let Some(access) = resource_access(claims) {
                    for entry in access.values() {
                        collect_roles(entry, &mut roles);
                    }
                }
            }
            RoleSource::Realm => {
                if let Some(entry) = claims.get(REALM_ACCESS) {
                    collect_roles(entry, &mut roles);
                } else {
                    tracing::trace!("no realm access claim");
                }
            }
        }

        roles
    }
}

fn resource_access(claims: &Map<String, Value>) -> Option<&Map<String, Value>> {
    match claims.get(RESOURCE_ACCESS) {
        Some(Value::Object(access)) => Some(access),
        Some(other) => {
            tracing::debug!(kind = kind(other), "resource access claim is not an object");
            None
        }
        None => {
            tracing::trace!("no resource access claim");
            None
        }
    }
}

fn collect_roles(entry: &Value, roles: &mut Roles) {
    let list = match entry.get(ROLES) {
        Some(Value::Array(list)) => list,
        Some(other) => {
            tracing::debug!(kind = kind(other), "roles claim is not a list");
            return;
        }
        None => return,
    };

    roles.extend(
        list.iter()
            .filter_map(Value::as_str)
            .filter(|r| !r.is_empty())
            .map(RoleName::from),
    );
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
