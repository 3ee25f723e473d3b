//! Representations exchanged with the Keycloak admin API

use std::collections::BTreeMap;

use realmsync_claims::{is_realm_default_role, RoleName, RoleNameRef};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// A user as represented by the identity provider
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalUser {
    /// The provider-assigned identifier, absent before creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    /// The login name, unique within the realm
    #[serde(default)]
    pub username: String,
    /// Given name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Family name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Email address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Whether the email address has been verified
    #[serde(default)]
    pub email_verified: bool,
    /// Whether the user may sign in
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Free-form attributes, each holding a list of values
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Vec<String>>,
    /// Credentials to set, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub credentials: Vec<Credential>,
}

fn enabled_by_default() -> bool {
    true
}

/// A credential attached to a user on creation or update
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    /// Whether the user must change the credential on next sign in
    #[serde(default)]
    pub temporary: bool,
    /// The credential type, usually `password`
    #[serde(rename = "type")]
    pub kind: String,
    /// The credential value
    pub value: String,
}

impl Credential {
    /// A password credential
    pub fn password(value: impl Into<String>, temporary: bool) -> Self {
        Self {
            temporary,
            kind: "password".to_owned(),
            value: value.into(),
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("temporary", &self.temporary)
            .field("kind", &self.kind)
            .field("value", &"***")
            .finish()
    }
}

/// A role as represented by the identity provider
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalRole {
    /// The provider-assigned identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The role name
    pub name: RoleName,
    /// A human readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the role is composed of other roles
    #[serde(default)]
    pub composite: bool,
    /// Whether the role belongs to a client rather than the realm
    #[serde(default)]
    pub client_role: bool,
    /// The realm or client the role belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
}

impl ExternalRole {
    /// A realm role known only by name
    pub fn named(name: impl Into<RoleName>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            composite: false,
            client_role: false,
            container_id: None,
        }
    }

    /// Whether this is the realm-default role that the provider manages
    #[inline]
    pub fn is_realm_default(&self) -> bool {
        is_realm_default_role(&self.name)
    }

    /// The role name
    #[inline]
    pub fn name(&self) -> &RoleNameRef {
        &self.name
    }
}

/// One window of the roles available for assignment to a user
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RolePage {
    roles: Vec<ExternalRole>,
    first: u32,
    max: u32,
}

impl RolePage {
    /// Wraps the roles returned for the window starting at `first` and
    /// holding at most `max` entries
    pub fn new(roles: Vec<ExternalRole>, first: u32, max: u32) -> Self {
        Self { roles, first, max }
    }

    /// The roles in this window
    #[inline]
    pub fn roles(&self) -> &[ExternalRole] {
        &self.roles
    }

    /// Takes the roles out of the window
    #[inline]
    pub fn into_roles(self) -> Vec<ExternalRole> {
        self.roles
    }

    /// The offset this window starts at
    #[inline]
    pub fn first(&self) -> u32 {
        self.first
    }

    /// The size of the requested window
    #[inline]
    pub fn max(&self) -> u32 {
        self.max
    }

    /// Whether more roles may follow this window
    ///
    /// A window filled to capacity cannot tell a complete listing apart from a
    /// truncated one.
    #[inline]
    pub fn is_possibly_truncated(&self) -> bool {
        self.max > 0 && self.roles.len() >= self.max as usize
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    mod external_user {
        use super::*;

        #[test]
        fn deserializes_keycloak_representation() {
            let user: ExternalUser = serde_json::from_value(json!({
                "id": "5e1b7c2a",
                "createdTimestamp": 1_700_000_000_000_u64,
                "username": "ada",
                "enabled": false,
                "emailVerified": true,
                "firstName": "Ada",
                "lastName": "Lovelace",
                "email": "ada@example.com",
                "attributes": { "locale": ["en"] },
            }))
            .unwrap();

            assert_eq!(user.id, Some(UserId::from_static("5e1b7c2a")));
            assert_eq!(user.first_name.as_deref(), Some("Ada"));
            assert!(user.email_verified);
            assert!(!user.enabled);
            assert_eq!(user.attributes["locale"], vec!["en".to_owned()]);
        }

        #[test]
        fn enabled_defaults_to_true() {
            let user: ExternalUser = serde_json::from_value(json!({ "username": "ada" })).unwrap();
            assert!(user.enabled);
        }

        #[test]
        fn serializes_in_camel_case_without_empty_fields() {
            let user = ExternalUser {
                username: "ada".to_owned(),
                first_name: Some("Ada".to_owned()),
                enabled: true,
                credentials: vec![Credential::password("pw", true)],
                ..ExternalUser::default()
            };

            assert_eq!(
                serde_json::to_value(&user).unwrap(),
                json!({
                    "username": "ada",
                    "firstName": "Ada",
                    "emailVerified": false,
                    "enabled": true,
                    "credentials": [{ "temporary": true, "type": "password", "value": "pw" }],
                })
            );
        }

        #[test]
        fn credential_values_are_not_debug_printed() {
            let printed = format!("{:?}", Credential::password("hunter2", false));
            assert!(!printed.contains("hunter2"));
        }
    }

    mod external_role {
        use super::*;

        #[test]
        fn deserializes_keycloak_representation() {
            let role: ExternalRole = serde_json::from_value(json!({
                "id": "a1",
                "name": "editor",
                "composite": false,
                "clientRole": false,
                "containerId": "acme",
            }))
            .unwrap();

            assert_eq!(role.name.as_str(), "editor");
            assert_eq!(role.container_id.as_deref(), Some("acme"));
            assert!(!role.is_realm_default());
        }

        #[test]
        fn recognizes_the_realm_default_role() {
            assert!(ExternalRole::named("default-roles-acme").is_realm_default());
        }
    }

    mod role_page {
        use super::*;

        fn roles(count: usize) -> Vec<ExternalRole> {
            (0..count)
                .map(|i| ExternalRole::named(format!("role-{i}")))
                .collect()
        }

        #[test]
        fn a_full_window_is_possibly_truncated() {
            assert!(RolePage::new(roles(101), 0, 101).is_possibly_truncated());
        }

        #[test]
        fn a_short_window_is_complete() {
            assert!(!RolePage::new(roles(100), 0, 101).is_possibly_truncated());
            assert!(!RolePage::new(Vec::new(), 0, 101).is_possibly_truncated());
        }
    }
}
