//! Local checks on user payloads before any remote call is made

use realmsync_claims::RoleName;
use realmsync_gateway::dto::ExternalUser;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::ValidationError;

/// A profile update together with the realm roles the user should end up with
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    /// The replacement profile
    #[serde(flatten)]
    pub user: ExternalUser,
    /// The realm roles desired after the update
    #[serde(default, rename = "userRoles")]
    pub roles: Vec<RoleName>,
}

impl UserUpdate {
    /// Pairs a profile with its desired roles
    pub fn new(user: ExternalUser, roles: impl IntoIterator<Item = impl Into<RoleName>>) -> Self {
        Self {
            user,
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// Checks the profile and every desired role name
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = profile_errors(&self.user);

        if self.roles.iter().any(|r| r.as_str().trim().is_empty()) {
            errors.push("role names must not be empty");
        }

        errors.into_result()
    }
}

/// Checks a user profile
pub fn validate_user(user: &ExternalUser) -> Result<(), ValidationError> {
    profile_errors(user).into_result()
}

#[derive(Debug, Validate)]
struct ProfileRules {
    #[validate(length(min = 1, message = "username must not be empty"))]
    username: String,
    #[validate(
        required(message = "email must not be empty"),
        length(min = 5, message = "email must be at least 5 characters long"),
        email(message = "email is not a valid address")
    )]
    email: Option<String>,
}

impl ProfileRules {
    const FIELDS: [&'static str; 2] = ["username", "email"];
}

impl From<&ExternalUser> for ProfileRules {
    fn from(user: &ExternalUser) -> Self {
        Self {
            username: user.username.trim().to_owned(),
            email: user
                .email
                .as_deref()
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_owned),
        }
    }
}

fn profile_errors(user: &ExternalUser) -> ValidationError {
    let mut errors = ValidationError::new();

    if let Err(invalid) = ProfileRules::from(user).validate() {
        let fields = invalid.field_errors();
        for field in ProfileRules::FIELDS {
            for err in fields.get(field).into_iter().flat_map(|errs| errs.iter()) {
                match &err.message {
                    Some(message) => errors.push(message.to_string()),
                    None => errors.push(format!("{field} is invalid")),
                }
            }
        }
    }

    errors
}
