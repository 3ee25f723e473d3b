use aliri_braid::braid;

/// The name of a role defined in an identity provider realm
///
/// Role names are compared exactly; Keycloak treats `ADMIN` and `admin` as
/// distinct roles.
#[braid(serde, ref_doc = "A borrowed reference to a [`RoleName`]")]
pub struct RoleName;

/// The identifier of a client whose roles appear under `resource_access`
#[braid(serde, ref_doc = "A borrowed reference to a [`ClientName`]")]
pub struct ClientName;
