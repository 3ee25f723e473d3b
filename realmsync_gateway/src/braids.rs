use aliri_braid::braid;

/// The name of a Keycloak realm
#[braid(serde, ref_doc = "A borrowed reference to a [`RealmName`]")]
pub struct RealmName;

/// The opaque identifier Keycloak assigns to a user
#[braid(serde, ref_doc = "A borrowed reference to a [`UserId`]")]
pub struct UserId;
