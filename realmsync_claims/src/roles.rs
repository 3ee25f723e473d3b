use std::{collections::hash_set, iter::FromIterator};

use ahash::AHashSet;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{RoleName, RoleNameRef};

/// A set of role names granted to, or required of, a caller
///
/// Ordering is irrelevant and duplicates collapse.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Roles(AHashSet<RoleName>);

impl Roles {
    /// Produces an empty role set
    #[inline]
    pub fn empty() -> Self {
        Self(AHashSet::new())
    }

    /// Constructs a role set holding a single role
    #[inline]
    pub fn single(role: RoleName) -> Self {
        let mut s = Self::empty();
        s.insert(role);
        s
    }

    /// Adds a role to the set, returning whether it was newly added
    #[inline]
    pub fn insert(&mut self, role: RoleName) -> bool {
        self.0.insert(role)
    }

    /// Whether the set holds the given role
    #[inline]
    pub fn contains(&self, role: &RoleNameRef) -> bool {
        self.0.contains(role)
    }

    /// Checks to see whether this set contains every role in `subset`
    #[inline]
    pub fn contains_all(&self, subset: &Roles) -> bool {
        self.0.is_superset(&subset.0)
    }

    /// The number of distinct roles
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set holds no roles at all
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Produces an iterator of the roles in this set
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &RoleNameRef> {
        self.into_iter()
    }

    /// The roles in lexical order
    pub fn sorted(&self) -> Vec<&RoleNameRef> {
        let mut roles: Vec<_> = self.iter().collect();
        roles.sort_unstable();
        roles
    }
}

impl IntoIterator for Roles {
    type Item = RoleName;
    type IntoIter = <AHashSet<RoleName> as IntoIterator>::IntoIter;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// An iterator over a set of borrowed roles
#[derive(Clone, Debug)]
pub struct Iter<'a> {
    iter: hash_set::Iter<'a, RoleName>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a RoleNameRef;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|x| x.as_ref())
    }
}

impl<'a> IntoIterator for &'a Roles {
    type Item = &'a RoleNameRef;
    type IntoIter = Iter<'a>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        Iter {
            iter: self.0.iter(),
        }
    }
}

impl<S> Extend<S> for Roles
where
    S: Into<RoleName>,
{
    #[inline]
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = S>,
    {
        self.0.extend(iter.into_iter().map(Into::into))
    }
}

impl<S> FromIterator<S> for Roles
where
    S: Into<RoleName>,
{
    #[inline]
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = S>,
    {
        let mut set = Self::empty();
        set.extend(iter);
        set
    }
}

impl Serialize for Roles {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.sorted())
    }
}

impl<'de> Deserialize<'de> for Roles {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let roles = Vec::<RoleName>::deserialize(deserializer)?;
        Ok(roles.into_iter().collect())
    }
}

/// Construct a role set from a list of role names
///
/// ```
/// use realmsync_claims::{roles, Roles, RoleNameRef};
///
/// let held = roles!["editor", "viewer", "editor"];
/// assert_eq!(held.len(), 2);
/// assert!(held.contains(RoleNameRef::from_static("viewer")));
/// assert_eq!(roles![], Roles::empty());
/// ```
#[macro_export]
macro_rules! roles {
    ($($role:expr),* $(,)?) => {
        <$crate::Roles as ::core::iter::FromIterator<$crate::RoleName>>::from_iter([
            $($crate::RoleName::from_static($role)),*
        ])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_collapse() {
        let roles: Roles = ["editor", "viewer", "editor"].into_iter().collect();
        assert_eq!(roles.len(), 2);
    }

    #[test]
    fn superset_contains_all_of_subset() {
        let held = roles!["editor", "viewer", "auditor"];
        assert!(held.contains_all(&roles!["viewer", "editor"]));
        assert!(!held.contains_all(&roles!["viewer", "ADMIN"]));
    }

    #[test]
    fn every_set_contains_the_empty_set() {
        assert!(Roles::empty().contains_all(&Roles::empty()));
        assert!(roles!["viewer"].contains_all(&Roles::empty()));
    }

    #[test]
    fn serializes_in_lexical_order() {
        let roles = roles!["viewer", "ADMIN", "editor"];
        let json = serde_json::to_value(&roles).unwrap();
        assert_eq!(json, serde_json::json!(["ADMIN", "editor", "viewer"]));
    }

    #[test]
    fn deserializes_from_a_list_with_duplicates() {
        let roles: Roles = serde_json::from_str(r#"["a", "b", "a"]"#).unwrap();
        assert_eq!(roles, roles!["a", "b"]);
    }
}
