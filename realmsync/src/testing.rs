//! An in-memory identity provider that records every call made against it

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use axum::http::StatusCode;
use realmsync_claims::RoleName;
use realmsync_gateway::{
    dto::{ExternalRole, ExternalUser, RolePage},
    IdentityProviderGateway, RealmNameRef, Upstream, UpstreamError, UserId, UserIdRef,
};

pub(crate) const REALM: &str = "acme";
pub(crate) const DEFAULT_ROLE: &str = "default-roles-acme";

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Call {
    FindExact(String),
    Search(String),
    Create(String),
    Update(UserId),
    ListAvailable { first: u32, max: u32 },
    ListAssigned,
    Assign(Vec<RoleName>),
    Revoke(Vec<RoleName>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Step {
    Create,
    Update,
    ListAvailable,
    ListAssigned,
    Assign,
    Revoke,
}

type FailureFn = Box<dyn Fn() -> UpstreamError + Send + Sync>;

#[derive(Default)]
struct State {
    catalogue: Vec<ExternalRole>,
    users: Vec<ExternalUser>,
    assigned: HashMap<UserId, Vec<RoleName>>,
    calls: Vec<Call>,
    failures: HashMap<Step, FailureFn>,
}

#[derive(Default)]
pub(crate) struct FakeProvider {
    state: Mutex<State>,
}

impl std::fmt::Debug for FakeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeProvider").finish_non_exhaustive()
    }
}

impl FakeProvider {
    /// A realm offering the given roles besides its default role
    pub(crate) fn with_roles(roles: &[&str]) -> Arc<Self> {
        let provider = Self::default();
        {
            let mut state = provider.lock();
            state.catalogue.push(ExternalRole::named(DEFAULT_ROLE));
            state
                .catalogue
                .extend(roles.iter().copied().map(ExternalRole::named));
        }
        Arc::new(provider)
    }

    /// Adds a user holding the default role plus `roles`
    pub(crate) fn add_user(&self, id: &str, username: &str, roles: &[&str]) {
        let mut state = self.lock();
        state.users.push(ExternalUser {
            id: Some(UserId::from(id)),
            username: username.to_owned(),
            email: Some(format!("{username}@example.com")),
            ..ExternalUser::default()
        });

        let mut assigned = vec![RoleName::from_static(DEFAULT_ROLE)];
        assigned.extend(roles.iter().copied().map(RoleName::from));
        state.assigned.insert(UserId::from(id), assigned);
    }

    pub(crate) fn fail_on(
        &self,
        step: Step,
        failure: impl Fn() -> UpstreamError + Send + Sync + 'static,
    ) {
        self.lock().failures.insert(step, Box::new(failure));
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// The roles currently held by the user, sorted
    pub(crate) fn assigned(&self, id: &str) -> Vec<String> {
        let state = self.lock();
        let mut roles: Vec<String> = state
            .assigned
            .get(UserIdRef::from_str(id))
            .into_iter()
            .flatten()
            .map(|r| r.as_str().to_owned())
            .collect();
        roles.sort();
        roles
    }

    pub(crate) fn user(&self, id: &str) -> Option<ExternalUser> {
        self.lock()
            .users
            .iter()
            .find(|u| u.id.as_deref() == Some(UserIdRef::from_str(id)))
            .cloned()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn enter(&self, call: Call, step: Option<Step>) -> Result<MutexGuard<'_, State>, UpstreamError> {
        let mut state = self.lock();
        state.calls.push(call);

        if let Some(step) = step {
            if let Some(failure) = state.failures.get(&step) {
                return Err(failure());
            }
        }

        Ok(state)
    }
}

fn check_realm(realm: &RealmNameRef) -> Result<(), UpstreamError> {
    if realm.as_str() == REALM {
        Ok(())
    } else {
        Err(UpstreamError::status(StatusCode::NOT_FOUND, "Realm not found."))
    }
}

fn names(roles: &[ExternalRole]) -> Vec<RoleName> {
    roles.iter().map(|r| r.name.clone()).collect()
}

#[async_trait]
impl IdentityProviderGateway for FakeProvider {
    async fn find_users_by_exact_username(
        &self,
        realm: &RealmNameRef,
        username: &str,
    ) -> Result<Upstream<Vec<ExternalUser>>, UpstreamError> {
        check_realm(realm)?;
        let state = self.enter(Call::FindExact(username.to_owned()), None)?;
        let users = state
            .users
            .iter()
            .filter(|u| u.username == username)
            .cloned()
            .collect();
        Ok(Upstream::new(StatusCode::OK, users))
    }

    async fn find_users_by_search_term(
        &self,
        realm: &RealmNameRef,
        term: &str,
    ) -> Result<Upstream<Vec<ExternalUser>>, UpstreamError> {
        check_realm(realm)?;
        let state = self.enter(Call::Search(term.to_owned()), None)?;
        let users = state
            .users
            .iter()
            .filter(|u| u.username.contains(term))
            .cloned()
            .collect();
        Ok(Upstream::new(StatusCode::OK, users))
    }

    async fn create_user(
        &self,
        realm: &RealmNameRef,
        user: &ExternalUser,
    ) -> Result<Upstream<UserId>, UpstreamError> {
        check_realm(realm)?;
        let mut state = self.enter(Call::Create(user.username.clone()), Some(Step::Create))?;

        if state.users.iter().any(|u| u.username == user.username) {
            return Err(UpstreamError::status(
                StatusCode::CONFLICT,
                "User exists with same username",
            ));
        }

        let id = UserId::from(format!("id-{}", state.users.len() + 1));
        state.users.push(ExternalUser {
            id: Some(id.clone()),
            ..user.clone()
        });
        state
            .assigned
            .insert(id.clone(), vec![RoleName::from_static(DEFAULT_ROLE)]);

        Ok(Upstream::new(StatusCode::CREATED, id))
    }

    async fn update_user(
        &self,
        realm: &RealmNameRef,
        id: &UserIdRef,
        user: &ExternalUser,
    ) -> Result<Upstream<()>, UpstreamError> {
        check_realm(realm)?;
        let mut state = self.enter(Call::Update(id.to_owned()), Some(Step::Update))?;

        let existing = state
            .users
            .iter_mut()
            .find(|u| u.id.as_deref() == Some(id))
            .ok_or_else(|| UpstreamError::status(StatusCode::NOT_FOUND, "User not found"))?;
        *existing = ExternalUser {
            id: Some(id.to_owned()),
            credentials: Vec::new(),
            ..user.clone()
        };

        Ok(Upstream::new(StatusCode::NO_CONTENT, ()))
    }

    async fn list_available_realm_roles(
        &self,
        realm: &RealmNameRef,
        id: &UserIdRef,
        first: u32,
        max: u32,
    ) -> Result<Upstream<RolePage>, UpstreamError> {
        check_realm(realm)?;
        let state = self.enter(Call::ListAvailable { first, max }, Some(Step::ListAvailable))?;

        let held = state
            .assigned
            .get(id)
            .ok_or_else(|| UpstreamError::status(StatusCode::NOT_FOUND, "User not found"))?;
        let window = state
            .catalogue
            .iter()
            .filter(|r| !held.iter().any(|h| h == &r.name))
            .skip(first as usize)
            .take(max as usize)
            .cloned()
            .collect();

        Ok(Upstream::new(StatusCode::OK, RolePage::new(window, first, max)))
    }

    async fn list_assigned_realm_roles(
        &self,
        realm: &RealmNameRef,
        id: &UserIdRef,
    ) -> Result<Upstream<Vec<ExternalRole>>, UpstreamError> {
        check_realm(realm)?;
        let state = self.enter(Call::ListAssigned, Some(Step::ListAssigned))?;

        let held = state
            .assigned
            .get(id)
            .ok_or_else(|| UpstreamError::status(StatusCode::NOT_FOUND, "User not found"))?;
        let roles = held.iter().cloned().map(ExternalRole::named).collect();

        Ok(Upstream::new(StatusCode::OK, roles))
    }

    async fn assign_realm_roles(
        &self,
        realm: &RealmNameRef,
        id: &UserIdRef,
        roles: &[ExternalRole],
    ) -> Result<Upstream<()>, UpstreamError> {
        check_realm(realm)?;
        let mut state = self.enter(Call::Assign(names(roles)), Some(Step::Assign))?;

        let held = state
            .assigned
            .get_mut(id)
            .ok_or_else(|| UpstreamError::status(StatusCode::NOT_FOUND, "User not found"))?;
        for role in roles {
            if !held.iter().any(|h| h == &role.name) {
                held.push(role.name.clone());
            }
        }

        Ok(Upstream::new(StatusCode::NO_CONTENT, ()))
    }

    async fn revoke_realm_roles(
        &self,
        realm: &RealmNameRef,
        id: &UserIdRef,
        roles: &[ExternalRole],
    ) -> Result<Upstream<()>, UpstreamError> {
        check_realm(realm)?;
        let mut state = self.enter(Call::Revoke(names(roles)), Some(Step::Revoke))?;

        let held = state
            .assigned
            .get_mut(id)
            .ok_or_else(|| UpstreamError::status(StatusCode::NOT_FOUND, "User not found"))?;
        held.retain(|h| !roles.iter().any(|r| &r.name == h));

        Ok(Upstream::new(StatusCode::NO_CONTENT, ()))
    }
}

/// Role names from string literals
pub(crate) fn role_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<RoleName> {
    names.into_iter().map(RoleName::from).collect()
}

