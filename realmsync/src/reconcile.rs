use std::{collections::HashMap, sync::Arc};

use axum::http::StatusCode;
use realmsync_claims::{is_realm_default_role, RoleName, RoleNameRef};
use realmsync_gateway::{
    dto::ExternalRole, IdentityProviderGateway, RealmName, RealmNameRef, UserIdRef,
};

use crate::{validate::UserUpdate, ResponseEnvelope, ServiceError, ValidationError};

/// Brings a user's profile and realm roles in line with a desired state
///
/// An update is a sequence of remote calls with no transaction around them:
///
/// 1. the assigned roles are fetched
/// 2. the desired roles are checked against everything the realm offers
/// 3. every assigned role is revoked
/// 4. the profile is replaced
/// 5. the desired roles are assigned
///
/// The first failure stops the sequence. The realm-default role is never
/// revoked or assigned. With compensation enabled, a failure after the
/// revoke triggers a best-effort re-assignment of the original roles.
#[derive(Clone)]
pub struct RoleReconciler {
    gateway: Arc<dyn IdentityProviderGateway>,
    realm: RealmName,
    compensate: bool,
}

impl std::fmt::Debug for RoleReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleReconciler")
            .field("realm", &self.realm)
            .field("compensate", &self.compensate)
            .finish_non_exhaustive()
    }
}

impl RoleReconciler {
    /// Reconciles users of `realm` through `gateway`
    pub fn new(gateway: Arc<dyn IdentityProviderGateway>, realm: RealmName) -> Self {
        Self {
            gateway,
            realm,
            compensate: false,
        }
    }

    /// Enables or disables restoring the original roles after a failed update
    pub fn with_compensation(mut self, compensate: bool) -> Self {
        self.compensate = compensate;
        self
    }

    /// The realm this reconciler operates on
    #[inline]
    pub fn realm(&self) -> &RealmNameRef {
        &self.realm
    }

    /// Replaces the user's profile and realm roles
    ///
    /// Answers `202 Accepted` with the applied update, or the status and
    /// reason of the first failing step.
    pub async fn update_user(&self, id: &UserIdRef, mut update: UserUpdate) -> ResponseEnvelope {
        match self.reconcile(id, &update).await {
            Ok(()) => {
                update.user.id = Some(id.to_owned());
                update.user.credentials.clear();
                ResponseEnvelope::success(StatusCode::ACCEPTED, &update)
            }
            Err(err) => err.into(),
        }
    }

    #[tracing::instrument(level = "debug", skip_all, fields(realm = %self.realm, user.id = %id))]
    async fn reconcile(&self, id: &UserIdRef, update: &UserUpdate) -> Result<(), ServiceError> {
        update.validate()?;

        let assigned = self.assigned_roles(id).await?;
        tracing::debug!(assigned = assigned.len(), "fetched assigned roles");

        let desired = self.resolve_desired(id, &assigned, &update.roles).await?;
        tracing::debug!(desired = desired.len(), "validated desired roles");

        if assigned.is_empty() {
            tracing::debug!("no roles to revoke");
        } else {
            self.gateway
                .revoke_realm_roles(&self.realm, id, &assigned)
                .await?;
            tracing::debug!(revoked = assigned.len(), "revoked assigned roles");
        }

        let outcome = self.apply(id, update, &desired).await;

        if let Err(err) = &outcome {
            if self.compensate && !assigned.is_empty() {
                self.restore(id, &assigned, err).await;
            }
        }

        outcome
    }

    async fn apply(
        &self,
        id: &UserIdRef,
        update: &UserUpdate,
        desired: &[ExternalRole],
    ) -> Result<(), ServiceError> {
        self.gateway
            .update_user(&self.realm, id, &update.user)
            .await?;
        tracing::debug!("updated profile");

        if desired.is_empty() {
            tracing::debug!("no roles to assign");
        } else {
            self.gateway
                .assign_realm_roles(&self.realm, id, desired)
                .await?;
            tracing::debug!(assigned = desired.len(), "assigned desired roles");
        }

        Ok(())
    }

    async fn restore(&self, id: &UserIdRef, original: &[ExternalRole], cause: &ServiceError) {
        match self
            .gateway
            .assign_realm_roles(&self.realm, id, original)
            .await
        {
            Ok(_) => tracing::warn!(
                cause = %cause,
                restored = original.len(),
                "restored original roles after failed update"
            ),
            Err(err) => tracing::error!(
                cause = %cause,
                error = %err,
                "unable to restore original roles after failed update"
            ),
        }
    }

    async fn assigned_roles(&self, id: &UserIdRef) -> Result<Vec<ExternalRole>, ServiceError> {
        let roles = self
            .gateway
            .list_assigned_realm_roles(&self.realm, id)
            .await?
            .into_payload()
            .into_iter()
            .filter(|r| !r.is_realm_default())
            .collect();

        Ok(roles)
    }

    /// Maps desired role names onto the representations the realm offers
    ///
    /// Duplicates collapse and the realm-default role is dropped. Every name
    /// the realm does not offer is reported.
    async fn resolve_desired(
        &self,
        id: &UserIdRef,
        assigned: &[ExternalRole],
        desired: &[RoleName],
    ) -> Result<Vec<ExternalRole>, ServiceError> {
        let available = self
            .gateway
            .list_all_available_realm_roles(&self.realm, id)
            .await?;

        let catalogue: HashMap<&RoleNameRef, &ExternalRole> = assigned
            .iter()
            .chain(&available)
            .filter(|r| !r.is_realm_default())
            .map(|r| (r.name(), r))
            .collect();

        let mut resolved: Vec<ExternalRole> = Vec::with_capacity(desired.len());
        let mut errors = ValidationError::new();

        for name in desired {
            let name: &RoleNameRef = name;

            if is_realm_default_role(name) {
                tracing::debug!(role = %name, "ignoring request for realm-default role");
                continue;
            }

            if resolved.iter().any(|r| r.name() == name) {
                continue;
            }

            match catalogue.get(name) {
                Some(role) => resolved.push((*role).clone()),
                None => errors.push(format!("role {name} is not available in this realm")),
            }
        }

        errors.into_result()?;
        Ok(resolved)
    }
}
