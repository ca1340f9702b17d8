use std::sync::Arc;

use tracing::info;

use metasync_core::{AppError, AppResult};
use metasync_domain::{
    Annotated, Annotation, Annotations, Entitlement, Grant, MutationOutcome, ResourceId,
    ResourceType,
};

use crate::permission_mapper::GroupRole;
use crate::{MembershipDirectory, MembershipMap, MetabaseMembership, NewMembership};

/// Adds and removes group memberships idempotently.
#[derive(Clone)]
pub struct GrantService {
    memberships: Arc<dyn MembershipDirectory>,
}

impl GrantService {
    /// Creates a new service from the membership directory.
    #[must_use]
    pub fn new(memberships: Arc<dyn MembershipDirectory>) -> Self {
        Self { memberships }
    }

    /// Grants a group entitlement to a user.
    ///
    /// An existing membership in the group, in either role, satisfies the
    /// request without a mutation.
    pub async fn grant(
        &self,
        principal: &ResourceId,
        entitlement: &Entitlement,
    ) -> Annotated<MutationOutcome> {
        let mut annotations = Annotations::new();
        let result = self.apply_grant(principal, entitlement, &mut annotations).await;
        Annotated::new(annotations, result)
    }

    /// Revokes a user's membership in the grant's group.
    pub async fn revoke(&self, grant: &Grant) -> Annotated<MutationOutcome> {
        let mut annotations = Annotations::new();
        let result = self.apply_revoke(grant, &mut annotations).await;
        Annotated::new(annotations, result)
    }

    /// Lists the group grants held by a user.
    pub async fn user_grants(&self, user: &ResourceId) -> Annotated<Vec<Grant>> {
        let mut annotations = Annotations::new();
        let result = self
            .list_memberships(&mut annotations)
            .await
            .map(|memberships| grants_for_user(user, &memberships));
        Annotated::new(annotations, result)
    }

    async fn apply_grant(
        &self,
        principal: &ResourceId,
        entitlement: &Entitlement,
        annotations: &mut Annotations,
    ) -> AppResult<MutationOutcome> {
        let group_id = group_id(entitlement.resource())?;
        let user_id = user_id(principal)?;

        let memberships = self.list_memberships(annotations).await?;
        if find_membership(&memberships, user_id, group_id).is_some() {
            info!(user_id, group_id, "membership already exists");
            annotations.update(Annotation::GrantAlreadyExists);
            return Ok(MutationOutcome::AlreadySatisfied);
        }

        let role = GroupRole::from_entitlement_id(entitlement.id())
            .ok_or_else(|| AppError::UnsupportedEntitlement(entitlement.id().to_owned()))?;

        self.memberships
            .add_membership(NewMembership {
                group_id,
                user_id,
                is_group_manager: role.is_manager(),
            })
            .await
            .record(annotations)
            .map_err(|error| {
                error.context(format!("failed to grant user {user_id} to group {group_id}"))
            })?;

        info!(user_id, group_id, role = role.slug(), "membership granted");
        Ok(MutationOutcome::Applied)
    }

    async fn apply_revoke(
        &self,
        grant: &Grant,
        annotations: &mut Annotations,
    ) -> AppResult<MutationOutcome> {
        let group_id = group_id(grant.entitlement_resource())?;
        let user_id = user_id(grant.principal())?;

        let memberships = self.list_memberships(annotations).await?;
        let Some(membership) = find_membership(&memberships, user_id, group_id) else {
            info!(user_id, group_id, "membership already revoked");
            annotations.update(Annotation::GrantAlreadyRevoked);
            return Ok(MutationOutcome::AlreadySatisfied);
        };

        self.memberships
            .remove_membership(membership.membership_id)
            .await
            .record(annotations)
            .map_err(|error| {
                error.context(format!(
                    "failed to revoke user {user_id} from group {group_id}"
                ))
            })?;

        info!(
            user_id,
            group_id,
            membership_id = membership.membership_id,
            "membership revoked"
        );
        Ok(MutationOutcome::Applied)
    }

    async fn list_memberships(&self, annotations: &mut Annotations) -> AppResult<MembershipMap> {
        self.memberships
            .list_memberships()
            .await
            .record(annotations)
            .map_err(|error| error.context("failed to list memberships"))
    }
}

fn group_id(resource: &ResourceId) -> AppResult<i64> {
    if resource.resource_type != ResourceType::Group {
        return Err(AppError::UnsupportedEntitlement(format!(
            "entitlements on {} resources cannot be granted to users",
            resource.resource_type
        )));
    }
    resource.upstream_id()
}

fn user_id(principal: &ResourceId) -> AppResult<i64> {
    if principal.resource_type != ResourceType::User {
        return Err(AppError::invalid_argument(format!(
            "only users can be granted group membership, got {}",
            principal.resource_type
        )));
    }
    principal.upstream_id()
}

fn find_membership(
    memberships: &MembershipMap,
    user_id: i64,
    group_id: i64,
) -> Option<MetabaseMembership> {
    memberships
        .get(&user_id.to_string())?
        .iter()
        .find(|membership| membership.group_id == group_id)
        .copied()
}

fn grants_for_user(user: &ResourceId, memberships: &MembershipMap) -> Vec<Grant> {
    let mut held: Vec<MetabaseMembership> = memberships
        .get(&user.resource)
        .cloned()
        .unwrap_or_default();
    held.sort_by_key(|membership| membership.group_id);

    held.into_iter()
        .map(|membership| {
            Grant::new(
                &ResourceId::new(ResourceType::Group, membership.group_id.to_string()),
                GroupRole::from_manager_flag(membership.is_group_manager).slug(),
                user.clone(),
            )
        })
        .collect()
}
