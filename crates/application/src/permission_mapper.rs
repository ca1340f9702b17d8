//! Entitlement catalogs and database permission mapping.
//!
//! The paid-plan capability flag is fixed when the mapper is built and
//! threaded through every catalog it produces.

use metasync_domain::{
    Entitlement, EntitlementPurpose, Grant, Resource, ResourceId, ResourceType,
};

use crate::PermissionGraph;

/// Group membership role slug available on every plan.
pub const MEMBER_ROLE: &str = "member";
/// Group manager role slug, exposed as an entitlement on paid plans only.
pub const MANAGER_ROLE: &str = "manager";
/// Database permission for building queries with the query builder.
pub const QUERY_BUILDER_PERMISSION: &str = "query_builder";
/// Database permission for the query builder plus native SQL.
pub const QUERY_BUILDER_AND_NATIVE_PERMISSION: &str = "query_builder_and_native";

const DATABASE_PERMISSIONS: &[(&str, &str)] = &[
    (QUERY_BUILDER_PERMISSION, "Query Builder"),
    (QUERY_BUILDER_AND_NATIVE_PERMISSION, "Query Builder and Native"),
];

/// Role a user holds inside a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupRole {
    /// Plain member.
    Member,
    /// Group manager.
    Manager,
}

impl GroupRole {
    /// Selects the role from an upstream manager flag.
    #[must_use]
    pub fn from_manager_flag(is_group_manager: bool) -> Self {
        if is_group_manager {
            Self::Manager
        } else {
            Self::Member
        }
    }

    /// Classifies an entitlement id by equality or `:slug` suffix.
    #[must_use]
    pub fn from_entitlement_id(entitlement_id: &str) -> Option<Self> {
        let matches = |slug: &str| {
            entitlement_id == slug
                || entitlement_id
                    .strip_suffix(slug)
                    .is_some_and(|prefix| prefix.ends_with(':'))
        };

        if matches(MANAGER_ROLE) {
            Some(Self::Manager)
        } else if matches(MEMBER_ROLE) {
            Some(Self::Member)
        } else {
            None
        }
    }

    /// Returns the entitlement slug.
    #[must_use]
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Member => MEMBER_ROLE,
            Self::Manager => MANAGER_ROLE,
        }
    }

    /// Returns true for the manager role.
    #[must_use]
    pub fn is_manager(&self) -> bool {
        matches!(self, Self::Manager)
    }
}

/// Maps a raw `create-queries` code to a database permission slug.
#[must_use]
pub fn query_permission_for_code(code: &str) -> Option<&'static str> {
    match code {
        "query-builder" => Some(QUERY_BUILDER_PERMISSION),
        "query-builder-and-native" => Some(QUERY_BUILDER_AND_NATIVE_PERMISSION),
        _ => None,
    }
}

/// A database permission held by a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseGrantMapping {
    /// Group identifier as keyed in the permission graph.
    pub group_id: String,
    /// Granted database permission slug.
    pub entitlement_slug: &'static str,
    /// Group entitlements implied for holders of this grant.
    pub expansion_entitlement_ids: Vec<String>,
}

/// Derives entitlement catalogs and grants under a fixed plan capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionMapper {
    paid_plan: bool,
}

impl PermissionMapper {
    /// Creates a mapper for a free (`false`) or paid (`true`) plan.
    #[must_use]
    pub fn new(paid_plan: bool) -> Self {
        Self { paid_plan }
    }

    /// Returns whether manager entitlements are exposed.
    #[must_use]
    pub fn is_paid_plan(&self) -> bool {
        self.paid_plan
    }

    /// Returns the group roles exposed as entitlements on this plan.
    #[must_use]
    pub fn group_roles(&self) -> &'static [GroupRole] {
        if self.paid_plan {
            &[GroupRole::Member, GroupRole::Manager]
        } else {
            &[GroupRole::Member]
        }
    }

    /// Builds the entitlement catalog for a group.
    #[must_use]
    pub fn group_entitlements(&self, group: &Resource) -> Vec<Entitlement> {
        self.group_roles()
            .iter()
            .map(|role| {
                let label = match role {
                    GroupRole::Member => "Member",
                    GroupRole::Manager => "Manager",
                };
                Entitlement::new(group, role.slug(), EntitlementPurpose::Assignment)
                    .with_grantable_to(ResourceType::User)
                    .with_display_name(format!("{} {label}", group.display_name()))
                    .with_description(format!(
                        "Is a {label} of {} group in Metabase",
                        group.display_name()
                    ))
            })
            .collect()
    }

    /// Builds the entitlement catalog for a database.
    #[must_use]
    pub fn database_entitlements(&self, database: &Resource) -> Vec<Entitlement> {
        DATABASE_PERMISSIONS
            .iter()
            .map(|(slug, label)| {
                Entitlement::new(database, *slug, EntitlementPurpose::Permission)
                    .with_grantable_to(ResourceType::Group)
                    .with_display_name(format!("{} {label}", database.display_name()))
                    .with_description(format!(
                        "Grants {label} permission on the {} database",
                        database.display_name()
                    ))
            })
            .collect()
    }

    /// Group entitlement ids implied by any database grant to `group_id`.
    #[must_use]
    pub fn expansion_entitlement_ids(&self, group_id: &str) -> Vec<String> {
        let group = ResourceId::new(ResourceType::Group, group_id);
        self.group_roles()
            .iter()
            .map(|role| Entitlement::compose_id(&group, role.slug()))
            .collect()
    }

    /// Maps the permission graph entries for one database.
    ///
    /// Groups without an entry for `database_id` are skipped, as are codes
    /// that do not name a query capability. Output is ordered by group id.
    #[must_use]
    pub fn map_database_permissions(
        &self,
        database_id: &str,
        graph: &PermissionGraph,
    ) -> Vec<DatabaseGrantMapping> {
        let mut mappings: Vec<DatabaseGrantMapping> = graph
            .groups
            .iter()
            .filter_map(|(group_id, databases)| {
                let permission = databases.get(database_id)?;
                let slug = query_permission_for_code(permission.create_queries.as_deref()?)?;
                Some(DatabaseGrantMapping {
                    group_id: group_id.clone(),
                    entitlement_slug: slug,
                    expansion_entitlement_ids: self.expansion_entitlement_ids(group_id),
                })
            })
            .collect();

        mappings.sort_by(|left, right| {
            group_sort_key(&left.group_id).cmp(&group_sort_key(&right.group_id))
        });
        mappings
    }

    /// Builds expandable grants of database permissions to groups.
    #[must_use]
    pub fn database_grants(&self, database: &ResourceId, graph: &PermissionGraph) -> Vec<Grant> {
        self.map_database_permissions(database.resource.as_str(), graph)
            .into_iter()
            .map(|mapping| {
                Grant::new(
                    database,
                    mapping.entitlement_slug,
                    ResourceId::new(ResourceType::Group, mapping.group_id),
                )
                .with_expansion(mapping.expansion_entitlement_ids)
            })
            .collect()
    }
}

fn group_sort_key(group_id: &str) -> (bool, Option<i64>, &str) {
    // numeric ids first in numeric order, anything else lexically after
    let numeric = group_id.parse::<i64>().ok();
    (numeric.is_none(), numeric, group_id)
}
