//! Listing surface for users, groups, and databases.
//!
//! Membership grants are computed from the user side, since the membership
//! map is keyed by user id. Group resources therefore report no grants.

use std::sync::Arc;

use tracing::debug;

use metasync_core::{AppResult, PageCursor};
use metasync_domain::{Annotated, Annotations, Entitlement, Grant, Resource, ResourceType};

use crate::pagination::{ListPage, next_page_cursor, page_options};
use crate::permission_mapper::PermissionMapper;
use crate::resource_builders::{database_resource, group_resource, user_resource};
use crate::{GrantService, MembershipDirectory, MetabaseClient};

/// Builds resources, entitlements, and grants for every resource type.
#[derive(Clone)]
pub struct SyncService {
    client: Arc<dyn MetabaseClient>,
    grants: GrantService,
    mapper: PermissionMapper,
    page_size: i64,
}

impl SyncService {
    /// Creates a new service.
    ///
    /// A non-positive `page_size` falls back to the default page size.
    #[must_use]
    pub fn new(
        client: Arc<dyn MetabaseClient>,
        memberships: Arc<dyn MembershipDirectory>,
        mapper: PermissionMapper,
        page_size: i64,
    ) -> Self {
        Self {
            client,
            grants: GrantService::new(memberships),
            mapper,
            page_size,
        }
    }

    /// Lists one page of resources of the given type.
    pub async fn list(
        &self,
        resource_type: ResourceType,
        cursor: &PageCursor,
    ) -> Annotated<ListPage<Resource>> {
        match resource_type {
            ResourceType::User => self.list_users(cursor).await,
            ResourceType::Group => self.list_groups().await,
            ResourceType::Database => self.list_databases().await,
        }
    }

    /// Lists the entitlements offered by a resource.
    #[must_use]
    pub fn entitlements(&self, resource: &Resource) -> ListPage<Entitlement> {
        let entitlements = match resource.id().resource_type {
            ResourceType::User => Vec::new(),
            ResourceType::Group => self.mapper.group_entitlements(resource),
            ResourceType::Database => self.mapper.database_entitlements(resource),
        };
        ListPage::last(entitlements)
    }

    /// Lists the grants attached to a resource.
    pub async fn grants(&self, resource: &Resource) -> Annotated<ListPage<Grant>> {
        match resource.id().resource_type {
            ResourceType::User => self
                .grants
                .user_grants(resource.id())
                .await
                .map(ListPage::last),
            ResourceType::Group => Annotated::ok(Annotations::new(), ListPage::last(Vec::new())),
            ResourceType::Database => self.database_grants(resource).await,
        }
    }

    /// Lists one page of users, including deactivated ones.
    pub async fn list_users(&self, cursor: &PageCursor) -> Annotated<ListPage<Resource>> {
        let mut annotations = Annotations::new();
        let result = self.fetch_users(cursor, &mut annotations).await;
        Annotated::new(annotations, result)
    }

    /// Lists every group.
    pub async fn list_groups(&self) -> Annotated<ListPage<Resource>> {
        let mut annotations = Annotations::new();
        let result = self
            .client
            .list_groups()
            .await
            .record(&mut annotations)
            .map_err(|error| error.context("failed to list groups"))
            .map(|groups| ListPage::last(groups.iter().map(group_resource).collect()));
        Annotated::new(annotations, result)
    }

    /// Lists every database.
    pub async fn list_databases(&self) -> Annotated<ListPage<Resource>> {
        let mut annotations = Annotations::new();
        let result = self
            .client
            .list_databases()
            .await
            .record(&mut annotations)
            .map_err(|error| error.context("failed to list databases"))
            .map(|databases| ListPage::last(databases.iter().map(database_resource).collect()));
        Annotated::new(annotations, result)
    }

    /// Lists group grants of query permissions on a database.
    pub async fn database_grants(&self, database: &Resource) -> Annotated<ListPage<Grant>> {
        let database_id = database.id();
        let mut annotations = Annotations::new();
        let result = self
            .client
            .get_database_permissions(database_id.resource.as_str())
            .await
            .record(&mut annotations)
            .map_err(|error| {
                error.context(format!(
                    "failed to get permissions for database {}",
                    database_id.resource
                ))
            })
            .map(|graph| ListPage::last(self.mapper.database_grants(database_id, &graph)));
        Annotated::new(annotations, result)
    }

    async fn fetch_users(
        &self,
        cursor: &PageCursor,
        annotations: &mut Annotations,
    ) -> AppResult<ListPage<Resource>> {
        let options = page_options(cursor, self.page_size)?;
        let page = self
            .client
            .list_users(options)
            .await
            .record(annotations)
            .map_err(|error| error.context("failed to list users"))?;

        let next_cursor = next_page_cursor(
            page.offset.unwrap_or(options.offset),
            page.limit.unwrap_or(options.limit),
            page.total.unwrap_or(0),
        );
        debug!(
            offset = options.offset,
            count = page.data.len(),
            next = %next_cursor,
            "listed users page"
        );

        Ok(ListPage::new(
            page.data.iter().map(user_resource).collect(),
            next_cursor,
        ))
    }
}
