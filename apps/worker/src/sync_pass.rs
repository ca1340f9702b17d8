use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use metasync_application::{SyncService, cancellable};
use metasync_core::{AppResult, PageCursor};
use metasync_domain::{Annotated, Entitlement, Grant, RateLimitInfo, Resource, ResourceType};

/// Everything collected in one full pass over the upstream.
#[derive(Debug, Default, Serialize)]
pub(crate) struct SyncReport {
    pub resources: Vec<Resource>,
    pub entitlements: Vec<Entitlement>,
    pub grants: Vec<Grant>,
    pub last_rate_limit: Option<RateLimitInfo>,
}

impl SyncReport {
    fn absorb<T>(&mut self, annotated: Annotated<T>) -> AppResult<T> {
        let (annotations, result) = annotated.into_parts();
        if let Some(info) = annotations.rate_limit() {
            debug!(remaining = ?info.remaining, limit = ?info.limit, "rate limit observed");
            self.last_rate_limit = Some(*info);
        }
        result
    }
}

/// Walks every resource type, following cursors until exhausted.
pub(crate) async fn run_sync_pass(
    sync: &SyncService,
    token: &CancellationToken,
) -> AppResult<SyncReport> {
    let mut report = SyncReport::default();

    for resource_type in ResourceType::all() {
        let mut cursor = PageCursor::start();
        let mut listed = 0_usize;

        loop {
            let page = report.absorb(
                cancellable(token, "list resources", sync.list(*resource_type, &cursor)).await,
            )?;

            for resource in &page.items {
                report
                    .entitlements
                    .extend(sync.entitlements(resource).items);
                let grants =
                    report.absorb(cancellable(token, "list grants", sync.grants(resource)).await)?;
                report.grants.extend(grants.items);
            }

            listed += page.items.len();
            report.resources.extend(page.items);
            if page.next_cursor.is_empty() {
                break;
            }
            cursor = page.next_cursor;
        }

        info!(resource_type = %resource_type, count = listed, "resource type synced");
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;

    use metasync_application::{
        CreateUserRequest, MembershipDirectory, MembershipMap, MetabaseClient, MetabaseDatabase,
        MetabaseGroup, MetabaseMembership, MetabaseUser, NewMembership, Observed, PageOptions,
        PermissionGraph, PermissionMapper, SyncService, UsersPage, VersionInfo,
    };
    use metasync_core::AppError;

    use super::run_sync_pass;

    struct StaticMetabase;

    fn user(id: i64) -> MetabaseUser {
        MetabaseUser {
            id,
            email: format!("user{id}@example.com"),
            first_name: Some("User".to_owned()),
            last_name: Some(id.to_string()),
            is_active: true,
            last_login: None,
        }
    }

    fn unsupported<T>() -> Observed<T> {
        Observed::new(None, Err(AppError::Internal("not used".to_owned())))
    }

    #[async_trait]
    impl MetabaseClient for StaticMetabase {
        async fn list_users(&self, options: PageOptions) -> Observed<UsersPage> {
            let data = (1..=3)
                .map(user)
                .skip(usize::try_from(options.offset).unwrap_or(usize::MAX))
                .take(usize::try_from(options.limit).unwrap_or(usize::MAX))
                .collect();
            Observed::new(
                None,
                Ok(UsersPage {
                    data,
                    total: Some(3),
                    limit: Some(options.limit),
                    offset: Some(options.offset),
                }),
            )
        }

        async fn get_user(&self, _user_id: &str) -> Observed<MetabaseUser> {
            unsupported()
        }

        async fn create_user(&self, _request: CreateUserRequest) -> Observed<MetabaseUser> {
            unsupported()
        }

        async fn update_user_active_status(
            &self,
            _user_id: &str,
            _active: bool,
        ) -> Observed<MetabaseUser> {
            unsupported()
        }

        async fn list_groups(&self) -> Observed<Vec<MetabaseGroup>> {
            Observed::new(
                None,
                Ok(vec![MetabaseGroup {
                    id: 3,
                    name: "Finance".to_owned(),
                    member_count: 1,
                }]),
            )
        }

        async fn list_databases(&self) -> Observed<Vec<MetabaseDatabase>> {
            Observed::new(None, Ok(Vec::new()))
        }

        async fn get_database_permissions(&self, _database_id: &str) -> Observed<PermissionGraph> {
            Observed::new(None, Ok(PermissionGraph::default()))
        }

        async fn get_version(&self) -> Observed<VersionInfo> {
            unsupported()
        }
    }

    #[async_trait]
    impl MembershipDirectory for StaticMetabase {
        async fn list_memberships(&self) -> Observed<MembershipMap> {
            let mut memberships = MembershipMap::new();
            memberships.insert(
                "2".to_owned(),
                vec![MetabaseMembership {
                    membership_id: 1,
                    group_id: 3,
                    user_id: 2,
                    is_group_manager: false,
                }],
            );
            Observed::new(None, Ok(memberships))
        }

        async fn add_membership(&self, _membership: NewMembership) -> Observed<()> {
            unsupported()
        }

        async fn remove_membership(&self, _membership_id: i64) -> Observed<()> {
            unsupported()
        }
    }

    fn sync_service() -> SyncService {
        let upstream = Arc::new(StaticMetabase);
        SyncService::new(upstream.clone(), upstream, PermissionMapper::new(false), 2)
    }

    #[tokio::test]
    async fn full_pass_collects_every_resource_type() {
        let report = run_sync_pass(&sync_service(), &CancellationToken::new()).await;

        let Ok(report) = report else {
            panic!("sync pass should complete");
        };
        assert_eq!(report.resources.len(), 4);
        assert_eq!(report.entitlements.len(), 1);
        assert_eq!(report.grants.len(), 1);
        assert_eq!(report.grants[0].id(), "group:3:member:user:2");
    }

    #[tokio::test]
    async fn cancelled_pass_stops_with_cancelled_error() {
        let token = CancellationToken::new();
        token.cancel();

        let report = run_sync_pass(&sync_service(), &token).await;

        assert!(matches!(report, Err(AppError::Cancelled(_))));
    }
}
