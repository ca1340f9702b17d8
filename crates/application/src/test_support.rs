use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use metasync_core::AppError;
use metasync_domain::{RateLimitInfo, RateLimitStatus};

use crate::{
    CreateUserRequest, MembershipDirectory, MembershipMap, MetabaseClient, MetabaseDatabase,
    MetabaseGroup, MetabaseMembership, MetabaseUser, NewMembership, Observed, PageOptions,
    PermissionGraph, UsersPage, VersionInfo,
};

const MUTATIONS: &[&str] = &[
    "create_user",
    "update_user_active_status",
    "add_membership",
    "remove_membership",
];

/// In-memory upstream used by service tests.
pub(crate) struct FakeMetabase {
    pub users: Mutex<BTreeMap<i64, MetabaseUser>>,
    pub reported_total: Mutex<Option<u64>>,
    pub groups: Mutex<Vec<MetabaseGroup>>,
    pub databases: Mutex<Vec<MetabaseDatabase>>,
    pub graph: Mutex<PermissionGraph>,
    pub memberships: Mutex<Vec<MetabaseMembership>>,
    pub version: Mutex<String>,
    pub rate_limit: Mutex<Option<RateLimitInfo>>,
    pub failing: Mutex<HashSet<&'static str>>,
    pub ignore_status_updates: Mutex<bool>,
    pub calls: Mutex<Vec<String>>,
}

impl Default for FakeMetabase {
    fn default() -> Self {
        Self {
            users: Mutex::new(BTreeMap::new()),
            reported_total: Mutex::new(None),
            groups: Mutex::new(Vec::new()),
            databases: Mutex::new(Vec::new()),
            graph: Mutex::new(PermissionGraph::default()),
            memberships: Mutex::new(Vec::new()),
            version: Mutex::new("v0.56.3".to_owned()),
            rate_limit: Mutex::new(None),
            failing: Mutex::new(HashSet::new()),
            ignore_status_updates: Mutex::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }
}

pub(crate) fn rate_limit(remaining: u64) -> RateLimitInfo {
    RateLimitInfo {
        limit: Some(100),
        remaining: Some(remaining),
        reset_at: None,
        status: RateLimitStatus::Ok,
    }
}

pub(crate) fn user(id: i64, is_active: bool) -> MetabaseUser {
    MetabaseUser {
        id,
        email: format!("user{id}@example.com"),
        first_name: Some(format!("First{id}")),
        last_name: Some(format!("Last{id}")),
        is_active,
        last_login: None,
    }
}

pub(crate) fn membership(
    membership_id: i64,
    user_id: i64,
    group_id: i64,
    is_group_manager: bool,
) -> MetabaseMembership {
    MetabaseMembership {
        membership_id,
        group_id,
        user_id,
        is_group_manager,
    }
}

impl FakeMetabase {
    pub async fn with_users(self, users: Vec<MetabaseUser>) -> Self {
        {
            let mut stored = self.users.lock().await;
            for user in users {
                stored.insert(user.id, user);
            }
        }
        self
    }

    pub async fn with_memberships(self, memberships: Vec<MetabaseMembership>) -> Self {
        self.memberships.lock().await.extend(memberships);
        self
    }

    pub async fn with_rate_limit(self, info: RateLimitInfo) -> Self {
        *self.rate_limit.lock().await = Some(info);
        self
    }

    pub async fn fail(&self, operation: &'static str) {
        self.failing.lock().await.insert(operation);
    }

    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    pub async fn mutation_count(&self) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|call| {
                MUTATIONS
                    .iter()
                    .any(|mutation| call.split(':').next() == Some(*mutation))
            })
            .count()
    }

    async fn begin<T>(&self, operation: &'static str, call: String) -> Result<(), Observed<T>> {
        self.calls.lock().await.push(call);
        let rate_limit = *self.rate_limit.lock().await;
        if self.failing.lock().await.contains(operation) {
            return Err(Observed::new(
                rate_limit,
                Err(AppError::Upstream {
                    status: 429,
                    message: format!("{operation} throttled"),
                }),
            ));
        }
        Ok(())
    }

    async fn finish<T>(&self, value: Result<T, AppError>) -> Observed<T> {
        Observed::new(*self.rate_limit.lock().await, value)
    }
}

fn not_found(what: String) -> AppError {
    AppError::Upstream {
        status: 404,
        message: format!("{what} not found"),
    }
}

#[async_trait]
impl MetabaseClient for FakeMetabase {
    async fn list_users(&self, options: PageOptions) -> Observed<UsersPage> {
        if let Err(observed) = self
            .begin(
                "list_users",
                format!("list_users:{}:{}", options.offset, options.limit),
            )
            .await
        {
            return observed;
        }

        let users = self.users.lock().await;
        let total = self
            .reported_total
            .lock()
            .await
            .unwrap_or(users.len() as u64);
        let data = users
            .values()
            .skip(usize::try_from(options.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(options.limit).unwrap_or(usize::MAX))
            .cloned()
            .collect();

        self.finish(Ok(UsersPage {
            data,
            total: Some(total),
            limit: Some(options.limit),
            offset: Some(options.offset),
        }))
        .await
    }

    async fn get_user(&self, user_id: &str) -> Observed<MetabaseUser> {
        if let Err(observed) = self.begin("get_user", format!("get_user:{user_id}")).await {
            return observed;
        }

        let users = self.users.lock().await;
        let found = user_id
            .parse::<i64>()
            .ok()
            .and_then(|id| users.get(&id).cloned());
        drop(users);
        self.finish(found.ok_or_else(|| not_found(format!("user {user_id}"))))
            .await
    }

    async fn create_user(&self, request: CreateUserRequest) -> Observed<MetabaseUser> {
        if let Err(observed) = self
            .begin("create_user", format!("create_user:{}", request.email))
            .await
        {
            return observed;
        }

        let mut users = self.users.lock().await;
        let id = users.keys().next_back().copied().unwrap_or(0) + 1;
        let created = MetabaseUser {
            id,
            email: request.email,
            first_name: Some(request.first_name),
            last_name: Some(request.last_name),
            is_active: true,
            last_login: None,
        };
        users.insert(id, created.clone());
        drop(users);

        self.finish(Ok(created)).await
    }

    async fn update_user_active_status(
        &self,
        user_id: &str,
        active: bool,
    ) -> Observed<MetabaseUser> {
        if let Err(observed) = self
            .begin(
                "update_user_active_status",
                format!("update_user_active_status:{user_id}:{active}"),
            )
            .await
        {
            return observed;
        }

        let ignore_update = *self.ignore_status_updates.lock().await;
        let mut users = self.users.lock().await;
        let updated = user_id
            .parse::<i64>()
            .ok()
            .and_then(|id| users.get_mut(&id))
            .map(|user| {
                if !ignore_update {
                    user.is_active = active;
                }
                user.clone()
            });
        drop(users);

        self.finish(updated.ok_or_else(|| not_found(format!("user {user_id}"))))
            .await
    }

    async fn list_groups(&self) -> Observed<Vec<MetabaseGroup>> {
        if let Err(observed) = self.begin("list_groups", "list_groups".to_owned()).await {
            return observed;
        }
        let groups = self.groups.lock().await.clone();
        self.finish(Ok(groups)).await
    }

    async fn list_databases(&self) -> Observed<Vec<MetabaseDatabase>> {
        if let Err(observed) = self
            .begin("list_databases", "list_databases".to_owned())
            .await
        {
            return observed;
        }
        let databases = self.databases.lock().await.clone();
        self.finish(Ok(databases)).await
    }

    async fn get_database_permissions(&self, database_id: &str) -> Observed<PermissionGraph> {
        if let Err(observed) = self
            .begin(
                "get_database_permissions",
                format!("get_database_permissions:{database_id}"),
            )
            .await
        {
            return observed;
        }
        let graph = self.graph.lock().await.clone();
        self.finish(Ok(graph)).await
    }

    async fn get_version(&self) -> Observed<VersionInfo> {
        if let Err(observed) = self.begin("get_version", "get_version".to_owned()).await {
            return observed;
        }
        let tag = self.version.lock().await.clone();
        self.finish(Ok(VersionInfo { tag })).await
    }
}

#[async_trait]
impl MembershipDirectory for FakeMetabase {
    async fn list_memberships(&self) -> Observed<MembershipMap> {
        if let Err(observed) = self
            .begin("list_memberships", "list_memberships".to_owned())
            .await
        {
            return observed;
        }

        let mut map = MembershipMap::new();
        for membership in self.memberships.lock().await.iter() {
            map.entry(membership.user_id.to_string())
                .or_default()
                .push(*membership);
        }
        self.finish(Ok(map)).await
    }

    async fn add_membership(&self, membership: NewMembership) -> Observed<()> {
        if let Err(observed) = self
            .begin(
                "add_membership",
                format!(
                    "add_membership:{}:{}:{}",
                    membership.group_id, membership.user_id, membership.is_group_manager
                ),
            )
            .await
        {
            return observed;
        }

        let mut memberships = self.memberships.lock().await;
        let membership_id = memberships
            .iter()
            .map(|existing| existing.membership_id)
            .max()
            .unwrap_or(0)
            + 1;
        memberships.push(MetabaseMembership {
            membership_id,
            group_id: membership.group_id,
            user_id: membership.user_id,
            is_group_manager: membership.is_group_manager,
        });
        drop(memberships);

        self.finish(Ok(())).await
    }

    async fn remove_membership(&self, membership_id: i64) -> Observed<()> {
        if let Err(observed) = self
            .begin(
                "remove_membership",
                format!("remove_membership:{membership_id}"),
            )
            .await
        {
            return observed;
        }

        let mut memberships = self.memberships.lock().await;
        let before = memberships.len();
        memberships.retain(|existing| existing.membership_id != membership_id);
        let removed = memberships.len() != before;
        drop(memberships);

        let result = if removed {
            Ok(())
        } else {
            Err(not_found(format!("membership {membership_id}")))
        };
        self.finish(result).await
    }
}
