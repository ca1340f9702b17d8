mod records;

use async_trait::async_trait;

use metasync_core::AppResult;
use metasync_domain::{Annotations, RateLimitInfo};

pub use records::{
    CreateUserRequest, GroupPermission, MembershipMap, MetabaseDatabase, MetabaseGroup,
    MetabaseMembership, MetabaseUser, NewMembership, PageOptions, PermissionGraph, UsersPage,
    VersionInfo,
};

/// Result of a single upstream call with the rate-limit data observed on it.
///
/// Rate-limit data is kept even when the call failed, since the failing call
/// may be the throttled one.
#[derive(Debug)]
pub struct Observed<T> {
    /// Rate-limit headers seen on the response, if any.
    pub rate_limit: Option<RateLimitInfo>,
    /// Call outcome.
    pub result: AppResult<T>,
}

impl<T> Observed<T> {
    /// Pairs a result with optional rate-limit data.
    #[must_use]
    pub fn new(rate_limit: Option<RateLimitInfo>, result: AppResult<T>) -> Self {
        Self { rate_limit, result }
    }

    /// Records the rate-limit data into `annotations` and yields the result.
    pub fn record(self, annotations: &mut Annotations) -> AppResult<T> {
        annotations.with_rate_limit(self.rate_limit);
        self.result
    }
}

/// Port for the user, group, database, and version endpoints.
#[async_trait]
pub trait MetabaseClient: Send + Sync {
    /// Lists one page of users, including deactivated ones.
    async fn list_users(&self, options: PageOptions) -> Observed<UsersPage>;

    /// Fetches a single user.
    async fn get_user(&self, user_id: &str) -> Observed<MetabaseUser>;

    /// Creates a user account.
    async fn create_user(&self, request: CreateUserRequest) -> Observed<MetabaseUser>;

    /// Reactivates (`active = true`) or deactivates a user.
    async fn update_user_active_status(&self, user_id: &str, active: bool)
    -> Observed<MetabaseUser>;

    /// Lists all groups.
    async fn list_groups(&self) -> Observed<Vec<MetabaseGroup>>;

    /// Lists all databases.
    async fn list_databases(&self) -> Observed<Vec<MetabaseDatabase>>;

    /// Returns the group permission graph for one database.
    async fn get_database_permissions(&self, database_id: &str) -> Observed<PermissionGraph>;

    /// Returns the running upstream version.
    async fn get_version(&self) -> Observed<VersionInfo>;
}

/// Narrow port for membership records.
///
/// Upstream offers no per-pair lookup, so callers always receive the full map
/// and filter locally.
#[async_trait]
pub trait MembershipDirectory: Send + Sync {
    /// Lists every membership keyed by user id string.
    async fn list_memberships(&self) -> Observed<MembershipMap>;

    /// Adds a user to a group.
    async fn add_membership(&self, membership: NewMembership) -> Observed<()>;

    /// Removes a membership by its own identifier.
    async fn remove_membership(&self, membership_id: i64) -> Observed<()>;
}
