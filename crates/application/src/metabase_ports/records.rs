use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Offset/limit pair sent to paged endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageOptions {
    /// Page size.
    pub limit: u64,
    /// Number of records skipped.
    pub offset: u64,
}

/// User record returned by the user endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetabaseUser {
    /// Upstream identifier.
    ///
    /// Zero when the response carries no user record, as with deactivation.
    #[serde(default)]
    pub id: i64,
    /// Email address, also used as login.
    #[serde(default)]
    pub email: String,
    /// Given name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Family name.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Whether the account can sign in.
    #[serde(default)]
    pub is_active: bool,
    /// Last successful sign-in.
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

/// One page of the user listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsersPage {
    /// Users on this page.
    #[serde(default)]
    pub data: Vec<MetabaseUser>,
    /// Total number of users reported for the whole listing.
    #[serde(default)]
    pub total: Option<u64>,
    /// Page size echoed by upstream.
    #[serde(default)]
    pub limit: Option<u64>,
    /// Offset echoed by upstream.
    #[serde(default)]
    pub offset: Option<u64>,
}

/// Account creation payload.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct CreateUserRequest {
    /// Email address.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Initial password.
    pub password: String,
}

impl std::fmt::Debug for CreateUserRequest {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("CreateUserRequest")
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Upstream join record linking a user to a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetabaseMembership {
    /// Identifier addressing this membership for deletion.
    pub membership_id: i64,
    /// Group identifier.
    pub group_id: i64,
    /// User identifier.
    pub user_id: i64,
    /// Whether the user manages the group.
    #[serde(default)]
    pub is_group_manager: bool,
}

/// Membership records keyed by user id string.
pub type MembershipMap = HashMap<String, Vec<MetabaseMembership>>;

/// Membership creation payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NewMembership {
    /// Group identifier.
    pub group_id: i64,
    /// User identifier.
    pub user_id: i64,
    /// Whether the user should manage the group.
    pub is_group_manager: bool,
}

/// Group record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetabaseGroup {
    /// Upstream identifier.
    pub id: i64,
    /// Group name.
    pub name: String,
    /// Number of members reported upstream.
    #[serde(default)]
    pub member_count: i64,
}

/// Database record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetabaseDatabase {
    /// Upstream identifier.
    pub id: i64,
    /// Database name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Driver name such as `postgres`.
    #[serde(default)]
    pub engine: Option<String>,
}

/// Permission descriptor for one group on one database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPermission {
    /// Raw query capability code, e.g. `query-builder`.
    ///
    /// Schema-level (object) values are granular grants this connector does
    /// not map, so they decode as `None`.
    #[serde(
        rename = "create-queries",
        default,
        deserialize_with = "string_or_none"
    )]
    pub create_queries: Option<String>,
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(code) => Some(code),
        _ => None,
    })
}

impl GroupPermission {
    /// Creates a descriptor with the given raw query capability code.
    #[must_use]
    pub fn with_create_queries(code: impl Into<String>) -> Self {
        Self {
            create_queries: Some(code.into()),
        }
    }
}

/// Permission graph mapping group id to database id to descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGraph {
    /// Descriptors keyed by group id, then database id.
    #[serde(default)]
    pub groups: BTreeMap<String, BTreeMap<String, GroupPermission>>,
}

/// Version payload returned by the settings endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    /// Release tag such as `v0.56.3`.
    pub tag: String,
}
