use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use metasync_core::AppError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kinds of resources exposed to governance review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    /// An identity that can hold memberships.
    User,
    /// A group that users join as member or manager.
    Group,
    /// A data-source container whose permissions are granted to groups.
    Database,
}

impl ResourceType {
    /// Returns the stable resource type identifier.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Group => "group",
            Self::Database => "database",
        }
    }

    /// Returns the human readable type name.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Group => "Group",
            Self::Database => "Database",
        }
    }

    /// Returns all known resource types.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[ResourceType] = &[ResourceType::User, ResourceType::Group, ResourceType::Database];

        ALL
    }
}

impl Display for ResourceType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Self::User),
            "group" => Ok(Self::Group),
            "database" => Ok(Self::Database),
            _ => Err(AppError::invalid_argument(format!(
                "unknown resource type '{value}'"
            ))),
        }
    }
}

/// Typed reference to a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId {
    /// Resource kind.
    pub resource_type: ResourceType,
    /// Upstream identifier rendered as a string.
    pub resource: String,
}

impl ResourceId {
    /// Creates a resource reference.
    #[must_use]
    pub fn new(resource_type: ResourceType, resource: impl Into<String>) -> Self {
        Self {
            resource_type,
            resource: resource.into(),
        }
    }

    /// Parses the upstream integer identifier carried by this reference.
    pub fn upstream_id(&self) -> Result<i64, AppError> {
        self.resource.parse::<i64>().map_err(|error| {
            AppError::invalid_argument(format!(
                "invalid {} id '{}': {error}",
                self.resource_type, self.resource
            ))
        })
    }
}

impl Display for ResourceId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}:{}", self.resource_type, self.resource)
    }
}

/// Account state reported for user resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// Account can sign in.
    Enabled,
    /// Account is deactivated upstream.
    Disabled,
}

impl AccountStatus {
    /// Maps an upstream active flag to a status.
    #[must_use]
    pub fn from_active(is_active: bool) -> Self {
        if is_active {
            Self::Enabled
        } else {
            Self::Disabled
        }
    }
}

/// Identity attributes attached to user resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTrait {
    /// Primary email address.
    pub email: String,
    /// Login name.
    pub login: String,
    /// Upstream account status.
    pub status: AccountStatus,
    /// Last successful sign-in, when known.
    pub last_login: Option<DateTime<Utc>>,
}

/// Normalized resource built fresh on every list call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    id: ResourceId,
    display_name: String,
    profile: Map<String, Value>,
    user_trait: Option<UserTrait>,
}

impl Resource {
    /// Creates a resource without profile data.
    #[must_use]
    pub fn new(id: ResourceId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            profile: Map::new(),
            user_trait: None,
        }
    }

    /// Adds a profile attribute.
    #[must_use]
    pub fn with_profile_value(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.profile.insert(key.to_owned(), value.into());
        self
    }

    /// Attaches identity attributes.
    #[must_use]
    pub fn with_user_trait(mut self, user_trait: UserTrait) -> Self {
        self.user_trait = Some(user_trait);
        self
    }

    /// Returns the resource reference.
    #[must_use]
    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns profile attributes.
    #[must_use]
    pub fn profile(&self) -> &Map<String, Value> {
        &self.profile
    }

    /// Returns identity attributes for user resources.
    #[must_use]
    pub fn user_trait(&self) -> Option<&UserTrait> {
        self.user_trait.as_ref()
    }
}
