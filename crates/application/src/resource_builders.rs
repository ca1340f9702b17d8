use metasync_domain::{AccountStatus, Resource, ResourceId, ResourceType, UserTrait};

use crate::{MetabaseDatabase, MetabaseGroup, MetabaseUser};

/// Builds the normalized resource for a user record.
#[must_use]
pub fn user_resource(user: &MetabaseUser) -> Resource {
    let first_name = user.first_name.clone().unwrap_or_default();
    let last_name = user.last_name.clone().unwrap_or_default();

    Resource::new(
        ResourceId::new(ResourceType::User, user.id.to_string()),
        format!("{first_name} {last_name}"),
    )
    .with_profile_value("first_name", first_name)
    .with_profile_value("last_name", last_name)
    .with_user_trait(UserTrait {
        email: user.email.clone(),
        login: user.email.clone(),
        status: AccountStatus::from_active(user.is_active),
        last_login: user.last_login,
    })
}

/// Builds the normalized resource for a group record.
#[must_use]
pub fn group_resource(group: &MetabaseGroup) -> Resource {
    Resource::new(
        ResourceId::new(ResourceType::Group, group.id.to_string()),
        group.name.as_str(),
    )
    .with_profile_value("name", group.name.as_str())
    .with_profile_value("member_count", group.member_count)
}

/// Builds the normalized resource for a database record.
#[must_use]
pub fn database_resource(database: &MetabaseDatabase) -> Resource {
    let mut resource = Resource::new(
        ResourceId::new(ResourceType::Database, database.id.to_string()),
        database.name.as_str(),
    );

    if let Some(description) = database.description.as_deref().filter(|value| !value.is_empty()) {
        resource = resource.with_profile_value("description", description);
    }
    if let Some(engine) = database.engine.as_deref().filter(|value| !value.is_empty()) {
        resource = resource.with_profile_value("engine", engine);
    }

    resource
}

#[cfg(test)]
mod tests {
    use metasync_domain::AccountStatus;

    use super::{database_resource, group_resource, user_resource};
    use crate::{MetabaseDatabase, MetabaseGroup, MetabaseUser};

    #[test]
    fn user_resource_carries_identity_and_status() {
        let resource = user_resource(&MetabaseUser {
            id: 12,
            email: "ada@example.com".to_owned(),
            first_name: Some("Ada".to_owned()),
            last_name: Some("Lovelace".to_owned()),
            is_active: false,
            last_login: None,
        });

        assert_eq!(resource.id().resource, "12");
        assert_eq!(resource.display_name(), "Ada Lovelace");
        let Some(user_trait) = resource.user_trait() else {
            panic!("user trait missing");
        };
        assert_eq!(user_trait.login, "ada@example.com");
        assert_eq!(user_trait.status, AccountStatus::Disabled);
    }

    #[test]
    fn group_and_database_profiles() {
        let group = group_resource(&MetabaseGroup {
            id: 3,
            name: "Finance".to_owned(),
            member_count: 4,
        });
        assert_eq!(group.profile()["member_count"], 4);

        let database = database_resource(&MetabaseDatabase {
            id: 1,
            name: "SalesDB".to_owned(),
            description: Some(String::new()),
            engine: Some("postgres".to_owned()),
        });
        assert!(!database.profile().contains_key("description"));
        assert_eq!(database.profile()["engine"], "postgres");
    }
}
