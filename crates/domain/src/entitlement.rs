use serde::{Deserialize, Serialize};

use crate::{Resource, ResourceId, ResourceType};

/// Shape of a grantable capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntitlementPurpose {
    /// Membership-style role on the resource.
    Assignment,
    /// Capability to perform actions against the resource.
    Permission,
}

/// Named, grantable capability attached to a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entitlement {
    id: String,
    resource: ResourceId,
    slug: String,
    display_name: String,
    description: String,
    purpose: EntitlementPurpose,
    grantable_to: Vec<ResourceType>,
}

impl Entitlement {
    /// Creates an entitlement on a resource.
    ///
    /// Display name and description default to the slug until set.
    #[must_use]
    pub fn new(resource: &Resource, slug: impl Into<String>, purpose: EntitlementPurpose) -> Self {
        let slug = slug.into();
        Self {
            id: Self::compose_id(resource.id(), slug.as_str()),
            resource: resource.id().clone(),
            display_name: slug.clone(),
            description: String::new(),
            slug,
            purpose,
            grantable_to: Vec::new(),
        }
    }

    /// Builds the stable `type:id:slug` identifier.
    #[must_use]
    pub fn compose_id(resource: &ResourceId, slug: &str) -> String {
        format!("{}:{}:{slug}", resource.resource_type, resource.resource)
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Restricts the principal types that may hold this entitlement.
    #[must_use]
    pub fn with_grantable_to(mut self, resource_type: ResourceType) -> Self {
        if !self.grantable_to.contains(&resource_type) {
            self.grantable_to.push(resource_type);
        }
        self
    }

    /// Returns the stable identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Returns the owning resource.
    #[must_use]
    pub fn resource(&self) -> &ResourceId {
        &self.resource
    }

    /// Returns the capability slug.
    #[must_use]
    pub fn slug(&self) -> &str {
        self.slug.as_str()
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Returns the entitlement shape.
    #[must_use]
    pub fn purpose(&self) -> EntitlementPurpose {
        self.purpose
    }

    /// Returns principal types allowed to hold this entitlement.
    #[must_use]
    pub fn grantable_to(&self) -> &[ResourceType] {
        self.grantable_to.as_slice()
    }
}
