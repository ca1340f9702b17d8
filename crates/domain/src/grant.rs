use serde::{Deserialize, Serialize};

use crate::{Entitlement, ResourceId};

/// Derived fact binding a principal to an entitlement on a target resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    id: String,
    entitlement_id: String,
    entitlement_resource: ResourceId,
    principal: ResourceId,
    expansion_entitlement_ids: Vec<String>,
}

impl Grant {
    /// Creates a grant of `slug` on `resource` to `principal`.
    #[must_use]
    pub fn new(resource: &ResourceId, slug: &str, principal: ResourceId) -> Self {
        let entitlement_id = Entitlement::compose_id(resource, slug);
        Self {
            id: format!("{entitlement_id}:{principal}"),
            entitlement_id,
            entitlement_resource: resource.clone(),
            principal,
            expansion_entitlement_ids: Vec::new(),
        }
    }

    /// Creates a grant of an existing entitlement to `principal`.
    #[must_use]
    pub fn for_entitlement(entitlement: &Entitlement, principal: ResourceId) -> Self {
        Self::new(entitlement.resource(), entitlement.slug(), principal)
    }

    /// Marks entitlements the principal's members are implied to need.
    #[must_use]
    pub fn with_expansion(mut self, entitlement_ids: Vec<String>) -> Self {
        self.expansion_entitlement_ids = entitlement_ids;
        self
    }

    /// Returns the stable grant identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Returns the granted entitlement identifier.
    #[must_use]
    pub fn entitlement_id(&self) -> &str {
        self.entitlement_id.as_str()
    }

    /// Returns the resource that owns the granted entitlement.
    #[must_use]
    pub fn entitlement_resource(&self) -> &ResourceId {
        &self.entitlement_resource
    }

    /// Returns the principal holding the entitlement.
    #[must_use]
    pub fn principal(&self) -> &ResourceId {
        &self.principal
    }

    /// Returns implied entitlement identifiers, empty when not expandable.
    #[must_use]
    pub fn expansion_entitlement_ids(&self) -> &[String] {
        self.expansion_entitlement_ids.as_slice()
    }
}
