//! Domain entities and invariants for the normalized access graph.

#![forbid(unsafe_code)]

mod annotation;
mod entitlement;
mod grant;
mod outcome;
mod resource;

pub use annotation::{Annotated, Annotation, Annotations, RateLimitInfo, RateLimitStatus};
pub use entitlement::{Entitlement, EntitlementPurpose};
pub use grant::Grant;
pub use outcome::MutationOutcome;
pub use resource::{AccountStatus, Resource, ResourceId, ResourceType, UserTrait};
