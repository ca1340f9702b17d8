//! Application services and ports.

#![forbid(unsafe_code)]

mod account_service;
mod action_manager;
mod cancellation;
mod grant_service;
mod metabase_ports;
pub mod pagination;
pub mod permission_mapper;
pub mod resource_builders;
mod sync_service;
mod version_check_service;

#[cfg(test)]
mod test_support;

pub use account_service::{
    AccountCapability, AccountCreation, AccountService, CredentialOption, OneTimeCredential,
    SetActiveResult,
};
pub use action_manager::{
    ActionField, ActionFieldKind, ActionManager, ActionSchema, ActionType, DISABLE_USER_ACTION,
    ENABLE_USER_ACTION,
};
pub use cancellation::cancellable;
pub use grant_service::GrantService;
pub use metabase_ports::{
    CreateUserRequest, GroupPermission, MembershipDirectory, MembershipMap, MetabaseClient,
    MetabaseDatabase, MetabaseGroup, MetabaseMembership, MetabaseUser, NewMembership, Observed,
    PageOptions, PermissionGraph, UsersPage, VersionInfo,
};
pub use pagination::{DEFAULT_PAGE_SIZE, ListPage};
pub use permission_mapper::PermissionMapper;
pub use sync_service::SyncService;
pub use version_check_service::{
    ConnectorMetadata, VersionCheckService, check_version_tag, connector_metadata,
};
