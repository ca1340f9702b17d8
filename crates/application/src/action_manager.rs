use serde::Serialize;
use serde_json::{Map, Value};

use metasync_core::AppError;
use metasync_domain::{Annotated, Annotations};

use crate::AccountService;

/// Action name for reactivating a user.
pub const ENABLE_USER_ACTION: &str = "enable_user";
/// Action name for deactivating a user.
pub const DISABLE_USER_ACTION: &str = "disable_user";

/// Value kind of an action argument or return field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionFieldKind {
    /// JSON string.
    String,
    /// JSON boolean.
    Bool,
}

/// Argument or return field of an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionField {
    /// Field key.
    pub name: &'static str,
    /// Human readable label.
    pub display_name: &'static str,
    /// Value kind.
    pub kind: ActionFieldKind,
    /// Whether callers must supply the field.
    pub is_required: bool,
}

/// Category tags attached to an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Acts on an account.
    Account,
    /// Enables an account.
    AccountEnable,
    /// Disables an account.
    AccountDisable,
}

/// Declared shape of a registered action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionSchema {
    /// Stable action name.
    pub name: &'static str,
    /// Human readable label.
    pub display_name: &'static str,
    /// Accepted arguments.
    pub arguments: Vec<ActionField>,
    /// Returned fields.
    pub return_types: Vec<ActionField>,
    /// Category tags.
    pub action_types: Vec<ActionType>,
}

fn account_status_schema(
    name: &'static str,
    display_name: &'static str,
    action_type: ActionType,
) -> ActionSchema {
    ActionSchema {
        name,
        display_name,
        arguments: vec![ActionField {
            name: "userId",
            display_name: "User ID",
            kind: ActionFieldKind::String,
            is_required: true,
        }],
        return_types: vec![ActionField {
            name: "success",
            display_name: "Success",
            kind: ActionFieldKind::Bool,
            is_required: false,
        }],
        action_types: vec![ActionType::Account, action_type],
    }
}

/// Dispatches named account actions.
#[derive(Clone)]
pub struct ActionManager {
    accounts: AccountService,
}

impl ActionManager {
    /// Creates a manager that routes to the account service.
    #[must_use]
    pub fn new(accounts: AccountService) -> Self {
        Self { accounts }
    }

    /// Returns the registered action schemas.
    #[must_use]
    pub fn schemas(&self) -> Vec<ActionSchema> {
        vec![
            account_status_schema(ENABLE_USER_ACTION, "Enable User", ActionType::AccountEnable),
            account_status_schema(
                DISABLE_USER_ACTION,
                "Disable User",
                ActionType::AccountDisable,
            ),
        ]
    }

    /// Runs the named action with the given arguments.
    pub async fn invoke(
        &self,
        name: &str,
        arguments: Option<&Map<String, Value>>,
    ) -> Annotated<Value> {
        match name {
            ENABLE_USER_ACTION => self.accounts.enable_user(arguments).await,
            DISABLE_USER_ACTION => self.accounts.disable_user(arguments).await,
            _ => Annotated::err(
                Annotations::new(),
                AppError::invalid_argument(format!("unknown action '{name}'")),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use metasync_core::AppError;

    use super::{ActionManager, ActionType, DISABLE_USER_ACTION, ENABLE_USER_ACTION};
    use crate::AccountService;
    use crate::test_support::{FakeMetabase, user};

    async fn manager() -> (ActionManager, Arc<FakeMetabase>) {
        let fake = Arc::new(FakeMetabase::default().with_users(vec![user(5, true)]).await);
        (
            ActionManager::new(AccountService::new(fake.clone())),
            fake,
        )
    }

    #[tokio::test]
    async fn schemas_describe_enable_and_disable() {
        let (manager, _) = manager().await;

        let schemas = manager.schemas();

        let names: Vec<&str> = schemas.iter().map(|schema| schema.name).collect();
        assert_eq!(names, vec![ENABLE_USER_ACTION, DISABLE_USER_ACTION]);
        assert_eq!(
            schemas[1].action_types,
            vec![ActionType::Account, ActionType::AccountDisable]
        );
        assert!(schemas.iter().all(|schema| schema.arguments[0].is_required));
    }

    #[tokio::test]
    async fn invoke_routes_to_account_service() {
        let (manager, fake) = manager().await;
        let Some(arguments) = json!({ "userId": "5" }).as_object().cloned() else {
            panic!("arguments must be an object");
        };

        let response = manager.invoke(DISABLE_USER_ACTION, Some(&arguments)).await;

        assert!(matches!(response.result, Ok(ref value) if *value == json!({ "success": true })));
        assert!(
            fake.calls()
                .await
                .contains(&"update_user_active_status:5:false".to_owned())
        );
    }

    #[tokio::test]
    async fn unknown_action_is_rejected() {
        let (manager, fake) = manager().await;

        let response = manager.invoke("delete_user", None).await;

        assert!(matches!(
            response.result,
            Err(AppError::InvalidArgument { .. })
        ));
        assert!(fake.calls().await.is_empty());
    }
}
