mod password;

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use serde_json::{Map, Value, json};
use tracing::{info, warn};

use metasync_core::{AppError, AppResult};
use metasync_domain::{Annotated, Annotations, MutationOutcome, Resource};

use crate::resource_builders::user_resource;
use crate::{CreateUserRequest, MetabaseClient};

use password::generate_password;

const USER_ID_ARGUMENT: &str = "userId";
const REQUIRED_PROFILE_FIELDS: [&str; 3] = ["email", "first_name", "last_name"];

/// Result of an enable or disable request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetActiveResult {
    /// Whether a mutation was sent.
    pub outcome: MutationOutcome,
    /// Whether the request is reported as successful.
    pub success: bool,
    /// False when upstream returned a record whose status does not match the
    /// requested one.
    pub state_confirmed: bool,
}

/// Password handed back once to the caller that created an account.
///
/// Never serialized and redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct OneTimeCredential(String);

impl OneTimeCredential {
    fn new(secret: String) -> Self {
        Self(secret)
    }

    /// Returns the plaintext credential.
    #[must_use]
    pub fn expose_secret(&self) -> &str {
        self.0.as_str()
    }
}

impl Debug for OneTimeCredential {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("OneTimeCredential(<redacted>)")
    }
}

/// Newly created account and its initial credential.
#[derive(Debug, Clone)]
pub struct AccountCreation {
    /// Normalized user resource.
    pub resource: Resource,
    /// Generated password.
    pub credential: OneTimeCredential,
}

/// Credential strategies available when creating accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialOption {
    /// A random password generated locally.
    RandomPassword,
}

/// Account provisioning capability report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountCapability {
    /// Supported credential strategies.
    pub supported: Vec<CredentialOption>,
    /// Strategy used when the caller expresses no preference.
    pub preferred: CredentialOption,
}

/// Enables, disables, and provisions user accounts.
#[derive(Clone)]
pub struct AccountService {
    client: Arc<dyn MetabaseClient>,
}

impl AccountService {
    /// Creates a new service from the upstream client.
    #[must_use]
    pub fn new(client: Arc<dyn MetabaseClient>) -> Self {
        Self { client }
    }

    /// Moves a user to the requested active state.
    pub async fn set_active(&self, user_id: &str, active: bool) -> Annotated<SetActiveResult> {
        let mut annotations = Annotations::new();
        let result = self.apply_active(user_id, active, &mut annotations).await;
        Annotated::new(annotations, result)
    }

    /// Reactivates the user named by the `userId` argument.
    pub async fn enable_user(&self, arguments: Option<&Map<String, Value>>) -> Annotated<Value> {
        self.run_status_action(arguments, true).await
    }

    /// Deactivates the user named by the `userId` argument.
    pub async fn disable_user(&self, arguments: Option<&Map<String, Value>>) -> Annotated<Value> {
        self.run_status_action(arguments, false).await
    }

    /// Creates an account from `email`, `first_name`, and `last_name`.
    pub async fn create_account(&self, profile: &Map<String, Value>) -> Annotated<AccountCreation> {
        let mut annotations = Annotations::new();
        let result = self.provision(profile, &mut annotations).await;
        Annotated::new(annotations, result)
    }

    /// Reports the credential strategies supported by account creation.
    #[must_use]
    pub fn create_account_capability(&self) -> AccountCapability {
        AccountCapability {
            supported: vec![CredentialOption::RandomPassword],
            preferred: CredentialOption::RandomPassword,
        }
    }

    async fn run_status_action(
        &self,
        arguments: Option<&Map<String, Value>>,
        active: bool,
    ) -> Annotated<Value> {
        match user_id_argument(arguments) {
            Ok(user_id) => self
                .set_active(user_id, active)
                .await
                .map(|result| json!({ "success": result.success })),
            Err(error) => Annotated::err(Annotations::new(), error),
        }
    }

    async fn apply_active(
        &self,
        user_id: &str,
        active: bool,
        annotations: &mut Annotations,
    ) -> AppResult<SetActiveResult> {
        let action = if active { "enable" } else { "disable" };

        let current = self
            .client
            .get_user(user_id)
            .await
            .record(annotations)
            .map_err(|error| error.context(format!("failed to get user {user_id}")))?;

        if current.is_active == active {
            info!(user_id, active, "user already in requested state");
            return Ok(SetActiveResult {
                outcome: MutationOutcome::AlreadySatisfied,
                success: true,
                state_confirmed: true,
            });
        }

        let updated = self
            .client
            .update_user_active_status(user_id, active)
            .await
            .record(annotations)
            .map_err(|error| error.context(format!("failed to {action} user {user_id}")))?;

        let state_confirmed = updated.is_active == active;
        if state_confirmed {
            info!(user_id, active, "user status updated");
        } else {
            warn!(
                user_id,
                requested = active,
                reported = updated.is_active,
                "user status not reflected in update response"
            );
        }

        Ok(SetActiveResult {
            outcome: MutationOutcome::Applied,
            success: true,
            state_confirmed,
        })
    }

    async fn provision(
        &self,
        profile: &Map<String, Value>,
        annotations: &mut Annotations,
    ) -> AppResult<AccountCreation> {
        let [email, first_name, last_name] = required_profile_fields(profile)?;
        let password = generate_password()?;

        let created = self
            .client
            .create_user(CreateUserRequest {
                email: email.to_owned(),
                first_name: first_name.to_owned(),
                last_name: last_name.to_owned(),
                password: password.clone(),
            })
            .await
            .record(annotations)
            .map_err(|error| error.context(format!("failed to create account for {email}")))?;

        info!(user_id = created.id, "account created");
        Ok(AccountCreation {
            resource: user_resource(&created),
            credential: OneTimeCredential::new(password),
        })
    }
}

fn user_id_argument(arguments: Option<&Map<String, Value>>) -> AppResult<&str> {
    let arguments =
        arguments.ok_or_else(|| AppError::invalid_argument("arguments cannot be nil"))?;
    let value = arguments.get(USER_ID_ARGUMENT).ok_or_else(|| {
        AppError::invalid_argument(format!("missing required argument {USER_ID_ARGUMENT}"))
    })?;

    match value {
        Value::Null => Err(AppError::invalid_argument(format!(
            "{USER_ID_ARGUMENT} value cannot be nil"
        ))),
        Value::String(user_id) if !user_id.is_empty() => Ok(user_id.as_str()),
        _ => Err(AppError::invalid_argument(format!(
            "{USER_ID_ARGUMENT} cannot be empty"
        ))),
    }
}

fn required_profile_fields(profile: &Map<String, Value>) -> AppResult<[&str; 3]> {
    let mut values = [""; 3];
    for (slot, name) in values.iter_mut().zip(REQUIRED_PROFILE_FIELDS) {
        *slot = profile
            .get(name)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| AppError::missing_field(name))?;
    }
    Ok(values)
}
