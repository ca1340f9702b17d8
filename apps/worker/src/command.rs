use metasync_core::{AppError, AppResult};

const USAGE: &str = "usage: metasync-worker [sync | validate | actions | enable-user <id> | disable-user <id> | create-account <email> <first_name> <last_name>]";

/// Operation selected on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Sync,
    Validate,
    Actions,
    EnableUser { user_id: String },
    DisableUser { user_id: String },
    CreateAccount {
        email: String,
        first_name: String,
        last_name: String,
    },
}

impl Command {
    /// Parses arguments after the program name; no arguments means `sync`.
    pub(crate) fn parse(arguments: impl IntoIterator<Item = String>) -> AppResult<Self> {
        let arguments: Vec<String> = arguments.into_iter().collect();
        let Some((name, rest)) = arguments.split_first() else {
            return Ok(Self::Sync);
        };

        match (name.as_str(), rest) {
            ("sync", []) => Ok(Self::Sync),
            ("validate", []) => Ok(Self::Validate),
            ("actions", []) => Ok(Self::Actions),
            ("enable-user", [user_id]) => Ok(Self::EnableUser {
                user_id: user_id.clone(),
            }),
            ("disable-user", [user_id]) => Ok(Self::DisableUser {
                user_id: user_id.clone(),
            }),
            ("create-account", [email, first_name, last_name]) => Ok(Self::CreateAccount {
                email: email.clone(),
                first_name: first_name.clone(),
                last_name: last_name.clone(),
            }),
            _ => Err(AppError::Validation(USAGE.to_owned())),
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Sync => "sync",
            Self::Validate => "validate",
            Self::Actions => "actions",
            Self::EnableUser { .. } => "enable-user",
            Self::DisableUser { .. } => "disable-user",
            Self::CreateAccount { .. } => "create-account",
        }
    }
}
