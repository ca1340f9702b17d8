//! Metabase access sync worker.

#![forbid(unsafe_code)]

mod command;
mod sync_pass;
mod worker_config;

use std::env;
use std::sync::Arc;
use std::time::Duration;

use metasync_application::{
    AccountService, ActionManager, DISABLE_USER_ACTION, ENABLE_USER_ACTION, PermissionMapper,
    SyncService, VersionCheckService, cancellable, connector_metadata,
};
use metasync_core::{AppError, AppResult};
use metasync_domain::Annotated;
use metasync_infrastructure::HttpMetabaseClient;

use serde_json::{Map, Value, json};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use command::Command;
use sync_pass::run_sync_pass;
use worker_config::WorkerConfig;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let command = Command::parse(env::args().skip(1))?;
    let config = WorkerConfig::from_env()?;
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;
    let client = Arc::new(HttpMetabaseClient::new(
        http_client,
        config.base_url.as_str(),
        config.api_key.clone(),
    )?);

    let token = CancellationToken::new();
    let shutdown = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling in-flight operation");
            shutdown.cancel();
        }
    });

    info!(
        command = command.name(),
        base_url = %config.base_url,
        paid_plan = config.with_paid_plan,
        page_size = config.page_size,
        "metasync-worker started"
    );

    let output = run(command, client, &config, &token).await?;
    let rendered = serde_json::to_string_pretty(&output)
        .map_err(|error| AppError::Internal(format!("failed to render output: {error}")))?;
    println!("{rendered}");

    Ok(())
}

async fn run(
    command: Command,
    client: Arc<HttpMetabaseClient>,
    config: &WorkerConfig,
    token: &CancellationToken,
) -> AppResult<Value> {
    let accounts = AccountService::new(client.clone());
    let actions = ActionManager::new(accounts.clone());

    match command {
        Command::Validate => {
            validate(client, token).await?;
            Ok(json!({ "valid": true, "metadata": connector_metadata() }))
        }
        Command::Sync => {
            validate(client.clone(), token).await?;
            let sync = SyncService::new(
                client.clone(),
                client,
                PermissionMapper::new(config.with_paid_plan),
                config.page_size,
            );
            let report = run_sync_pass(&sync, token).await?;
            info!(
                resources = report.resources.len(),
                entitlements = report.entitlements.len(),
                grants = report.grants.len(),
                "sync pass complete"
            );
            serde_json::to_value(&report)
                .map_err(|error| AppError::Internal(format!("failed to render report: {error}")))
        }
        Command::Actions => serde_json::to_value(actions.schemas())
            .map_err(|error| AppError::Internal(format!("failed to render actions: {error}"))),
        Command::EnableUser { user_id } => {
            invoke_action(&actions, ENABLE_USER_ACTION, user_id, token).await
        }
        Command::DisableUser { user_id } => {
            invoke_action(&actions, DISABLE_USER_ACTION, user_id, token).await
        }
        Command::CreateAccount {
            email,
            first_name,
            last_name,
        } => {
            let mut profile = Map::new();
            profile.insert("email".to_owned(), Value::String(email));
            profile.insert("first_name".to_owned(), Value::String(first_name));
            profile.insert("last_name".to_owned(), Value::String(last_name));

            let creation = settle(
                cancellable(token, "create account", accounts.create_account(&profile)).await,
            )?;
            Ok(json!({
                "resource": creation.resource,
                "password": creation.credential.expose_secret(),
            }))
        }
    }
}

async fn validate(client: Arc<HttpMetabaseClient>, token: &CancellationToken) -> AppResult<()> {
    let service = VersionCheckService::new(client);
    settle(cancellable(token, "validate", service.validate()).await)
}

async fn invoke_action(
    actions: &ActionManager,
    name: &str,
    user_id: String,
    token: &CancellationToken,
) -> AppResult<Value> {
    let mut arguments = Map::new();
    arguments.insert("userId".to_owned(), Value::String(user_id));
    settle(cancellable(token, name, actions.invoke(name, Some(&arguments))).await)
}

fn settle<T>(annotated: Annotated<T>) -> AppResult<T> {
    let (annotations, result) = annotated.into_parts();
    if let Some(info) = annotations.rate_limit() {
        debug!(remaining = ?info.remaining, limit = ?info.limit, "rate limit observed");
    }
    result
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
