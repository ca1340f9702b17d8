use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::ACCEPT;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use metasync_application::{
    CreateUserRequest, MembershipDirectory, MembershipMap, MetabaseClient, MetabaseDatabase,
    MetabaseGroup, MetabaseUser, NewMembership, Observed, PageOptions, PermissionGraph, UsersPage,
    VersionInfo,
};
use metasync_core::{AppError, AppResult, NonEmptyString};

use crate::rate_limit_headers::rate_limit_from_headers;

const API_KEY_HEADER: &str = "X-API-KEY";
const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct DatabaseListBody {
    #[serde(default)]
    data: Vec<MetabaseDatabase>,
}

/// reqwest implementation of the Metabase ports.
#[derive(Clone)]
pub struct HttpMetabaseClient {
    http_client: reqwest::Client,
    base_url: Url,
    api_key: NonEmptyString,
}

impl HttpMetabaseClient {
    /// Creates a client rooted at `base_url`.
    ///
    /// Plain `http` base URLs are accepted with a warning.
    pub fn new(
        http_client: reqwest::Client,
        base_url: &str,
        api_key: NonEmptyString,
    ) -> AppResult<Self> {
        let parsed = Url::parse(base_url.trim_end_matches('/')).map_err(|error| {
            AppError::Validation(format!("invalid Metabase base URL '{base_url}': {error}"))
        })?;
        if parsed.cannot_be_a_base() {
            return Err(AppError::Validation(format!(
                "Metabase base URL '{base_url}' cannot carry a path"
            )));
        }
        if parsed.scheme() != "https" {
            warn!(
                base_url = %parsed,
                "Metabase connection does not use https; only use it on a trusted network"
            );
        }

        Ok(Self {
            http_client,
            base_url: parsed,
            api_key,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
        operation: &str,
    ) -> Observed<Vec<u8>> {
        debug!(method = %method, path = url.path(), operation, "sending Metabase request");

        let mut request = self
            .http_client
            .request(method, url)
            .header(API_KEY_HEADER, self.api_key.as_str())
            .header(ACCEPT, JSON_CONTENT_TYPE);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(error) => {
                return Observed::new(
                    None,
                    Err(AppError::Transport(format!("{operation} request failed: {error}"))),
                );
            }
        };

        let status = response.status();
        let rate_limit = rate_limit_from_headers(status, response.headers(), Utc::now());
        let bytes = match response.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(error) => {
                return Observed::new(
                    rate_limit,
                    Err(AppError::Transport(format!(
                        "failed to read {operation} response body: {error}"
                    ))),
                );
            }
        };

        if !status.is_success() {
            return Observed::new(
                rate_limit,
                Err(AppError::Upstream {
                    status: status.as_u16(),
                    message: error_message(status, &bytes),
                }),
            );
        }

        Observed::new(rate_limit, Ok(bytes))
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
        operation: &str,
    ) -> Observed<T> {
        let observed = self.send(method, url, body, operation).await;
        let result = observed
            .result
            .and_then(|bytes| decode_json(&bytes, operation));
        Observed::new(observed.rate_limit, result)
    }

    async fn execute(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
        operation: &str,
    ) -> Observed<()> {
        let observed = self.send(method, url, body, operation).await;
        Observed::new(observed.rate_limit, observed.result.map(|_| ()))
    }
}

fn decode_json<T: DeserializeOwned>(bytes: &[u8], operation: &str) -> AppResult<T> {
    serde_json::from_slice(bytes).map_err(|error| {
        AppError::Decode(format!("failed to decode {operation} response: {error}"))
    })
}

fn to_body<T: serde::Serialize>(value: &T, operation: &str) -> AppResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|error| {
        AppError::Internal(format!("failed to encode {operation} request: {error}"))
    })
}

/// Picks the most useful error text from a failed response.
///
/// Prefers a non-empty JSON `message`, then the trimmed raw body, then the
/// status reason phrase.
fn error_message(status: StatusCode, body: &[u8]) -> String {
    let json_message = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.message)
        .filter(|message| !message.trim().is_empty());
    if let Some(message) = json_message {
        return message;
    }

    let raw = String::from_utf8_lossy(body);
    let raw = raw.trim();
    if !raw.is_empty() {
        return raw.to_owned();
    }

    status
        .canonical_reason()
        .map_or_else(|| status.as_str().to_owned(), str::to_owned)
}

#[async_trait]
impl MetabaseClient for HttpMetabaseClient {
    async fn list_users(&self, options: PageOptions) -> Observed<UsersPage> {
        let mut url = self.endpoint(&["api", "user"]);
        url.query_pairs_mut()
            .append_pair("limit", options.limit.to_string().as_str())
            .append_pair("offset", options.offset.to_string().as_str())
            .append_pair("status", "all");

        self.fetch(Method::GET, url, None, "list users").await
    }

    async fn get_user(&self, user_id: &str) -> Observed<MetabaseUser> {
        let url = self.endpoint(&["api", "user", user_id]);
        self.fetch(Method::GET, url, None, "get user").await
    }

    async fn create_user(&self, request: CreateUserRequest) -> Observed<MetabaseUser> {
        let body = match to_body(&request, "create user") {
            Ok(body) => body,
            Err(error) => return Observed::new(None, Err(error)),
        };
        let url = self.endpoint(&["api", "user"]);
        self.fetch(Method::POST, url, Some(body), "create user").await
    }

    async fn update_user_active_status(
        &self,
        user_id: &str,
        active: bool,
    ) -> Observed<MetabaseUser> {
        if active {
            let url = self.endpoint(&["api", "user", user_id, "reactivate"]);
            self.fetch(Method::PUT, url, None, "reactivate user").await
        } else {
            let url = self.endpoint(&["api", "user", user_id]);
            self.fetch(Method::DELETE, url, None, "deactivate user").await
        }
    }

    async fn list_groups(&self) -> Observed<Vec<MetabaseGroup>> {
        let url = self.endpoint(&["api", "permissions", "group"]);
        self.fetch(Method::GET, url, None, "list groups").await
    }

    async fn list_databases(&self) -> Observed<Vec<MetabaseDatabase>> {
        let url = self.endpoint(&["api", "database"]);
        let observed: Observed<DatabaseListBody> =
            self.fetch(Method::GET, url, None, "list databases").await;
        Observed::new(observed.rate_limit, observed.result.map(|body| body.data))
    }

    async fn get_database_permissions(&self, database_id: &str) -> Observed<PermissionGraph> {
        let url = self.endpoint(&["api", "permissions", "graph", "db", database_id]);
        self.fetch(Method::GET, url, None, "get database permissions")
            .await
    }

    async fn get_version(&self) -> Observed<VersionInfo> {
        let url = self.endpoint(&["api", "setting", "version"]);
        self.fetch(Method::GET, url, None, "get version").await
    }
}

#[async_trait]
impl MembershipDirectory for HttpMetabaseClient {
    async fn list_memberships(&self) -> Observed<MembershipMap> {
        let url = self.endpoint(&["api", "permissions", "membership"]);
        self.fetch(Method::GET, url, None, "list memberships").await
    }

    async fn add_membership(&self, membership: NewMembership) -> Observed<()> {
        let body = match to_body(&membership, "add membership") {
            Ok(body) => body,
            Err(error) => return Observed::new(None, Err(error)),
        };
        let url = self.endpoint(&["api", "permissions", "membership"]);
        self.execute(Method::POST, url, Some(body), "add membership")
            .await
    }

    async fn remove_membership(&self, membership_id: i64) -> Observed<()> {
        let membership_id = membership_id.to_string();
        let url = self.endpoint(&["api", "permissions", "membership", membership_id.as_str()]);
        self.execute(Method::DELETE, url, None, "remove membership")
            .await
    }
}
