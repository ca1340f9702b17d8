use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use metasync_core::{AppError, AppResult};
use metasync_domain::{Annotated, Annotations};

use crate::MetabaseClient;

const SUPPORTED_MAJOR: u32 = 0;
const SUPPORTED_MINORS: std::ops::Range<u32> = 56..57;

/// Display metadata for the connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectorMetadata {
    /// Human readable name.
    pub display_name: &'static str,
    /// Short description.
    pub description: &'static str,
}

/// Returns display metadata for the connector.
#[must_use]
pub fn connector_metadata() -> ConnectorMetadata {
    ConnectorMetadata {
        display_name: "Metabase-v056",
        description: "Metabase connector v056 to sync users, groups and databases",
    }
}

/// Verifies that the configured upstream runs a supported release.
#[derive(Clone)]
pub struct VersionCheckService {
    client: Arc<dyn MetabaseClient>,
}

impl VersionCheckService {
    /// Creates a new service from the upstream client.
    #[must_use]
    pub fn new(client: Arc<dyn MetabaseClient>) -> Self {
        Self { client }
    }

    /// Fetches the upstream version and rejects unsupported releases.
    pub async fn validate(&self) -> Annotated<()> {
        let mut annotations = Annotations::new();
        let result = self
            .client
            .get_version()
            .await
            .record(&mut annotations)
            .map_err(|error| error.context("failed to fetch Metabase version"))
            .and_then(|version| check_version_tag(version.tag.as_str()));

        match &result {
            Ok(()) => info!("Metabase version supported"),
            Err(error) => error!(error = %error, "Metabase version check failed"),
        }
        Annotated::new(annotations, result)
    }
}

/// Accepts `v0.56.x` style tags.
pub fn check_version_tag(tag: &str) -> AppResult<()> {
    let trimmed = tag.strip_prefix('v').unwrap_or(tag);
    let mut parts = trimmed.split('.');
    let (Some(major), Some(minor)) = (parts.next(), parts.next()) else {
        return Err(AppError::UnsupportedVersion(format!(
            "unexpected version format: {tag}"
        )));
    };

    let major = major.parse::<u32>().map_err(|parse_error| {
        AppError::UnsupportedVersion(format!("invalid major version in tag {tag}: {parse_error}"))
    })?;
    let minor = minor.parse::<u32>().map_err(|parse_error| {
        AppError::UnsupportedVersion(format!("invalid minor version in tag {tag}: {parse_error}"))
    })?;

    if major != SUPPORTED_MAJOR || !SUPPORTED_MINORS.contains(&minor) {
        return Err(AppError::UnsupportedVersion(format!(
            "unsupported Metabase version: {tag} (only Metabase v0.56.x is supported)"
        )));
    }

    Ok(())
}
