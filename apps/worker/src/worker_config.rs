use std::env;
use std::fmt::{Debug, Formatter};

use metasync_core::{AppError, AppResult, NonEmptyString};

const DEFAULT_PAGE_SIZE: i64 = 100;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Runtime settings read from the environment.
#[derive(Clone)]
pub(crate) struct WorkerConfig {
    pub base_url: String,
    pub api_key: NonEmptyString,
    pub with_paid_plan: bool,
    pub page_size: i64,
    pub http_timeout_secs: u64,
}

impl Debug for WorkerConfig {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("WorkerConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("with_paid_plan", &self.with_paid_plan)
            .field("page_size", &self.page_size)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .finish()
    }
}

impl WorkerConfig {
    pub(crate) fn from_env() -> AppResult<Self> {
        Self::load(|name| env::var(name).ok())
    }

    pub(crate) fn load(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let base_url = required_env(&lookup, "METABASE_BASE_URL")?
            .trim_end_matches('/')
            .to_owned();
        let api_key = NonEmptyString::new(required_env(&lookup, "METABASE_API_KEY")?)
            .map_err(|_| AppError::Validation("METABASE_API_KEY must not be blank".to_owned()))?;
        let with_paid_plan = parse_env_bool(&lookup, "METABASE_WITH_PAID_PLAN", false)?;
        let page_size = parse_env_i64(&lookup, "METABASE_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        let http_timeout_secs =
            parse_env_u64(&lookup, "METABASE_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;

        if page_size <= 0 {
            return Err(AppError::Validation(
                "METABASE_PAGE_SIZE must be greater than zero".to_owned(),
            ));
        }

        if http_timeout_secs == 0 {
            return Err(AppError::Validation(
                "METABASE_HTTP_TIMEOUT_SECS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            base_url,
            api_key,
            with_paid_plan,
            page_size,
            http_timeout_secs,
        })
    }
}

fn required_env(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> AppResult<String> {
    lookup(name)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::Validation(format!("{name} is required")))
}

fn parse_env_bool(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: bool,
) -> AppResult<bool> {
    match lookup(name) {
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" | "" => Ok(false),
            _ => Err(AppError::Validation(format!(
                "invalid {name} value '{value}': expected true or false"
            ))),
        },
        None => Ok(default),
    }
}

fn parse_env_i64(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: i64,
) -> AppResult<i64> {
    match lookup(name) {
        Some(value) => value.trim().parse::<i64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        None => Ok(default),
    }
}

fn parse_env_u64(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: u64,
) -> AppResult<u64> {
    match lookup(name) {
        Some(value) => value.trim().parse::<u64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use metasync_core::AppError;

    use super::WorkerConfig;

    fn load(pairs: &[(&str, &str)]) -> Result<WorkerConfig, AppError> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect();
        WorkerConfig::load(|name| values.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_optional_values_are_absent() {
        let config = load(&[
            ("METABASE_BASE_URL", "https://metabase.example.com/"),
            ("METABASE_API_KEY", "mb_key"),
        ]);

        let Ok(config) = config else {
            panic!("config should load");
        };
        assert_eq!(config.base_url, "https://metabase.example.com");
        assert!(!config.with_paid_plan);
        assert_eq!(config.page_size, 100);
        assert_eq!(config.http_timeout_secs, 30);
    }

    #[test]
    fn missing_api_key_is_rejected() {
        let config = load(&[("METABASE_BASE_URL", "https://metabase.example.com")]);
        assert!(matches!(config, Err(AppError::Validation(ref message)) if message.contains("METABASE_API_KEY")));
    }

    #[test]
    fn paid_plan_and_page_size_are_parsed() {
        let config = load(&[
            ("METABASE_BASE_URL", "https://metabase.example.com"),
            ("METABASE_API_KEY", "mb_key"),
            ("METABASE_WITH_PAID_PLAN", "TRUE"),
            ("METABASE_PAGE_SIZE", "25"),
        ]);
        assert!(matches!(config, Ok(ref config) if config.with_paid_plan && config.page_size == 25));

        let invalid = load(&[
            ("METABASE_BASE_URL", "https://metabase.example.com"),
            ("METABASE_API_KEY", "mb_key"),
            ("METABASE_PAGE_SIZE", "0"),
        ]);
        assert!(matches!(invalid, Err(AppError::Validation(_))));
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let Ok(config) = load(&[
            ("METABASE_BASE_URL", "https://metabase.example.com"),
            ("METABASE_API_KEY", "mb_super_secret"),
        ]) else {
            panic!("config should load");
        };
        assert!(!format!("{config:?}").contains("mb_super_secret"));
    }
}
