use crate::error::ConfigError;

pub const ARTIFACT_BUCKET_ENV: &str = "UI_ARTIFACT_BUCKET";
pub const SITE_BUCKET_ENV: &str = "UI_SITE_BUCKET";
pub const REQUEST_QUEUE_URL_ENV: &str = "DEPLOY_REQUEST_QUEUE_URL";
pub const RESULT_QUEUE_URL_ENV: &str = "DEPLOY_RESULT_QUEUE_URL";
pub const TIMEOUT_ENV: &str = "TIMEOUT";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Everything the deploy handler needs to reach its three cloud resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployHandlerConfig {
    pub artifact_bucket: String,
    pub site_bucket: String,
    pub result_queue_url: String,
}

impl DeployHandlerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            artifact_bucket: required(&lookup, ARTIFACT_BUCKET_ENV)?,
            site_bucket: required(&lookup, SITE_BUCKET_ENV)?,
            result_queue_url: required(&lookup, RESULT_QUEUE_URL_ENV)?,
        })
    }
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<String, ConfigError> {
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing(key))
}
