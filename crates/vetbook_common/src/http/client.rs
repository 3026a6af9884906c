use reqwest::Client;
use std::time::Duration;
use vetbook_config::ApiConfig;

use crate::error::{config_error, VetbookError};

/// Builds the HTTP client used for every call to the booking service.
pub fn create_client(timeout_secs: u64) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
}

/// Normalises the configured base URL and rejects ones reqwest cannot use.
pub fn base_url(config: &ApiConfig) -> Result<String, VetbookError> {
    let base = config.base_url.trim().trim_end_matches('/').to_string();
    reqwest::Url::parse(&base)
        .map_err(|e| config_error(format!("invalid api.base_url {:?}: {}", config.base_url, e)))?;
    Ok(base)
}

/// `Authorization` header value for a session token.
pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
