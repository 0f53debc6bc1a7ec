use std::time::Duration;

use crate::api::RetryPolicy;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Connection settings for the analysis backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    /// Timeout for health, list, metadata, slice and question calls
    pub request_timeout: Duration,
    /// Timeout for upload and report generation
    pub long_request_timeout: Duration,
    pub report_retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            long_request_timeout: Duration::from_secs(60),
            report_retry: RetryPolicy::default(),
        }
    }
}
