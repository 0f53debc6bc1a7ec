use std::path::Path;
use std::time::Duration;

use log::{debug, info, warn};
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::retry::RetryPolicy;
use super::types::{
    AnalysisReport, AnalyzeRequest, Answer, HealthStatus, QuestionRequest, ScanInfo, ScanMetadata,
    SliceImage, UploadResponse,
};
use crate::config::Config;
use crate::enums::Plane;
use crate::window::WindowSetting;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid API URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request to {endpoint} timed out")]
    Timeout { endpoint: String },

    #[error("Request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: StatusCode,
        body: String,
    },

    #[error("{endpoint} gave up after {attempts} timed out attempts")]
    RetriesExhausted { endpoint: String, attempts: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Timeout { .. })
    }

    fn from_reqwest(endpoint: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            ApiError::Timeout {
                endpoint: endpoint.to_string(),
            }
        } else {
            ApiError::Request {
                endpoint: endpoint.to_string(),
                source,
            }
        }
    }
}

/// Client for the analysis backend
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
    long_request_timeout: Duration,
    report_retry: RetryPolicy,
}

impl ApiClient {
    /// Create a client, validating the base URL.
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let cleaned_url = config.api_url.trim_end_matches('/');
        let invalid = |reason: String| ApiError::InvalidUrl {
            url: cleaned_url.to_string(),
            reason,
        };

        let parsed = Url::parse(cleaned_url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid(format!(
                "scheme must be http or https, got {}",
                parsed.scheme()
            )));
        }
        if !parsed.username().is_empty() || parsed.password().is_some() {
            return Err(invalid("credentials are not allowed".to_string()));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(ApiError::Client)?;

        info!("API client created for {}", cleaned_url);

        Ok(Self {
            client,
            base_url: cleaned_url.to_string(),
            request_timeout: config.request_timeout,
            long_request_timeout: config.long_request_timeout,
            report_retry: config.report_retry,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        debug!("Sending request to {}", endpoint);
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                endpoint: endpoint.to_string(),
                status,
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::from_reqwest(endpoint, e))
    }

    /// Backend status. Never fails: an unreachable backend reports
    /// `status = "error"` and no loaded model.
    pub async fn health(&self) -> HealthStatus {
        let request = self
            .client
            .get(self.url("/health"))
            .timeout(self.request_timeout);
        match self.send_json::<HealthStatus>("/health", request).await {
            Ok(health) => health,
            Err(e) => {
                warn!("Error connecting to API: {}", e);
                HealthStatus::unreachable()
            }
        }
    }

    /// Upload a scan file as the multipart field `file`.
    pub async fn upload_scan(&self, path: &Path) -> Result<UploadResponse, ApiError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "scan".to_string());
        info!("Uploading {} ({} bytes)", file_name, bytes.len());

        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));
        let request = self
            .client
            .post(self.url("/upload"))
            .multipart(form)
            .timeout(self.long_request_timeout);
        self.send_json("/upload", request).await
    }

    pub async fn list_scans(&self) -> Result<Vec<ScanInfo>, ApiError> {
        let request = self
            .client
            .get(self.url("/scans"))
            .timeout(self.request_timeout);
        self.send_json("/scans", request).await
    }

    pub async fn scan_metadata(&self, scan_id: &str) -> Result<ScanMetadata, ApiError> {
        let endpoint = format!("/scans/{scan_id}");
        let request = self
            .client
            .get(self.url(&endpoint))
            .timeout(self.request_timeout);
        self.send_json(&endpoint, request).await
    }

    /// Fetch one slice, windowed by the backend.
    pub async fn scan_slice(
        &self,
        scan_id: &str,
        plane: Plane,
        slice_index: usize,
        window: WindowSetting,
    ) -> Result<SliceImage, ApiError> {
        let endpoint = format!("/slice/{scan_id}");
        let request = self
            .client
            .get(self.url(&endpoint))
            .query(&[
                ("view", plane.as_str().to_string()),
                ("slice_idx", slice_index.to_string()),
                ("window_center", window.center().to_string()),
                ("window_width", window.width().to_string()),
            ])
            .timeout(self.request_timeout);
        self.send_json(&endpoint, request).await
    }

    pub async fn ask_question(&self, scan_id: &str, question: &str) -> Result<Answer, ApiError> {
        let endpoint = format!("/ask/{scan_id}");
        let request = self
            .client
            .post(self.url(&endpoint))
            .json(&QuestionRequest { text: question })
            .timeout(self.request_timeout);
        self.send_json(&endpoint, request).await
    }

    /// Request a report, retrying timed out attempts per the report policy.
    pub async fn analyze_scan(
        &self,
        scan_id: &str,
        questions: &[&str],
    ) -> Result<AnalysisReport, ApiError> {
        let body = AnalyzeRequest {
            scan_id,
            questions: questions
                .iter()
                .map(|&text| QuestionRequest { text })
                .collect(),
        };

        let result = self
            .report_retry
            .run(
                "Report generation",
                || {
                    let request = self
                        .client
                        .post(self.url("/analyze"))
                        .json(&body)
                        .timeout(self.long_request_timeout);
                    self.send_json::<AnalysisReport>("/analyze", request)
                },
                ApiError::is_timeout,
            )
            .await;

        match result {
            Err(e) if e.is_timeout() => Err(ApiError::RetriesExhausted {
                endpoint: "/analyze".to_string(),
                attempts: self.report_retry.attempts.max(1),
            }),
            other => other,
        }
    }
}
