//! One user's interactions with the backend.
//!
//! Each method is a single interaction. API failures are recorded as session
//! notifications and never abort the session.

use std::path::Path;

use chrono::Local;
use log::{debug, info};
use thiserror::Error;

use crate::api::{ApiClient, ApiError, HealthStatus, ScanInfo, UploadResponse};
use crate::chat::{FAILED_ANSWER, offline_answer};
use crate::notification::NotificationLevel;
use crate::report::{REPORT_QUESTION, ReportHeader, fallback_report};
use crate::session::Session;
use crate::view_state::{ViewError, ViewState};

/// File name suffixes the backend accepts for upload
pub const SUPPORTED_EXTENSIONS: [&str; 3] = [".nii", ".nii.gz", ".npz"];

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("No scan is selected")]
    NoScanSelected,

    #[error("Unsupported scan file '{0}', expected NIfTI (.nii, .nii.gz) or NumPy (.npz)")]
    UnsupportedFile(String),

    #[error("Scan dimensions not available for {0}")]
    MissingDimensions(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    View(#[from] ViewError),

    #[error("Slice image is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
}

pub fn is_supported_file(file_name: &str) -> bool {
    let lower = file_name.to_ascii_lowercase();
    SUPPORTED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

pub struct Viewer {
    client: ApiClient,
    session: Session,
    fallback_header: ReportHeader,
}

impl Viewer {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            session: Session::new(),
            fallback_header: ReportHeader::default(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    fn fail<T>(&mut self, context: &str, err: impl Into<ViewerError>) -> Result<T, ViewerError> {
        let err = err.into();
        self.session
            .notify(format!("{context}: {err}"), NotificationLevel::Error);
        Err(err)
    }

    fn current_scan_id(&self) -> Result<String, ViewerError> {
        self.session
            .current_scan()
            .map(str::to_string)
            .ok_or(ViewerError::NoScanSelected)
    }

    pub async fn health(&mut self) -> HealthStatus {
        let health = self.client.health().await;
        if !health.is_healthy() {
            self.session
                .notify("API connection error", NotificationLevel::Error);
        } else if !health.model_loaded {
            self.session
                .notify("AI models loading...", NotificationLevel::Warning);
        }
        health
    }

    pub async fn list_scans(&mut self) -> Vec<ScanInfo> {
        match self.client.list_scans().await {
            Ok(scans) => scans,
            Err(e) => {
                self.session.notify(
                    format!("Error getting scan list: {e}"),
                    NotificationLevel::Error,
                );
                Vec::new()
            }
        }
    }

    /// Upload a scan file and make it the active scan. The upload counts as
    /// successful even when the scan cannot be opened afterwards; that
    /// failure is only recorded as a notification.
    pub async fn upload(&mut self, path: &Path) -> Result<UploadResponse, ViewerError> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !is_supported_file(&file_name) {
            return self.fail("Error uploading scan", ViewerError::UnsupportedFile(file_name));
        }

        let uploaded = match self.client.upload_scan(path).await {
            Ok(uploaded) => uploaded,
            Err(e) => return self.fail("Error uploading scan", e),
        };
        self.session.notify(
            format!("Successfully processed {file_name}"),
            NotificationLevel::Success,
        );
        if let Err(e) = self.open_scan(&uploaded.scan_id).await {
            debug!("Uploaded scan {} not opened: {}", uploaded.scan_id, e);
        }
        Ok(uploaded)
    }

    /// Fetch metadata for `scan_id` and make it the active scan.
    pub async fn open_scan(&mut self, scan_id: &str) -> Result<ViewState, ViewerError> {
        let metadata = match self.client.scan_metadata(scan_id).await {
            Ok(metadata) => metadata,
            Err(e) => return self.fail("Error getting scan metadata", e),
        };
        let Some(dims) = metadata.dims() else {
            self.session
                .notify("Scan dimensions not available", NotificationLevel::Warning);
            return Err(ViewerError::MissingDimensions(scan_id.to_string()));
        };
        debug!("Metadata for {}: {:?}", metadata.filename, dims);
        match self.session.select_scan(scan_id, dims) {
            Ok(view) => Ok(view),
            Err(e) => self.fail("Error opening scan", e),
        }
    }

    /// Encoded image of the active slice, windowed by the backend.
    pub async fn fetch_current_slice(&mut self) -> Result<Vec<u8>, ViewerError> {
        let scan_id = self.current_scan_id()?;
        let view = self.session.view().ok_or(ViewerError::NoScanSelected)?;
        let slice = match self
            .client
            .scan_slice(&scan_id, view.plane(), view.current_slice(), view.window())
            .await
        {
            Ok(slice) => slice,
            Err(e) => return self.fail("Failed to load scan slice", e),
        };
        match slice.decode() {
            Ok(bytes) => Ok(bytes),
            Err(e) => self.fail("Failed to load scan slice", e),
        }
    }

    /// Ask about the active scan. The returned text is what was appended to
    /// the chat, which is an apology when the backend failed.
    pub async fn ask(&mut self, question: &str) -> Result<String, ViewerError> {
        let scan_id = self.current_scan_id()?;
        let question = question.trim();
        self.session.record_question(&scan_id, question);

        match self.client.ask_question(&scan_id, question).await {
            Ok(answer) => {
                self.session.record_answer(&scan_id, &answer.answer);
                Ok(answer.answer)
            }
            Err(e) => {
                self.session.notify(
                    format!("Error asking question: {e}"),
                    NotificationLevel::Error,
                );
                self.session.record_failed_answer(&scan_id);
                Ok(FAILED_ANSWER.to_string())
            }
        }
    }

    /// Answer about `scan_id` from its stored report, without contacting
    /// the backend.
    pub fn ask_offline(&mut self, scan_id: &str, question: &str) -> String {
        let question = question.trim();
        let answer = offline_answer(question, self.session.report(scan_id).unwrap_or_default());
        self.session.record_question(scan_id, question);
        self.session.record_answer(scan_id, answer);
        answer.to_string()
    }

    /// Report for the active scan, generating it if needed.
    ///
    /// When the backend fails the static report is returned but not stored,
    /// so the next call asks the backend again and offline answers never
    /// read the template as a finding.
    pub async fn generate_report(&mut self) -> Result<String, ViewerError> {
        let scan_id = self.current_scan_id()?;
        if let Some(existing) = self.session.report(&scan_id) {
            return Ok(existing.to_string());
        }

        let generated = match self.client.analyze_scan(&scan_id, &[REPORT_QUESTION]).await {
            Ok(analysis) => analysis.report_html.filter(|html| !html.is_empty()),
            Err(e) => {
                self.session.notify(
                    format!("Error analyzing scan: {e}"),
                    NotificationLevel::Error,
                );
                None
            }
        };

        match generated {
            Some(html) => {
                info!("Report generated for {}", scan_id);
                self.session
                    .notify("Report generated successfully!", NotificationLevel::Success);
                self.session.store_report(&scan_id, html.clone());
                Ok(html)
            }
            None => {
                self.session
                    .notify("Failed to generate report", NotificationLevel::Error);
                Ok(fallback_report(&self.fallback_header, true, Local::now()))
            }
        }
    }
}
