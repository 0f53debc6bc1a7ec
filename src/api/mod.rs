//! Client for the scan analysis backend.
//!
//! The backend owns ingestion, inference, question answering and report
//! synthesis; this module only speaks its HTTP contract.

mod client;
mod retry;
mod types;

pub use client::{ApiClient, ApiError};
pub use retry::RetryPolicy;
pub use types::{
    AnalysisReport, Answer, HealthStatus, ScanInfo, ScanMetadata, SliceImage, UploadResponse,
};
