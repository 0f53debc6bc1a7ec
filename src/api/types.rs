use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Response of the health endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub model_loaded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

impl HealthStatus {
    /// Status reported when the backend cannot be reached at all.
    pub fn unreachable() -> Self {
        Self {
            status: "error".to_string(),
            model_loaded: false,
            api_url: None,
            device: None,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadResponse {
    pub scan_id: String,
    pub filename: String,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// Entry of the scan list
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScanInfo {
    pub scan_id: String,
    pub filename: String,
    #[serde(default)]
    pub upload_time: String,
}

impl ScanInfo {
    /// Date part (`YYYY-MM-DD`) of the upload timestamp.
    pub fn upload_date(&self) -> &str {
        self.upload_time.get(..10).unwrap_or(&self.upload_time)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScanMetadata {
    pub filename: String,
    #[serde(default)]
    pub dimensions: Vec<usize>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl ScanMetadata {
    /// `(Dx, Dy, Dz)` when the backend reported exactly three non-zero extents.
    pub fn dims(&self) -> Option<(usize, usize, usize)> {
        match self.dimensions.as_slice() {
            &[x, y, z] if x > 0 && y > 0 && z > 0 => Some((x, y, z)),
            _ => None,
        }
    }
}

/// Encoded bitmap of one windowed slice.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SliceImage {
    pub image: String,
}

impl SliceImage {
    /// Decode the base64 payload, accepting an optional `data:` URL prefix.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        let payload = match self.image.split_once(";base64,") {
            Some((_, data)) => data,
            None => self.image.as_str(),
        };
        base64::engine::general_purpose::STANDARD.decode(payload.trim())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Answer {
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnalysisReport {
    #[serde(default)]
    pub report_html: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct QuestionRequest<'a> {
    pub text: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct AnalyzeRequest<'a> {
    pub scan_id: &'a str,
    pub questions: Vec<QuestionRequest<'a>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_defaults_missing_fields() {
        let health: HealthStatus = serde_json::from_str(r#"{"status": "healthy"}"#).unwrap();
        assert!(health.is_healthy());
        assert!(!health.model_loaded);
        assert!(!HealthStatus::unreachable().is_healthy());
    }

    #[test]
    fn metadata_exposes_three_dimensions() {
        let metadata: ScanMetadata = serde_json::from_str(
            r#"{"filename": "chest.nii.gz", "dimensions": [512, 512, 300], "spacing": [0.7, 0.7, 1.0]}"#,
        )
        .unwrap();
        assert_eq!(metadata.dims(), Some((512, 512, 300)));
        assert!(metadata.extra.contains_key("spacing"));

        let flat: ScanMetadata =
            serde_json::from_str(r#"{"filename": "x", "dimensions": [512, 512]}"#).unwrap();
        assert_eq!(flat.dims(), None);
        let missing: ScanMetadata = serde_json::from_str(r#"{"filename": "x"}"#).unwrap();
        assert_eq!(missing.dims(), None);
    }

    #[test]
    fn upload_date_truncates_timestamp() {
        let scan: ScanInfo = serde_json::from_str(
            r#"{"scan_id": "a1", "filename": "ct.nii", "upload_time": "2025-03-14T09:26:53"}"#,
        )
        .unwrap();
        assert_eq!(scan.upload_date(), "2025-03-14");
    }

    #[test]
    fn slice_image_decodes_plain_and_data_url() {
        let plain = SliceImage {
            image: "iVBORw==".to_string(),
        };
        assert_eq!(plain.decode().unwrap(), vec![0x89, b'P', b'N', b'G']);

        let data_url = SliceImage {
            image: "data:image/png;base64,iVBORw==".to_string(),
        };
        assert_eq!(data_url.decode().unwrap(), plain.decode().unwrap());
    }

    #[test]
    fn analyze_request_serializes_question_objects() {
        let request = AnalyzeRequest {
            scan_id: "a1",
            questions: vec![QuestionRequest { text: "Any PE?" }],
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"scan_id": "a1", "questions": [{"text": "Any PE?"}]})
        );
    }
}
