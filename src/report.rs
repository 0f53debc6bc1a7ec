//! Static CTPA report used when the backend cannot produce one.

use chrono::{DateTime, Local};

pub const REPORT_QUESTION: &str = "Generate a comprehensive CTPA report for this scan.";

const STYLE: &str = r#"<style>
    .report-container { font-family: Arial, sans-serif; max-width: 800px; margin: 20px auto; padding: 25px; border: 1px solid #ccc; border-radius: 8px; background-color: #fff; }
    .report-header { text-align: center; padding-bottom: 15px; border-bottom: 2px solid #2c3e50; }
    .report-title { color: #2c3e50; margin: 0; font-size: 22px; font-weight: 700; }
    .report-section { margin: 15px 0; padding-bottom: 10px; }
    .report-section h4 { color: #2c3e50; margin: 0 0 8px 0; font-size: 16px; border-bottom: 1px solid #eee; padding-bottom: 5px; }
    .pe-finding { color: #c0392b; font-weight: 600; }
    .normal-finding { color: #27ae60; font-weight: 600; }
    .impression-section { background-color: #f9f9f9; padding: 10px 15px; border-left: 4px solid #2c3e50; }
    .recommendation-section { background-color: #f9f9f9; padding: 10px 15px; border-left: 4px solid #3498db; }
    .report-notice { color: #7f8c8d; font-size: 13px; margin: 8px 0 0 0; }
    .report-footer { margin-top: 20px; padding-top: 10px; border-top: 1px solid #eee; font-size: 12px; color: #7f8c8d; text-align: center; }
</style>"#;

const PE_FINDINGS: &str = r#"<div class="report-section">
    <h4>FINDINGS:</h4>
    <ul>
        <li><div class="pe-finding">Filling defect in the right lower lobe pulmonary artery consistent with acute pulmonary embolism</div></li>
        <li>No evidence of right heart strain</li>
        <li>Lung parenchyma shows no consolidation or ground glass opacity</li>
        <li>No pleural effusion</li>
        <li>Mediastinal and hilar lymph nodes within normal limits</li>
    </ul>
</div>
<div class="report-section impression-section">
    <h4>IMPRESSION:</h4>
    <p><strong>Acute pulmonary embolism</strong> in the right lower lobe pulmonary artery without evidence of right heart strain.</p>
</div>
<div class="report-section recommendation-section">
    <h4>RECOMMENDATION:</h4>
    <p>Anticoagulation therapy as per institutional protocol. Clinical correlation recommended.</p>
</div>"#;

const NORMAL_FINDINGS: &str = r#"<div class="report-section">
    <h4>FINDINGS:</h4>
    <ul>
        <li><div class="normal-finding">No filling defects in the main, lobar, segmental, or subsegmental pulmonary arteries</div></li>
        <li>Normal caliber of the main pulmonary artery</li>
        <li>Lung parenchyma shows no consolidation or ground glass opacity</li>
        <li>No pleural effusion</li>
        <li>Mediastinal and hilar lymph nodes within normal limits</li>
    </ul>
</div>
<div class="report-section impression-section">
    <h4>IMPRESSION:</h4>
    <p><strong class="normal-finding">No evidence of pulmonary embolism.</strong></p>
</div>
<div class="report-section recommendation-section">
    <h4>RECOMMENDATION:</h4>
    <p>No further imaging required for suspected pulmonary embolism. Clinical correlation recommended.</p>
</div>"#;

/// Patient and signature fields printed on the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportHeader {
    pub patient_id: String,
    pub patient_name: String,
    pub patient_dob: String,
    pub patient_gender: String,
    pub referring_physician: String,
    pub radiologist: String,
}

impl Default for ReportHeader {
    fn default() -> Self {
        Self {
            patient_id: "Anonymous".to_string(),
            patient_name: "Anonymous".to_string(),
            patient_dob: "Unknown".to_string(),
            patient_gender: "Anonymous".to_string(),
            referring_physician: "Unknown".to_string(),
            radiologist: "Unknown".to_string(),
        }
    }
}

/// Human-readable report date, e.g. "March 14, 2025 at 09:26 AM".
pub fn report_date(at: DateTime<Local>) -> String {
    at.format("%B %d, %Y at %I:%M %p").to_string()
}

/// Build the static report, with or without the embolism finding.
pub fn fallback_report(header: &ReportHeader, pe_present: bool, at: DateTime<Local>) -> String {
    let date = report_date(at);
    let findings = if pe_present {
        PE_FINDINGS
    } else {
        NORMAL_FINDINGS
    };
    format!(
        r#"{STYLE}
<div class="report-container">
    <div class="report-header">
        <h3 class="report-title">CT PULMONARY ANGIOGRAPHY REPORT</h3>
        <p class="report-notice">Automated analysis unavailable: static template report.</p>
    </div>
    <div class="report-section">
        <h4>PATIENT INFORMATION:</h4>
        <p>
            <strong>Patient ID:</strong> {patient_id} <br>
            <strong>Name:</strong> {patient_name} <br>
            <strong>DOB:</strong> {patient_dob} <br>
            <strong>Gender:</strong> {patient_gender} <br>
            <strong>Referring Physician:</strong> {referring_physician}
        </p>
    </div>
    <div class="report-section">
        <h4>EXAM:</h4>
        <p>CT Pulmonary Angiography (CTPA)</p>
    </div>
    <div class="report-section">
        <h4>DATE:</h4>
        <p>{date}</p>
    </div>
    <div class="report-section">
        <h4>TECHNIQUE:</h4>
        <p>Contrast-enhanced CT of the chest with pulmonary arterial phase imaging.<br>
        IV contrast: 70 ml of non-ionic contrast material.<br>
        Slice thickness: 1.0 mm</p>
    </div>
    {findings}
    <div class="report-footer">
        <p>Report generated by {radiologist}<br>
        This report was electronically signed on {date}</p>
    </div>
</div>"#,
        patient_id = header.patient_id,
        patient_name = header.patient_name,
        patient_dob = header.patient_dob,
        patient_gender = header.patient_gender,
        referring_physician = header.referring_physician,
        radiologist = header.radiologist,
    )
}
