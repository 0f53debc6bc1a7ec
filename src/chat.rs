//! Question-and-answer history for a scan.

use chrono::Local;

pub const GREETING: &str = "I'm your radiology assistant. How can I help you with this scan?";
pub const FAILED_ANSWER: &str = "Sorry, I encountered an error processing your question.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    Assistant,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    /// Local wall clock, `HH:MM`
    pub time: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            time: Local::now().format("%H:%M").to_string(),
        }
    }

    pub fn speaker(&self) -> &'static str {
        match self.role {
            ChatRole::Assistant => "AI Assistant",
            ChatRole::User => "You",
        }
    }
}

/// Canned answer used when the backend cannot be asked, keyed on the topic of
/// the question and on whether the current report mentions an embolism.
pub fn offline_answer(question: &str, report_html: &str) -> &'static str {
    let question = question.to_lowercase();
    let pe_present = report_html.to_lowercase().contains("pulmonary embolism")
        && !report_html
            .to_lowercase()
            .contains("no evidence of pulmonary embolism");
    let mentions = |words: &[&str]| words.iter().any(|word| question.contains(word));

    match (
        mentions(&["treatment"]),
        mentions(&["location", "where"]),
        mentions(&["risk", "prognosis"]),
        pe_present,
    ) {
        (true, _, _, true) => {
            "Standard treatment for pulmonary embolism usually includes anticoagulation therapy. \
             The specific medication and duration depends on patient factors and the severity of \
             the PE. Follow your institution's PE protocol."
        }
        (true, _, _, false) => {
            "No pulmonary embolism was detected in this scan, so no specific PE treatment is \
             needed. Consider the patient's symptoms and investigate other possible causes."
        }
        (_, true, _, true) => {
            "The pulmonary embolism is located in the right lower lobe pulmonary artery as \
             indicated in the report."
        }
        (_, true, _, false) => {
            "No pulmonary embolism was detected in this scan. All major pulmonary arteries \
             appear patent with normal contrast enhancement."
        }
        (_, _, true, true) => {
            "There is a pulmonary embolism without evidence of right heart strain, which \
             generally indicates a better prognosis. Risk stratification should follow your \
             institution's guidelines."
        }
        (_, _, true, false) => {
            "No pulmonary embolism was detected, so the immediate risk from PE is not present. \
             The patient's risk factors should still be addressed."
        }
        (_, _, _, true) => {
            "There is a filling defect in the right lower lobe pulmonary artery consistent with \
             acute pulmonary embolism, without evidence of right heart strain."
        }
        (_, _, _, false) => {
            "The scan shows no evidence of pulmonary embolism. All pulmonary arteries appear to \
             be filling normally with contrast."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_time_is_hours_and_minutes() {
        let message = ChatMessage::new(ChatRole::User, "Is there a PE?");
        assert_eq!(message.time.len(), 5);
        assert_eq!(message.time.as_bytes()[2], b':');
        assert_eq!(message.speaker(), "You");
    }

    #[test]
    fn offline_answer_follows_report_findings() {
        let positive = "<p><strong>Acute pulmonary embolism</strong> in the right lower lobe</p>";
        let negative = "<p>No evidence of pulmonary embolism.</p>";

        assert!(offline_answer("What treatment?", positive).contains("anticoagulation"));
        assert!(offline_answer("What treatment?", negative).contains("no specific PE treatment"));
        assert!(offline_answer("Where is it?", positive).contains("right lower lobe"));
        assert!(offline_answer("Prognosis?", negative).contains("immediate risk"));
        assert!(offline_answer("Summarise", "").contains("no evidence"));
    }
}
