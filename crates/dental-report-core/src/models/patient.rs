//! Patient models.

use dental_report_llm::PatientContext;
use serde::{Deserialize, Serialize};

/// Placeholder shown for every missing value.
pub const NOT_AVAILABLE: &str = "N/A";

/// Placeholder shown instead of the patient's name when anonymizing.
pub const ANONYMOUS_NAME: &str = "Anonymous";

/// Patient details supplied by the calling workflow for one report.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PatientInfo {
    /// Patient name
    pub name: String,
    /// Age in years (display only)
    pub age: Option<u32>,
    /// Gender, free text
    #[serde(default)]
    pub gender: String,
    /// Primary complaint
    #[serde(default)]
    pub complaint: String,
    /// Medical history
    #[serde(default)]
    pub medical_history: String,
    /// Practice identifier, shown only on request
    #[serde(default)]
    pub patient_id: Option<String>,
}

impl PatientInfo {
    /// Create a patient with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Name as it should appear on a document.
    pub fn display_name(&self, anonymize: bool) -> String {
        if anonymize {
            ANONYMOUS_NAME.to_string()
        } else {
            display_or_na(&self.name)
        }
    }

    /// Age as display text.
    pub fn display_age(&self) -> String {
        self.age
            .map(|a| a.to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    /// Patient ID when present and non-blank.
    pub fn display_patient_id(&self) -> Option<String> {
        self.patient_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }

    /// Context passed to the vision model. Never includes the name.
    pub fn to_context(&self, language: Option<String>) -> PatientContext {
        PatientContext {
            age: self.age,
            gender: self.gender.clone(),
            complaint: self.complaint.clone(),
            medical_history: self.medical_history.clone(),
            language,
        }
    }
}

/// Trimmed value, or `N/A` when blank.
pub fn display_or_na(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_values_render_na() {
        let patient = PatientInfo::new("  ");
        assert_eq!(patient.display_name(false), "N/A");
        assert_eq!(patient.display_age(), "N/A");
        assert_eq!(display_or_na(&patient.complaint), "N/A");
    }

    #[test]
    fn test_anonymized_name() {
        let patient = PatientInfo::new("Jane Doe");
        assert_eq!(patient.display_name(false), "Jane Doe");
        assert_eq!(patient.display_name(true), "Anonymous");
    }

    #[test]
    fn test_blank_patient_id_is_absent() {
        let mut patient = PatientInfo::new("Jane Doe");
        patient.patient_id = Some(" ".into());
        assert_eq!(patient.display_patient_id(), None);

        patient.patient_id = Some("P-100".into());
        assert_eq!(patient.display_patient_id(), Some("P-100".into()));
    }

    #[test]
    fn test_context_excludes_name() {
        let mut patient = PatientInfo::new("Jane Doe");
        patient.age = Some(34);
        let context = patient.to_context(Some("French".into()));
        let json = serde_json::to_string(&context).unwrap();
        assert!(!json.contains("Jane"));
        assert_eq!(context.age, Some(34));
    }
}
