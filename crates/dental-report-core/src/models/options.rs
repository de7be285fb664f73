//! Document layout options.

use std::fmt;
use std::str::FromStr;

use dental_report_llm::ReportStyle;
use serde::{Deserialize, Serialize};

/// Document flavor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportVariant {
    /// Concise report with a sign-off block
    #[default]
    Summary,
    /// Full reasoning with a verification disclaimer
    Detailed,
}

impl ReportVariant {
    /// Title line printed under the header.
    pub fn title(&self) -> &'static str {
        match self {
            ReportVariant::Summary => "Dental AI Analysis - Summary Report",
            ReportVariant::Detailed => "Dental AI Analysis - Detailed Report",
        }
    }

    /// Lowercase name used in file names and exports.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportVariant::Summary => "summary",
            ReportVariant::Detailed => "detailed",
        }
    }
}

impl fmt::Display for ReportVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "summary" => Ok(ReportVariant::Summary),
            "detailed" => Ok(ReportVariant::Detailed),
            other => Err(format!("unknown report variant: {}", other)),
        }
    }
}

impl From<ReportVariant> for ReportStyle {
    fn from(variant: ReportVariant) -> Self {
        match variant {
            ReportVariant::Summary => ReportStyle::Summary,
            ReportVariant::Detailed => ReportStyle::Detailed,
        }
    }
}

/// Paper size.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    #[default]
    Letter,
    A4,
}

impl PageSize {
    /// Width and height in millimetres.
    pub fn dimensions_mm(&self) -> (f32, f32) {
        match self {
            PageSize::Letter => (215.9, 279.4),
            PageSize::A4 => (210.0, 297.0),
        }
    }
}

/// Options controlling what the assembler lays out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DocumentOptions {
    /// Render the approval/signature block (summary variant only)
    pub include_signature_block: bool,
    /// Add a Patient ID row when an identifier is present
    pub show_patient_id: bool,
    /// Document flavor
    pub variant: ReportVariant,
    /// Replace the patient's name with a placeholder and hide the ID
    pub anonymize: bool,
    /// Paper size
    pub page_size: PageSize,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            include_signature_block: true,
            show_patient_id: false,
            variant: ReportVariant::Summary,
            anonymize: false,
            page_size: PageSize::Letter,
        }
    }
}

impl DocumentOptions {
    /// Default options for a variant.
    pub fn for_variant(variant: ReportVariant) -> Self {
        Self {
            variant,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = DocumentOptions::default();
        assert!(options.include_signature_block);
        assert!(!options.show_patient_id);
        assert_eq!(options.variant, ReportVariant::Summary);
    }

    #[test]
    fn test_variant_parse() {
        assert_eq!("Detailed".parse::<ReportVariant>(), Ok(ReportVariant::Detailed));
        assert_eq!(" summary ".parse::<ReportVariant>(), Ok(ReportVariant::Summary));
        assert!("brief".parse::<ReportVariant>().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let options: DocumentOptions = serde_json::from_str(r#"{"variant":"detailed"}"#).unwrap();
        assert_eq!(options.variant, ReportVariant::Detailed);
        assert!(options.include_signature_block);
    }
}
