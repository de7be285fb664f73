//! Report generation: section parsing, layout and PDF rendering.

pub mod assets;
pub mod layout;
pub mod render;
pub mod sections;
pub mod text;

pub use assets::{load_image, ReportAssets};
pub use layout::{assemble, Element, ImageSlot, PageLayout, ReportLayout, TextRole};
pub use render::render_pdf;
pub use sections::{parse_sections, paragraphs, ReportSection, ReportSections, DEFAULT_SECTION};

use chrono::{DateTime, Local};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ClinicBranding, DocumentOptions, PatientInfo, ReportVariant};

/// Notice printed in the footer of every page.
pub const REGULATORY_DISCLAIMER: &str = "AI-GENERATED REPORT: This report was generated with artificial intelligence and should be reviewed by a qualified dental professional before use in diagnosis or treatment.";

/// Closing paragraph of detailed reports.
pub const DETAILED_DISCLAIMER: &str = "DISCLAIMER: This detailed report provides the AI system's reasoning and analysis. All findings should be independently verified by a qualified dental professional.";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("PDF rendering failed: {0}")]
    Render(String),
}

pub type ReportResult<T> = Result<T, ReportError>;

/// A finished PDF document.
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    bytes: Vec<u8>,
    pub variant: ReportVariant,
    pub generated_at: DateTime<Local>,
    pub page_count: usize,
    pub report_id: Uuid,
}

impl GeneratedDocument {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Hex SHA-256 of the PDF bytes.
    pub fn sha256(&self) -> String {
        hex::encode(Sha256::digest(&self.bytes))
    }

    /// Suggested file name, e.g. `dental_summary_2024-03-05_09-30-00.pdf`.
    pub fn file_name(&self) -> String {
        format!(
            "dental_{}_{}.pdf",
            self.variant.as_str(),
            self.generated_at.format("%Y-%m-%d_%H-%M-%S")
        )
    }
}

/// Parse raw model text and render it as a PDF document.
pub fn generate_document(
    patient: &PatientInfo,
    raw_text: &str,
    branding: &ClinicBranding,
    options: &DocumentOptions,
) -> ReportResult<GeneratedDocument> {
    generate_document_at(patient, raw_text, branding, options, Local::now())
}

/// [`generate_document`] with a fixed generation time.
pub fn generate_document_at(
    patient: &PatientInfo,
    raw_text: &str,
    branding: &ClinicBranding,
    options: &DocumentOptions,
    generated_at: DateTime<Local>,
) -> ReportResult<GeneratedDocument> {
    let sections = parse_sections(raw_text);
    build_document(patient, &sections, branding, options, generated_at)
}

/// Render already-parsed sections.
pub fn build_document(
    patient: &PatientInfo,
    sections: &ReportSections,
    branding: &ClinicBranding,
    options: &DocumentOptions,
    generated_at: DateTime<Local>,
) -> ReportResult<GeneratedDocument> {
    let assets = ReportAssets::load(branding);
    let layout = assemble(patient, sections, branding, options, &assets, generated_at);
    let bytes = render_pdf(&layout, &assets)?;

    let document = GeneratedDocument {
        bytes,
        variant: options.variant,
        generated_at,
        page_count: layout.page_count(),
        report_id: Uuid::new_v4(),
    };

    tracing::info!(
        report_id = %document.report_id,
        variant = %document.variant,
        pages = document.page_count,
        "generated report document"
    );

    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_file_name() {
        let generated_at = Local.with_ymd_and_hms(2024, 3, 5, 9, 30, 0).unwrap();
        let document = generate_document_at(
            &PatientInfo::new("Jane Doe"),
            "## Findings\nok",
            &ClinicBranding::default(),
            &DocumentOptions::for_variant(ReportVariant::Detailed),
            generated_at,
        )
        .unwrap();

        assert_eq!(document.file_name(), "dental_detailed_2024-03-05_09-30-00.pdf");
        assert_eq!(document.page_count, 1);
        assert_eq!(document.sha256().len(), 64);
        assert!(document.bytes().starts_with(b"%PDF"));
    }

    #[test]
    fn test_missing_logo_does_not_fail() {
        let branding = ClinicBranding {
            logo: Some(crate::models::ImageRef::File("/nonexistent/logo.png".into())),
            ..Default::default()
        };
        let document = generate_document(
            &PatientInfo::new("Jane Doe"),
            "text",
            &branding,
            &DocumentOptions::default(),
        );
        assert!(document.is_ok());
    }
}
