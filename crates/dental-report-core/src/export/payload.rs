//! Report payload pushed to practice-management systems.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::crm::{CrmResult, PracticeSystem};
use crate::report::{GeneratedDocument, ReportSection, ReportSections};

/// Export for a single generated report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CrmReportExport {
    /// Export metadata
    pub metadata: ExportMetadata,
    /// Report sections in document order
    pub sections: Vec<ReportSection>,
}

/// Report export metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportMetadata {
    pub report_id: String,
    /// `summary` or `detailed`
    pub variant: String,
    pub generated_at: String,
    pub exported_at: String,
    pub page_count: usize,
    /// SHA-256 of the PDF, for matching the attachment to this record
    pub document_sha256: String,
    /// Clinician who signed off, if known
    pub reviewed_by: Option<String>,
}

impl CrmReportExport {
    pub fn new(
        sections: &ReportSections,
        document: &GeneratedDocument,
        reviewed_by: Option<&str>,
    ) -> Self {
        Self {
            metadata: ExportMetadata {
                report_id: document.report_id.to_string(),
                variant: document.variant.as_str().to_string(),
                generated_at: document.generated_at.to_rfc3339(),
                exported_at: Utc::now().to_rfc3339(),
                page_count: document.page_count,
                document_sha256: document.sha256(),
                reviewed_by: reviewed_by.map(str::to_string),
            },
            sections: sections.iter().cloned().collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Pushes reports and their PDFs to a practice-management system.
pub struct ReportExporter<'a> {
    system: &'a dyn PracticeSystem,
}

impl<'a> ReportExporter<'a> {
    pub fn new(system: &'a dyn PracticeSystem) -> Self {
        Self { system }
    }

    /// Save the report record, then attach the PDF.
    pub fn export(
        &self,
        patient_id: &str,
        sections: &ReportSections,
        document: &GeneratedDocument,
        reviewed_by: Option<&str>,
    ) -> CrmResult<CrmReportExport> {
        let export = CrmReportExport::new(sections, document, reviewed_by);

        self.system.save_report(patient_id, &export)?;
        self.system.upload_attachment(
            patient_id,
            document.bytes(),
            &document.file_name(),
            "application/pdf",
        )?;

        tracing::info!(
            vendor = %self.system.vendor(),
            report_id = %export.metadata.report_id,
            "exported report to crm"
        );
        Ok(export)
    }
}
