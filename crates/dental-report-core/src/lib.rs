//! Dental Report Core Library
//!
//! Turns a vision model's analysis of dental images into a branded,
//! paginated PDF report.
//!
//! # Architecture
//!
//! ```text
//! Uploads → Validate → Classify → Enhance ──► Vision Model (VisionModel trait)
//!                                                     │
//!                                             raw analysis text
//!                                                     │
//!                                              Section Parser
//!                                                     │
//!                                     ┌───────────────▼───────────────┐
//!                                     │       Document Assembler      │
//!                                     │  header · patient · findings  │
//!                                     │  variant tail · page footers  │
//!                                     └───────────────┬───────────────┘
//!                                                     │
//!                                 ┌───────────────────┼───────────────────┐
//!                                 │                   │                   │
//!                                 ▼                   ▼                   ▼
//!                             PDF bytes          CRM export          Regenerate
//!                           (download)      (Dentrix, Eaglesoft,   (from stored
//!                                              Open Dental)            text)
//! ```
//!
//! # Core Principle
//!
//! **Every page says the report is AI-generated.** The regulatory disclaimer
//! is part of the page footer and cannot be replaced by clinic branding.
//!
//! # Modules
//!
//! - [`models`]: Domain types (PatientInfo, ClinicBranding, DocumentOptions)
//! - [`report`]: Section parser, layout and PDF rendering
//! - [`imaging`]: Image validation, classification and enhancement
//! - [`pipeline`]: Images → model → document
//! - [`config`]: Environment config and per-session settings
//! - [`export`]: CRM clients and report export

pub mod config;
pub mod export;
pub mod imaging;
pub mod models;
pub mod pipeline;
pub mod report;

// Re-export commonly used types
pub use config::{AppConfig, SessionSettings};
pub use imaging::{DentalImageType, ImagePreprocessor};
pub use models::{ClinicBranding, DocumentOptions, ImageRef, PageSize, PatientInfo, ReportVariant};
pub use pipeline::{AnalysisReport, ReportPipeline};
pub use report::{
    generate_document, parse_sections, GeneratedDocument, ReportSection, ReportSections,
    REGULATORY_DISCLAIMER,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::Arc;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum DentalReportError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Analysis error: {0}")]
    Analysis(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("CRM error: {0}")]
    Crm(String),
}

impl From<report::ReportError> for DentalReportError {
    fn from(e: report::ReportError) -> Self {
        DentalReportError::Render(e.to_string())
    }
}

impl From<dental_report_llm::AnalysisError> for DentalReportError {
    fn from(e: dental_report_llm::AnalysisError) -> Self {
        DentalReportError::Analysis(e.to_string())
    }
}

impl From<imaging::ImagingError> for DentalReportError {
    fn from(e: imaging::ImagingError) -> Self {
        DentalReportError::InvalidInput(e.to_string())
    }
}

impl From<pipeline::PipelineError> for DentalReportError {
    fn from(e: pipeline::PipelineError) -> Self {
        match e {
            pipeline::PipelineError::NoUsableImages { .. } => {
                DentalReportError::InvalidInput(e.to_string())
            }
            pipeline::PipelineError::Analysis(e) => e.into(),
            pipeline::PipelineError::Report(e) => e.into(),
            pipeline::PipelineError::Export(e) => e.into(),
        }
    }
}

impl From<config::ConfigError> for DentalReportError {
    fn from(e: config::ConfigError) -> Self {
        match e {
            config::ConfigError::Json(e) => e.into(),
            other => DentalReportError::InvalidInput(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for DentalReportError {
    fn from(e: serde_json::Error) -> Self {
        DentalReportError::Serialization(e.to_string())
    }
}

impl From<export::CrmError> for DentalReportError {
    fn from(e: export::CrmError) -> Self {
        DentalReportError::Crm(e.to_string())
    }
}

// =========================================================================
// Functions (exported to FFI)
// =========================================================================

/// Split raw analysis text into titled sections.
#[uniffi::export]
pub fn parse_report_sections(raw_text: String) -> Vec<FfiReportSection> {
    parse_sections(&raw_text)
        .into_vec()
        .into_iter()
        .map(Into::into)
        .collect()
}

/// Render a PDF report from raw analysis text.
#[uniffi::export]
pub fn generate_report_pdf(
    patient: FfiPatientInfo,
    raw_text: String,
    branding: FfiClinicBranding,
    options: FfiDocumentOptions,
) -> Result<FfiGeneratedDocument, DentalReportError> {
    let document = generate_document(&patient.into(), &raw_text, &branding.into(), &options.into())?;
    Ok(document.into())
}

/// Open a session from settings JSON. An empty string uses defaults.
#[uniffi::export]
pub fn open_session(settings_json: String) -> Result<Arc<ReportSession>, DentalReportError> {
    let settings = if settings_json.trim().is_empty() {
        SessionSettings::default()
    } else {
        SessionSettings::from_json(&settings_json)?
    };
    Ok(Arc::new(ReportSession { settings }))
}

// =========================================================================
// Session Object
// =========================================================================

/// One user's settings. Immutable once opened.
#[derive(uniffi::Object)]
pub struct ReportSession {
    settings: SessionSettings,
}

#[uniffi::export]
impl ReportSession {
    /// Render a report using this session's branding and options.
    pub fn generate_report(
        &self,
        patient: FfiPatientInfo,
        raw_text: String,
        variant: FfiReportVariant,
    ) -> Result<FfiGeneratedDocument, DentalReportError> {
        let document = generate_document(
            &patient.into(),
            &raw_text,
            &self.settings.branding(),
            &self.settings.document_options(variant.into()),
        )?;
        Ok(document.into())
    }

    /// Split raw analysis text into titled sections.
    pub fn parse_sections(&self, raw_text: String) -> Vec<FfiReportSection> {
        parse_report_sections(raw_text)
    }

    /// Current settings as JSON, without the CRM password.
    pub fn settings_json(&self) -> Result<String, DentalReportError> {
        Ok(self.settings.redacted().to_json()?)
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe patient details.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientInfo {
    pub name: String,
    pub age: Option<u32>,
    pub gender: String,
    pub complaint: String,
    pub medical_history: String,
    pub patient_id: Option<String>,
}

impl From<FfiPatientInfo> for PatientInfo {
    fn from(patient: FfiPatientInfo) -> Self {
        PatientInfo {
            name: patient.name,
            age: patient.age,
            gender: patient.gender,
            complaint: patient.complaint,
            medical_history: patient.medical_history,
            patient_id: patient.patient_id,
        }
    }
}

/// FFI-safe clinic branding. Inline logo bytes win over a logo path.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiClinicBranding {
    pub clinic_name: String,
    pub logo_path: Option<String>,
    pub logo_bytes: Option<Vec<u8>>,
    pub watermark_path: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub footer_disclaimer: Option<String>,
}

impl From<FfiClinicBranding> for ClinicBranding {
    fn from(branding: FfiClinicBranding) -> Self {
        let logo = match (branding.logo_bytes, branding.logo_path) {
            (Some(bytes), _) => Some(ImageRef::Inline(bytes)),
            (None, Some(path)) => Some(ImageRef::File(path.into())),
            (None, None) => None,
        };

        ClinicBranding {
            clinic_name: branding.clinic_name,
            logo,
            watermark: branding.watermark_path.map(|p| ImageRef::File(p.into())),
            email: branding.email,
            phone: branding.phone,
            address: branding.address,
            footer_disclaimer: branding.footer_disclaimer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiReportVariant {
    Summary,
    Detailed,
}

impl From<FfiReportVariant> for ReportVariant {
    fn from(variant: FfiReportVariant) -> Self {
        match variant {
            FfiReportVariant::Summary => ReportVariant::Summary,
            FfiReportVariant::Detailed => ReportVariant::Detailed,
        }
    }
}

impl From<ReportVariant> for FfiReportVariant {
    fn from(variant: ReportVariant) -> Self {
        match variant {
            ReportVariant::Summary => FfiReportVariant::Summary,
            ReportVariant::Detailed => FfiReportVariant::Detailed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiPageSize {
    Letter,
    A4,
}

/// FFI-safe document options.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDocumentOptions {
    pub include_signature_block: bool,
    pub show_patient_id: bool,
    pub variant: FfiReportVariant,
    pub anonymize: bool,
    pub page_size: FfiPageSize,
}

impl From<FfiDocumentOptions> for DocumentOptions {
    fn from(options: FfiDocumentOptions) -> Self {
        DocumentOptions {
            include_signature_block: options.include_signature_block,
            show_patient_id: options.show_patient_id,
            variant: options.variant.into(),
            anonymize: options.anonymize,
            page_size: match options.page_size {
                FfiPageSize::Letter => PageSize::Letter,
                FfiPageSize::A4 => PageSize::A4,
            },
        }
    }
}

/// FFI-safe report section.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiReportSection {
    pub title: String,
    pub body: String,
}

impl From<ReportSection> for FfiReportSection {
    fn from(section: ReportSection) -> Self {
        Self {
            title: section.title,
            body: section.body,
        }
    }
}

/// FFI-safe generated document.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiGeneratedDocument {
    pub report_id: String,
    pub file_name: String,
    pub sha256: String,
    pub page_count: u32,
    pub variant: FfiReportVariant,
    pub generated_at: String,
    pub pdf: Vec<u8>,
}

impl From<GeneratedDocument> for FfiGeneratedDocument {
    fn from(document: GeneratedDocument) -> Self {
        Self {
            report_id: document.report_id.to_string(),
            file_name: document.file_name(),
            sha256: document.sha256(),
            page_count: document.page_count as u32,
            variant: document.variant.into(),
            generated_at: document.generated_at.to_rfc3339(),
            pdf: document.into_bytes(),
        }
    }
}
