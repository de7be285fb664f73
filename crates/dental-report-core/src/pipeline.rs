//! End-to-end report pipeline.
//!
//! Pipeline: Images → Preprocess → Vision model → Normalize → Sections → PDF → CRM
//!
//! The CRM step runs only when the session enables auto-export and a
//! practice system is attached with [`ReportPipeline::with_crm`].

use chrono::Local;
use dental_report_llm::{normalize_response, AnalysisError, AnalysisRequest, VisionModel};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{AppConfig, SessionSettings};
use crate::export::{CrmError, CrmReportExport, PracticeSystem, ReportExporter};
use crate::imaging::{DentalImageType, ImagePreprocessor, ProcessedImage};
use crate::models::{PatientInfo, ReportVariant};
use crate::report::{build_document, parse_sections, GeneratedDocument, ReportError, ReportSections};

/// Pipeline errors.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("No usable images ({rejected} rejected)")]
    NoUsableImages { rejected: usize },

    #[error("Analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Report generation failed: {0}")]
    Report(#[from] ReportError),

    #[error("Export failed: {0}")]
    Export(#[from] CrmError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Everything produced for one analysis.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// Normalized model answer
    pub raw_text: String,
    pub sections: ReportSections,
    pub document: GeneratedDocument,
    /// Detected type of each analyzed image
    pub image_types: Vec<DentalImageType>,
    /// Uploads that could not be used
    pub rejected_images: usize,
    /// Record pushed to the CRM, when auto-export ran
    pub export: Option<CrmReportExport>,
}

struct CrmTarget<'a> {
    system: &'a dyn PracticeSystem,
    patient_id: String,
}

/// Runs analyses for one session's settings.
pub struct ReportPipeline<'a, M: VisionModel> {
    model: &'a M,
    settings: &'a SessionSettings,
    preprocessor: ImagePreprocessor,
    crm: Option<CrmTarget<'a>>,
}

impl<'a, M: VisionModel> ReportPipeline<'a, M> {
    pub fn new(model: &'a M, settings: &'a SessionSettings) -> Self {
        Self {
            model,
            settings,
            preprocessor: ImagePreprocessor::default(),
            crm: None,
        }
    }

    /// Pipeline using the size and format limits from the environment.
    pub fn from_config(model: &'a M, settings: &'a SessionSettings, config: &AppConfig) -> Self {
        Self::new(model, settings).with_preprocessor(config.preprocessor())
    }

    /// Use a preprocessor with non-default limits.
    pub fn with_preprocessor(mut self, preprocessor: ImagePreprocessor) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    /// Attach an authenticated practice system for auto-export.
    pub fn with_crm(
        mut self,
        system: &'a dyn PracticeSystem,
        patient_id: impl Into<String>,
    ) -> Self {
        self.crm = Some(CrmTarget {
            system,
            patient_id: patient_id.into(),
        });
        self
    }

    /// Analyze uploaded images and produce the report document.
    ///
    /// Model failures are returned as-is; nothing is retried and no document
    /// is produced.
    pub fn run<B: AsRef<[u8]>>(
        &self,
        images: &[B],
        patient: &PatientInfo,
        variant: ReportVariant,
    ) -> PipelineResult<AnalysisReport> {
        // Step 1: Preprocess uploads
        let batch = self.preprocessor.process_batch(images);
        if batch.images.is_empty() {
            return Err(PipelineError::NoUsableImages {
                rejected: batch.rejected,
            });
        }

        // Step 2: Ask the model
        let request = AnalysisRequest::new(
            &self.settings.patient_context(patient),
            batch.images.iter().map(ProcessedImage::encoded).collect(),
            variant.into(),
            self.settings.model_settings(),
        )?;
        let raw = self.model.analyze(&request)?;

        // Step 3: Parse and lay out
        let raw_text = normalize_response(&raw)?;
        let mut report = self.build(raw_text, patient, variant)?;
        report.image_types = batch.images.iter().map(|i| i.kind).collect();
        report.rejected_images = batch.rejected;
        Ok(report)
    }

    /// Rebuild a document from stored model text without calling the model.
    pub fn regenerate(
        &self,
        raw_text: &str,
        patient: &PatientInfo,
        variant: ReportVariant,
    ) -> PipelineResult<AnalysisReport> {
        self.build(raw_text.to_string(), patient, variant)
    }

    fn build(
        &self,
        raw_text: String,
        patient: &PatientInfo,
        variant: ReportVariant,
    ) -> PipelineResult<AnalysisReport> {
        let sections = parse_sections(&raw_text);
        let document = build_document(
            patient,
            &sections,
            &self.settings.branding(),
            &self.settings.document_options(variant),
            Local::now(),
        )?;

        // Step 4: Auto-export
        let export = match (&self.crm, self.settings.crm.auto_export) {
            (Some(target), true) => {
                let export = ReportExporter::new(target.system).export(
                    &target.patient_id,
                    &sections,
                    &document,
                    None,
                )?;
                info!(
                    vendor = %target.system.vendor(),
                    report_id = %export.metadata.report_id,
                    "report exported"
                );
                Some(export)
            }
            (None, true) => {
                debug!("auto-export enabled but no CRM attached");
                None
            }
            _ => None,
        };

        Ok(AnalysisReport {
            raw_text,
            sections,
            document,
            image_types: Vec::new(),
            rejected_images: 0,
            export,
        })
    }
}
