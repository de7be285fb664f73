//! Analysis requests, the model trait and response handling.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::prompts::{make_analysis_prompt, ReportStyle, SYSTEM_PROMPT};

/// Analysis errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("No images were supplied for analysis")]
    NoImages,

    #[error("Model inference error: {0}")]
    Inference(String),

    #[error("Model returned an empty response")]
    EmptyResponse,
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Patient details shared with the model.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PatientContext {
    pub age: Option<u32>,
    pub gender: String,
    pub complaint: String,
    pub medical_history: String,
    /// Language the answer should be written in
    pub language: Option<String>,
}

/// An image ready to be embedded in a model request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EncodedImage {
    pub mime: String,
    /// Base64 payload (standard alphabet, padded)
    pub data: String,
}

impl EncodedImage {
    /// Encode JPEG bytes.
    pub fn jpeg(bytes: &[u8]) -> Self {
        Self {
            mime: "image/jpeg".to_string(),
            data: STANDARD.encode(bytes),
        }
    }

    /// Data URL accepted by vision chat APIs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.data)
    }
}

/// Sampling settings for the model call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: 0.4,
            max_tokens: 1000,
        }
    }
}

/// A fully built request for the vision model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub images: Vec<EncodedImage>,
    pub settings: ModelSettings,
    pub style: ReportStyle,
}

impl AnalysisRequest {
    /// Build a request from patient context and encoded images.
    pub fn new(
        context: &PatientContext,
        images: Vec<EncodedImage>,
        style: ReportStyle,
        settings: ModelSettings,
    ) -> AnalysisResult<Self> {
        if images.is_empty() {
            return Err(AnalysisError::NoImages);
        }

        Ok(Self {
            system_prompt: SYSTEM_PROMPT.to_string(),
            user_prompt: make_analysis_prompt(context, style),
            images,
            settings,
            style,
        })
    }
}

/// A vision-capable model that turns images and patient context into text.
///
/// Implementations report failures through [`AnalysisError`]; callers decide
/// whether to retry.
pub trait VisionModel {
    fn analyze(&self, request: &AnalysisRequest) -> AnalysisResult<String>;
}

impl<M: VisionModel + ?Sized> VisionModel for &M {
    fn analyze(&self, request: &AnalysisRequest) -> AnalysisResult<String> {
        (**self).analyze(request)
    }
}

/// Clean a raw model answer before section parsing.
///
/// Normalizes line endings, unwraps a surrounding code fence and trims.
pub fn normalize_response(raw: &str) -> AnalysisResult<String> {
    let text = raw.replace("\r\n", "\n");
    let mut text = text.trim();

    // Some models wrap the whole answer in ```markdown ... ```
    if let Some(rest) = text.strip_prefix("```") {
        let rest = match rest.find('\n') {
            Some(pos) => &rest[pos + 1..],
            None => "",
        };
        text = rest.strip_suffix("```").unwrap_or(rest).trim();
    }

    if text.is_empty() {
        tracing::warn!("model returned an empty response");
        return Err(AnalysisError::EmptyResponse);
    }

    tracing::debug!(chars = text.len(), "normalized model response");
    Ok(text.to_string())
}

/// Mock model for testing without a real inference backend.
#[derive(Debug, Clone, Default)]
pub struct MockVisionModel {
    failure: Option<String>,
}

impl MockVisionModel {
    /// Mock that answers every request.
    pub fn new() -> Self {
        Self { failure: None }
    }

    /// Mock that fails every request with the given reason.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
        }
    }

    /// Canned answer built from the requested headings.
    pub fn respond(request: &AnalysisRequest) -> String {
        let headings = request.style.section_headings();
        let mut out = String::new();

        for (i, heading) in headings.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&format!("## {}\n", heading));
            match i {
                0 => out.push_str(&format!(
                    "Reviewed {} image(s). Possible cavity in lower left molar.\n",
                    request.images.len()
                )),
                1 => out.push_str("Early enamel caries.\n\nNo periapical lesion visible.\n"),
                _ => out.push_str("Follow-up X-ray advised.\n"),
            }
        }

        out
    }
}

impl VisionModel for MockVisionModel {
    fn analyze(&self, request: &AnalysisRequest) -> AnalysisResult<String> {
        if let Some(reason) = &self.failure {
            return Err(AnalysisError::Inference(reason.clone()));
        }
        if request.images.is_empty() {
            return Err(AnalysisError::NoImages);
        }
        Ok(Self::respond(request))
    }
}
