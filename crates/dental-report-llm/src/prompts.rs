//! Prompts for dental image analysis.
//!
//! The model is asked to answer with `##` headings so the response can be
//! split into report sections without a markdown renderer.

use serde::{Deserialize, Serialize};

use crate::analysis::PatientContext;

/// System prompt for the vision model.
pub const SYSTEM_PROMPT: &str = "You are a highly trained dental professional specialized in diagnostics. \
Analyze dental images carefully, identify issues, and provide detailed findings. \
Your answer is a draft that a licensed dentist will review before any clinical use.";

/// Issues the model is asked to look for.
pub const ISSUE_CHECKLIST: &[&str] = &[
    "Cavities or decay",
    "Periodontal disease",
    "Misalignment",
    "Fractures or cracks",
    "Infections or abscesses",
    "Impacted teeth",
    "Other abnormalities",
];

/// Report flavor the model is asked to write.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ReportStyle {
    /// Concise report for the dentist to review and sign
    #[default]
    Summary,
    /// Full reasoning behind each potential diagnosis
    Detailed,
}

impl ReportStyle {
    /// Section headings requested for this style, in order.
    pub fn section_headings(&self) -> &'static [&'static str] {
        match self {
            ReportStyle::Summary => &[
                "Key Findings",
                "Potential Diagnoses",
                "Recommended Treatment Plan",
            ],
            ReportStyle::Detailed => &[
                "Summary of Findings",
                "Detailed Analysis by Region",
                "Potential Diagnoses and Reasoning",
                "Recommendations for Additional Tests/Imaging",
            ],
        }
    }
}

/// Render the patient block shared by every prompt.
///
/// The patient's name is never sent to the model.
pub fn patient_block(context: &PatientContext) -> String {
    format!(
        "Age: {}\nGender: {}\nPrimary complaint: {}\nMedical history: {}",
        context
            .age
            .map(|a| a.to_string())
            .unwrap_or_else(|| "unknown".to_string()),
        or_unknown(&context.gender),
        or_unknown(&context.complaint),
        or_unknown(&context.medical_history),
    )
}

fn or_unknown(value: &str) -> &str {
    if value.trim().is_empty() {
        "not provided"
    } else {
        value.trim()
    }
}

/// Format instructions for the requested report style.
pub fn format_instructions(style: ReportStyle) -> String {
    let mut out = String::from(
        "Format your answer as markdown. Start every section with a line of the form \
\"## <Section title>\" and use these sections, in this order:\n",
    );
    for (i, heading) in style.section_headings().iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, heading));
    }
    out.push_str("Separate paragraphs with a blank line. Do not add a signature line.");
    out
}

/// User prompt for the analysis request.
pub fn make_analysis_prompt(context: &PatientContext, style: ReportStyle) -> String {
    let mut prompt = String::new();

    prompt.push_str("Analyze these dental images for a patient with the following information:\n");
    prompt.push_str(&patient_block(context));
    prompt.push('\n');

    if let Some(language) = context.language.as_deref().filter(|l| !l.trim().is_empty()) {
        prompt.push_str(&format!("Respond in {}.\n", language.trim()));
    }

    prompt.push_str("\nAs a dental expert, identify any issues with the teeth such as:\n");
    for issue in ISSUE_CHECKLIST {
        prompt.push_str(&format!("- {}\n", issue));
    }

    prompt.push('\n');
    prompt.push_str(&format_instructions(style));

    prompt
}
