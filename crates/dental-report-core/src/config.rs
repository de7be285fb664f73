//! Application and per-session configuration.
//!
//! [`AppConfig`] is resolved once at startup from the environment (with
//! `.env` support). [`SessionSettings`] holds one user's preferences and is
//! passed explicitly to every operation that needs it.

use std::fmt;
use std::path::Path;

use dental_report_llm::{ModelSettings, PatientContext};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::export::CrmCredentials;
use crate::imaging::ImagePreprocessor;
use crate::models::{
    ClinicBranding, DocumentOptions, ImageRef, PageSize, PatientInfo, ReportVariant,
    DEFAULT_CLINIC_NAME,
};

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// Process-wide settings from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Default vision model for new sessions
    pub vision_model: String,
    pub debug: bool,
    /// CRM kind name, `none` when no CRM is configured
    pub default_crm: String,
    pub crm_api_endpoint: Option<String>,
    pub crm_username: Option<String>,
    pub crm_password: Option<String>,
    pub max_image_size: (u32, u32),
    pub supported_formats: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            vision_model: "gpt-4o".to_string(),
            debug: false,
            default_crm: "none".to_string(),
            crm_api_endpoint: None,
            crm_username: None,
            crm_password: None,
            max_image_size: (1024, 1024),
            supported_formats: vec!["jpg".into(), "jpeg".into(), "png".into()],
        }
    }
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let max_image_size = match get("MAX_IMAGE_SIZE") {
            Some(raw) => parse_size(&raw).ok_or_else(|| invalid("MAX_IMAGE_SIZE", &raw))?,
            None => defaults.max_image_size,
        };

        let supported_formats = match get("SUPPORTED_FORMATS") {
            Some(raw) => {
                let formats: Vec<String> = raw
                    .split(',')
                    .map(|f| f.trim().to_lowercase())
                    .filter(|f| !f.is_empty())
                    .collect();
                if formats.is_empty() {
                    return Err(invalid("SUPPORTED_FORMATS", &raw));
                }
                formats
            }
            None => defaults.supported_formats,
        };

        Ok(Self {
            vision_model: get("VISION_MODEL").unwrap_or(defaults.vision_model),
            debug: get("DEBUG").is_some_and(|v| v.eq_ignore_ascii_case("true")),
            default_crm: get("DEFAULT_CRM")
                .map(|v| v.to_lowercase())
                .unwrap_or(defaults.default_crm),
            crm_api_endpoint: get("CRM_API_ENDPOINT"),
            crm_username: get("CRM_USERNAME"),
            crm_password: get("CRM_PASSWORD"),
            max_image_size,
            supported_formats,
        })
    }

    /// Image preprocessor using the configured limits.
    pub fn preprocessor(&self) -> ImagePreprocessor {
        ImagePreprocessor::new(self.max_image_size, self.supported_formats.clone())
    }
}

fn parse_size(raw: &str) -> Option<(u32, u32)> {
    let (width, height) = raw.split_once(',')?;
    let width: u32 = width.trim().parse().ok()?;
    let height: u32 = height.trim().parse().ok()?;
    (width > 0 && height > 0).then_some((width, height))
}

// =========================================================================
// Session settings
// =========================================================================

/// Clinic profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProfileSettings {
    pub clinic_name: String,
    pub email: String,
    pub contact: String,
    pub address: String,
    pub logo: Option<ImageRef>,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            clinic_name: DEFAULT_CLINIC_NAME.to_string(),
            email: String::new(),
            contact: String::new(),
            address: String::new(),
            logo: None,
        }
    }
}

/// Document customization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReportSettings {
    /// Extra footer line on every page
    pub footer: String,
    pub watermark: Option<ImageRef>,
    pub show_patient_id: bool,
    pub include_signature_block: bool,
    pub page_size: PageSize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            footer: String::new(),
            watermark: None,
            show_patient_id: false,
            include_signature_block: true,
            page_size: PageSize::Letter,
        }
    }
}

/// Data handling preferences.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PrivacySettings {
    /// Hide the patient's name and ID on documents
    pub anonymize: bool,
}

/// Practice-management system connection.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CrmSettings {
    /// Vendor name, `none` to disable
    pub kind: String,
    pub endpoint: String,
    pub username: String,
    pub password: String,
    /// Push every generated report to the CRM
    pub auto_export: bool,
}

impl fmt::Debug for CrmSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrmSettings")
            .field("kind", &self.kind)
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("auto_export", &self.auto_export)
            .finish()
    }
}

impl Default for CrmSettings {
    fn default() -> Self {
        Self {
            kind: "none".to_string(),
            endpoint: String::new(),
            username: String::new(),
            password: String::new(),
            auto_export: false,
        }
    }
}

/// One user's settings for a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionSettings {
    pub profile: ProfileSettings,
    pub report: ReportSettings,
    /// Language the analysis is written in
    pub language: String,
    pub privacy: PrivacySettings,
    pub crm: CrmSettings,
    pub ai: ModelSettings,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            profile: ProfileSettings::default(),
            report: ReportSettings::default(),
            language: "English".to_string(),
            privacy: PrivacySettings::default(),
            crm: CrmSettings::default(),
            ai: ModelSettings::default(),
        }
    }
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl SessionSettings {
    /// Read settings from a JSON file. Missing fields take defaults.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write settings as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Session defaults seeded from the environment.
    pub fn from_app_config(config: &AppConfig) -> Self {
        let mut settings = Self::default();
        settings.ai.model = config.vision_model.clone();
        settings.crm = CrmSettings {
            kind: config.default_crm.clone(),
            endpoint: config.crm_api_endpoint.clone().unwrap_or_default(),
            username: config.crm_username.clone().unwrap_or_default(),
            password: config.crm_password.clone().unwrap_or_default(),
            auto_export: false,
        };
        settings
    }

    pub fn branding(&self) -> ClinicBranding {
        ClinicBranding {
            clinic_name: self.profile.clinic_name.clone(),
            logo: self.profile.logo.clone(),
            watermark: self.report.watermark.clone(),
            email: optional(&self.profile.email),
            phone: optional(&self.profile.contact),
            address: optional(&self.profile.address),
            footer_disclaimer: optional(&self.report.footer),
        }
    }

    pub fn document_options(&self, variant: ReportVariant) -> DocumentOptions {
        DocumentOptions {
            include_signature_block: self.report.include_signature_block,
            show_patient_id: self.report.show_patient_id,
            variant,
            anonymize: self.privacy.anonymize,
            page_size: self.report.page_size,
        }
    }

    pub fn model_settings(&self) -> ModelSettings {
        self.ai.clone()
    }

    /// Model context for a patient. English needs no language instruction.
    pub fn patient_context(&self, patient: &PatientInfo) -> PatientContext {
        let language = optional(&self.language).filter(|l| !l.eq_ignore_ascii_case("english"));
        patient.to_context(language)
    }

    /// Copy without the CRM password, for handing back to callers.
    pub fn redacted(&self) -> Self {
        let mut settings = self.clone();
        settings.crm.password.clear();
        settings
    }

    pub fn crm_credentials(&self) -> CrmCredentials {
        CrmCredentials {
            endpoint: self.crm.endpoint.trim().trim_end_matches('/').to_string(),
            username: self.crm.username.clone(),
            password: self.crm.password.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.default_crm, "none");
        assert!(!config.debug);
    }

    #[test]
    fn test_app_config_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DEBUG", "TRUE"),
            ("MAX_IMAGE_SIZE", "800, 600"),
            ("SUPPORTED_FORMATS", "PNG, tif ,"),
            ("DEFAULT_CRM", "Dentrix"),
            ("CRM_USERNAME", "  "),
        ]))
        .unwrap();
        assert!(config.debug);
        assert_eq!(config.max_image_size, (800, 600));
        assert_eq!(config.supported_formats, vec!["png", "tif"]);
        assert_eq!(config.default_crm, "dentrix");
        assert_eq!(config.crm_username, None);
        assert_eq!(config.preprocessor().max_size(), (800, 600));
    }

    #[test]
    fn test_app_config_invalid_size() {
        let err = AppConfig::from_lookup(lookup(&[("MAX_IMAGE_SIZE", "big")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "MAX_IMAGE_SIZE"));
        assert!(AppConfig::from_lookup(lookup(&[("MAX_IMAGE_SIZE", "0,10")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("SUPPORTED_FORMATS", " , ")])).is_err());
    }

    #[test]
    fn test_settings_round_trip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut settings = SessionSettings::default();
        settings.profile.clinic_name = "Smile Co".into();
        settings.privacy.anonymize = true;
        settings.save(&path).unwrap();

        assert_eq!(SessionSettings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_partial_settings_json() {
        let settings = SessionSettings::from_json(r#"{"profile":{"email":"a@b.example"}}"#).unwrap();
        assert_eq!(settings.profile.clinic_name, "Dental Clinic");
        assert!(settings.report.include_signature_block);
        assert_eq!(settings.ai.model, "gpt-4o");
    }

    #[test]
    fn test_branding_and_options() {
        let mut settings = SessionSettings::default();
        settings.profile.email = "front@smile.example".into();
        settings.profile.contact = " ".into();
        settings.report.footer = "Licensed practice".into();
        settings.privacy.anonymize = true;

        let branding = settings.branding();
        assert_eq!(branding.contact_line().as_deref(), Some("front@smile.example"));
        assert_eq!(branding.footer_line(), Some("Licensed practice"));

        let options = settings.document_options(ReportVariant::Detailed);
        assert!(options.anonymize);
        assert_eq!(options.variant, ReportVariant::Detailed);
    }

    #[test]
    fn test_patient_context_language() {
        let mut settings = SessionSettings::default();
        let patient = PatientInfo::new("Jane Doe");
        assert_eq!(settings.patient_context(&patient).language, None);

        settings.language = "French".into();
        assert_eq!(settings.patient_context(&patient).language.as_deref(), Some("French"));
    }

    #[test]
    fn test_from_app_config() {
        let config = AppConfig {
            default_crm: "eaglesoft".into(),
            crm_api_endpoint: Some("https://crm.example/api/".into()),
            vision_model: "gpt-4o-mini".into(),
            ..Default::default()
        };
        let settings = SessionSettings::from_app_config(&config);
        assert_eq!(settings.crm.kind, "eaglesoft");
        assert_eq!(settings.ai.model, "gpt-4o-mini");
        assert_eq!(settings.crm_credentials().endpoint, "https://crm.example/api");
    }

    #[test]
    fn test_crm_password_redacted() {
        let mut settings = SessionSettings::default();
        settings.crm.password = "s3cret".into();

        assert!(!format!("{:?}", settings).contains("s3cret"));
        assert!(!settings.redacted().to_json().unwrap().contains("s3cret"));
        assert_eq!(settings.crm_credentials().password, "s3cret");
    }
}
