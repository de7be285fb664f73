//! Clinic branding models.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Clinic name used when none is configured.
pub const DEFAULT_CLINIC_NAME: &str = "Dental Clinic";

/// Where an image asset comes from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ImageRef {
    /// Image file on local disk
    File(PathBuf),
    /// Encoded image bytes (PNG or JPEG), e.g. an uploaded logo
    Inline(Vec<u8>),
}

/// Clinic-identifying elements placed on generated documents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClinicBranding {
    /// Display name shown as the document title
    pub clinic_name: String,
    /// Logo drawn at the top of the first page
    #[serde(default)]
    pub logo: Option<ImageRef>,
    /// Image drawn behind the content of every page
    #[serde(default)]
    pub watermark: Option<ImageRef>,
    /// Contact email
    #[serde(default)]
    pub email: Option<String>,
    /// Contact phone number
    #[serde(default)]
    pub phone: Option<String>,
    /// Postal address
    #[serde(default)]
    pub address: Option<String>,
    /// Extra footer line set by the clinic
    #[serde(default)]
    pub footer_disclaimer: Option<String>,
}

impl Default for ClinicBranding {
    fn default() -> Self {
        Self {
            clinic_name: DEFAULT_CLINIC_NAME.to_string(),
            logo: None,
            watermark: None,
            email: None,
            phone: None,
            address: None,
            footer_disclaimer: None,
        }
    }
}

impl ClinicBranding {
    /// Create branding with a clinic name.
    pub fn new(clinic_name: impl Into<String>) -> Self {
        Self {
            clinic_name: clinic_name.into(),
            ..Default::default()
        }
    }

    /// Clinic name, falling back to the generic placeholder.
    pub fn display_name(&self) -> &str {
        let name = self.clinic_name.trim();
        if name.is_empty() {
            DEFAULT_CLINIC_NAME
        } else {
            name
        }
    }

    /// Email and phone joined by a separator; `None` when both are blank.
    pub fn contact_line(&self) -> Option<String> {
        let parts: Vec<&str> = [self.email.as_deref(), self.phone.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" | "))
        }
    }

    /// Address line when non-blank.
    pub fn address_line(&self) -> Option<&str> {
        non_blank(self.address.as_deref())
    }

    /// Clinic footer line when non-blank.
    pub fn footer_line(&self) -> Option<&str> {
        non_blank(self.footer_disclaimer.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_name() {
        assert_eq!(ClinicBranding::default().display_name(), "Dental Clinic");
        assert_eq!(ClinicBranding::new("  ").display_name(), "Dental Clinic");
        assert_eq!(ClinicBranding::new("Smile Co").display_name(), "Smile Co");
    }

    #[test]
    fn test_contact_line() {
        let mut branding = ClinicBranding::default();
        assert_eq!(branding.contact_line(), None);

        branding.email = Some("front@smile.example".into());
        assert_eq!(branding.contact_line().as_deref(), Some("front@smile.example"));

        branding.phone = Some("555-0100".into());
        assert_eq!(
            branding.contact_line().as_deref(),
            Some("front@smile.example | 555-0100")
        );

        branding.email = Some("".into());
        assert_eq!(branding.contact_line().as_deref(), Some("555-0100"));
    }

    #[test]
    fn test_image_ref_json() {
        let branding = ClinicBranding {
            logo: Some(ImageRef::File("logo.png".into())),
            ..Default::default()
        };
        let json = serde_json::to_string(&branding).unwrap();
        assert!(json.contains(r#""file":"logo.png""#));
        let back: ClinicBranding = serde_json::from_str(&json).unwrap();
        assert_eq!(back, branding);
    }
}
