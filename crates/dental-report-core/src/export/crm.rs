//! Practice-management system interface and factory.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::payload::CrmReportExport;
use super::transport::CrmTransport;
use super::vendors::{CrmVendor, VendorClient};

/// CRM errors.
#[derive(Error, Debug)]
pub enum CrmError {
    #[error("Unsupported CRM vendor: {0}")]
    UnsupportedVendor(String),

    #[error("Missing CRM configuration: {0}")]
    MissingConfig(&'static str),

    #[error("Invalid CRM endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Not authenticated with {0}")]
    NotAuthenticated(CrmVendor),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("CRM returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid CRM response: {0}")]
    InvalidResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type CrmResult<T> = Result<T, CrmError>;

/// Connection details for a CRM account.
#[derive(Clone, Default, PartialEq)]
pub struct CrmCredentials {
    /// Base URL without trailing slash
    pub endpoint: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for CrmCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrmCredentials")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A patient record as the CRM reports it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CrmPatient {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub date_of_birth: Option<String>,
}

/// Operations every supported practice-management system offers.
pub trait PracticeSystem {
    fn vendor(&self) -> CrmVendor;

    /// Obtain credentials for later calls.
    fn authenticate(&mut self) -> CrmResult<()>;

    fn is_authenticated(&self) -> bool;

    fn get_patient(&self, patient_id: &str) -> CrmResult<CrmPatient>;

    fn save_report(&self, patient_id: &str, report: &CrmReportExport) -> CrmResult<()>;

    /// All patients, or those whose name resembles `query`, best match first.
    fn list_patients(&self, query: Option<&str>) -> CrmResult<Vec<CrmPatient>>;

    fn upload_attachment(
        &self,
        patient_id: &str,
        data: &[u8],
        file_name: &str,
        mime: &str,
    ) -> CrmResult<()>;
}

/// Build a client for a configured CRM kind.
///
/// `none` or an empty kind means no CRM is configured.
pub fn connect<T>(
    kind: &str,
    credentials: CrmCredentials,
    transport: T,
) -> CrmResult<Option<Box<dyn PracticeSystem>>>
where
    T: CrmTransport + 'static,
{
    let Some(vendor) = CrmVendor::parse(kind)? else {
        return Ok(None);
    };
    if credentials.endpoint.trim().is_empty() {
        return Err(CrmError::MissingConfig("endpoint"));
    }

    tracing::debug!(vendor = %vendor, endpoint = %credentials.endpoint, "connecting to crm");
    Ok(Some(Box::new(VendorClient::new(vendor, credentials, transport))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::RecordingTransport;

    fn credentials() -> CrmCredentials {
        CrmCredentials {
            endpoint: "https://crm.example".into(),
            username: "frontdesk".into(),
            password: "s3cret".into(),
        }
    }

    #[test]
    fn test_connect_none() {
        assert!(connect("none", credentials(), RecordingTransport::new()).unwrap().is_none());
        assert!(connect(" ", credentials(), RecordingTransport::new()).unwrap().is_none());
    }

    #[test]
    fn test_connect_vendor() {
        let system = connect("Open_Dental", credentials(), RecordingTransport::new())
            .unwrap()
            .unwrap();
        assert_eq!(system.vendor(), CrmVendor::OpenDental);
        assert!(!system.is_authenticated());
    }

    #[test]
    fn test_connect_unknown_vendor() {
        let err = connect("DentalCRM", credentials(), RecordingTransport::new()).err().unwrap();
        assert!(matches!(err, CrmError::UnsupportedVendor(ref k) if k == "DentalCRM"));
    }

    #[test]
    fn test_connect_requires_endpoint() {
        let err = connect("dentrix", CrmCredentials::default(), RecordingTransport::new())
            .err()
            .unwrap();
        assert!(matches!(err, CrmError::MissingConfig("endpoint")));
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        assert!(!format!("{:?}", credentials()).contains("s3cret"));
    }
}
