//! Vendor-specific CRM clients.
//!
//! The vendors share one client; they differ in how they authenticate and
//! in their route tables.

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use strsim::jaro_winkler;

use super::crm::{CrmCredentials, CrmError, CrmPatient, CrmResult, PracticeSystem};
use super::payload::CrmReportExport;
use super::transport::{CrmRequest, CrmResponse, CrmTransport, HttpMethod};

/// Minimum Jaro-Winkler similarity for a patient name to match a query.
const NAME_MATCH_THRESHOLD: f64 = 0.75;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CrmVendor {
    Dentrix,
    Eaglesoft,
    OpenDental,
}

impl CrmVendor {
    /// Parse a configured kind. `none` and blank mean no CRM.
    pub fn parse(kind: &str) -> CrmResult<Option<Self>> {
        let normalized: String = kind
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect();

        match normalized.as_str() {
            "" | "none" => Ok(None),
            "dentrix" => Ok(Some(CrmVendor::Dentrix)),
            "eaglesoft" => Ok(Some(CrmVendor::Eaglesoft)),
            "opendental" => Ok(Some(CrmVendor::OpenDental)),
            _ => Err(CrmError::UnsupportedVendor(kind.trim().to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CrmVendor::Dentrix => "dentrix",
            CrmVendor::Eaglesoft => "eaglesoft",
            CrmVendor::OpenDental => "open_dental",
        }
    }

    fn routes(&self) -> Routes {
        match self {
            CrmVendor::Dentrix => Routes {
                patient: "/patients/{id}",
                patients: "/patients",
                report: "/patients/{id}/clinical-notes",
                attachment: "/patients/{id}/documents",
            },
            CrmVendor::Eaglesoft => Routes {
                patient: "/api/patient/{id}",
                patients: "/api/patient",
                report: "/api/patient/{id}/reports",
                attachment: "/api/patient/{id}/attachments",
            },
            CrmVendor::OpenDental => Routes {
                patient: "/patients/{id}",
                patients: "/patients",
                report: "/commlogs",
                attachment: "/documents",
            },
        }
    }
}

impl fmt::Display for CrmVendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CrmVendor {
    type Err = CrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CrmVendor::parse(s)?.ok_or_else(|| CrmError::UnsupportedVendor(s.to_string()))
    }
}

/// Route templates; `{id}` is replaced with the patient id.
struct Routes {
    patient: &'static str,
    patients: &'static str,
    report: &'static str,
    attachment: &'static str,
}

/// CRM client for one vendor over any transport.
pub struct VendorClient<T: CrmTransport> {
    vendor: CrmVendor,
    credentials: CrmCredentials,
    transport: T,
    /// Header added to every call once authenticated
    auth_header: Option<(String, String)>,
}

impl<T: CrmTransport> VendorClient<T> {
    pub fn new(vendor: CrmVendor, credentials: CrmCredentials, transport: T) -> Self {
        Self {
            vendor,
            credentials,
            transport,
            auth_header: None,
        }
    }

    /// Join a route onto the endpoint. `{id}` is replaced by the patient id,
    /// percent-encoded as a single path segment.
    fn url(&self, template: &str, patient_id: &str) -> CrmResult<String> {
        let endpoint = &self.credentials.endpoint;
        let mut url = Url::parse(endpoint)
            .map_err(|e| CrmError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| CrmError::InvalidEndpoint(endpoint.clone()))?;
            segments.pop_if_empty();
            for segment in template.split('/').filter(|s| !s.is_empty()) {
                segments.push(if segment == "{id}" { patient_id } else { segment });
            }
        }
        Ok(url.into())
    }

    fn check(response: CrmResponse) -> CrmResult<CrmResponse> {
        if response.is_success() {
            Ok(response)
        } else {
            Err(CrmError::Status {
                status: response.status,
                body: response.body,
            })
        }
    }

    /// Send an authenticated request.
    fn call(&self, request: CrmRequest) -> CrmResult<CrmResponse> {
        let (name, value) = self
            .auth_header
            .as_ref()
            .ok_or(CrmError::NotAuthenticated(self.vendor))?;
        let request = request
            .header(name.clone(), value.clone())
            .header("Accept", "application/json");
        Self::check(self.transport.send(&request)?)
    }

    fn token_from(response: &CrmResponse, field: &str) -> CrmResult<String> {
        let body: Value = response.json()?;
        body.get(field)
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .ok_or_else(|| CrmError::AuthenticationFailed(format!("response has no {}", field)))
    }
}

impl<T: CrmTransport> PracticeSystem for VendorClient<T> {
    fn vendor(&self) -> CrmVendor {
        self.vendor
    }

    fn authenticate(&mut self) -> CrmResult<()> {
        let CrmCredentials {
            username, password, ..
        } = &self.credentials;
        if username.is_empty() || password.is_empty() {
            return Err(CrmError::AuthenticationFailed(
                "username and password are required".into(),
            ));
        }

        let header = match self.vendor {
            CrmVendor::Dentrix => {
                let request = CrmRequest::new(HttpMethod::Post, self.url("/oauth/token", "")?)
                    .json(json!({
                        "grant_type": "password",
                        "username": username,
                        "password": password,
                    }));
                let response = Self::check(self.transport.send(&request)?)?;
                let token = Self::token_from(&response, "access_token")?;
                ("Authorization".to_string(), format!("Bearer {}", token))
            }
            CrmVendor::Eaglesoft => {
                let request = CrmRequest::new(HttpMethod::Post, self.url("/api/session", "")?)
                    .json(json!({ "username": username, "password": password }));
                let response = Self::check(self.transport.send(&request)?)?;
                let session = Self::token_from(&response, "session_id")?;
                ("X-Session-Id".to_string(), session)
            }
            CrmVendor::OpenDental => (
                "Authorization".to_string(),
                format!("ODFHIR {}/{}", username, password),
            ),
        };

        self.auth_header = Some(header);
        tracing::info!(vendor = %self.vendor, "authenticated with crm");
        Ok(())
    }

    fn is_authenticated(&self) -> bool {
        self.auth_header.is_some()
    }

    fn get_patient(&self, patient_id: &str) -> CrmResult<CrmPatient> {
        let url = self.url(self.vendor.routes().patient, patient_id)?;
        let body: Value = self.call(CrmRequest::new(HttpMethod::Get, url))?.json()?;
        patient_from_value(&body)
            .ok_or_else(|| CrmError::InvalidResponse("patient record has no id".into()))
    }

    fn save_report(&self, patient_id: &str, report: &CrmReportExport) -> CrmResult<()> {
        let url = self.url(self.vendor.routes().report, patient_id)?;
        let body = match self.vendor {
            CrmVendor::OpenDental => json!({
                "PatNum": patient_id,
                "Note": report.to_json()?,
            }),
            _ => serde_json::to_value(report)?,
        };
        self.call(CrmRequest::new(HttpMethod::Post, url).json(body))?;
        Ok(())
    }

    fn list_patients(&self, query: Option<&str>) -> CrmResult<Vec<CrmPatient>> {
        let query = query.map(str::trim).filter(|q| !q.is_empty());
        let url = self.url(self.vendor.routes().patients, "")?;
        let mut request = CrmRequest::new(HttpMethod::Get, url);
        if let (CrmVendor::Dentrix, Some(q)) = (self.vendor, query) {
            request = request.query("search", q);
        }

        let body: Value = self.call(request)?.json()?;
        let records = match &body {
            Value::Array(items) => items.as_slice(),
            Value::Object(map) => map
                .get("patients")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default(),
            _ => &[],
        };
        let patients: Vec<CrmPatient> = records.iter().filter_map(patient_from_value).collect();

        Ok(match query {
            Some(q) => rank_by_name(patients, q),
            None => patients,
        })
    }

    fn upload_attachment(
        &self,
        patient_id: &str,
        data: &[u8],
        file_name: &str,
        mime: &str,
    ) -> CrmResult<()> {
        let url = self.url(self.vendor.routes().attachment, patient_id)?;
        let body = json!({
            "patient_id": patient_id,
            "file_name": file_name,
            "mime_type": mime,
            "data": STANDARD.encode(data),
        });
        self.call(CrmRequest::new(HttpMethod::Post, url).json(body))?;
        Ok(())
    }
}

fn string_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match value.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Read a patient from any vendor's record shape.
fn patient_from_value(value: &Value) -> Option<CrmPatient> {
    let id = string_field(value, &["id", "patient_id", "PatNum"])?;
    let name = string_field(value, &["name", "full_name"]).unwrap_or_else(|| {
        [
            string_field(value, &["first_name", "FName"]),
            string_field(value, &["last_name", "LName"]),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
    });

    Some(CrmPatient {
        id,
        name,
        date_of_birth: string_field(value, &["date_of_birth", "dob", "Birthdate"]),
    })
}

/// Keep patients whose name resembles the query, best match first.
fn rank_by_name(patients: Vec<CrmPatient>, query: &str) -> Vec<CrmPatient> {
    let query = query.to_lowercase();
    let mut scored: Vec<(f64, CrmPatient)> = patients
        .into_iter()
        .filter_map(|patient| {
            let name = patient.name.to_lowercase();
            let score = if name.contains(&query) {
                1.0
            } else {
                jaro_winkler(&name, &query)
            };
            (score >= NAME_MATCH_THRESHOLD).then_some((score, patient))
        })
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().map(|(_, patient)| patient).collect()
}
