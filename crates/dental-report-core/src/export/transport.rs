//! Request/response plumbing between CRM clients and the network.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{CrmError, CrmResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HttpMethod {
    Get,
    Post,
}

/// A request as a vendor client builds it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrmRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl CrmRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Value of the first header with this name (case-insensitive).
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrmResponse {
    pub status: u16,
    pub body: String,
}

impl CrmResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> CrmResult<T> {
        serde_json::from_str(&self.body).map_err(|e| CrmError::InvalidResponse(e.to_string()))
    }
}

/// Sends CRM requests. One call, one response; no retries.
pub trait CrmTransport {
    fn send(&self, request: &CrmRequest) -> CrmResult<CrmResponse>;
}

impl<T: CrmTransport + ?Sized> CrmTransport for &T {
    fn send(&self, request: &CrmRequest) -> CrmResult<CrmResponse> {
        (**self).send(request)
    }
}

/// Blocking HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> CrmResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("dental-report/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CrmError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

impl CrmTransport for HttpTransport {
    fn send(&self, request: &CrmRequest) -> CrmResult<CrmResponse> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .map_err(|e| CrmError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| CrmError::Transport(e.to_string()))?;

        tracing::debug!(url = %request.url, status, "crm request completed");
        Ok(CrmResponse { status, body })
    }
}

/// In-memory transport that records requests and replays queued responses.
///
/// Clones share the same queues. When the queue is empty it answers `200 {}`.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    requests: Rc<RefCell<Vec<CrmRequest>>>,
    responses: Rc<RefCell<VecDeque<CrmResponse>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next response.
    pub fn respond(&self, response: CrmResponse) -> &Self {
        self.responses.borrow_mut().push_back(response);
        self
    }

    /// Requests sent so far.
    pub fn requests(&self) -> Vec<CrmRequest> {
        self.requests.borrow().clone()
    }
}

impl CrmTransport for RecordingTransport {
    fn send(&self, request: &CrmRequest) -> CrmResult<CrmResponse> {
        self.requests.borrow_mut().push(request.clone());
        Ok(self
            .responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| CrmResponse::ok("{}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = CrmRequest::new(HttpMethod::Get, "https://crm.example/patients")
            .header("Authorization", "Bearer t")
            .query("search", "doe");
        assert_eq!(request.header_value("authorization"), Some("Bearer t"));
        assert_eq!(request.query, vec![("search".to_string(), "doe".to_string())]);
    }

    #[test]
    fn test_recording_transport_replays() {
        let transport = RecordingTransport::new();
        transport.respond(CrmResponse {
            status: 404,
            body: "missing".into(),
        });

        let request = CrmRequest::new(HttpMethod::Get, "u");
        let first = transport.send(&request).unwrap();
        let second = transport.clone().send(&request).unwrap();
        assert!(!first.is_success());
        assert!(second.is_success());
        assert_eq!(transport.requests().len(), 2);
    }
}
