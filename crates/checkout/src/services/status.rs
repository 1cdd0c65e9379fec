//! Backend status check trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status request keyed by the provider's resource path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRequest {
    pub resource_path: String,
    pub type_selector: u8,
}

/// What the backend answered for a status request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Backend's own success flag.
    pub status: bool,
    /// Provider result code, e.g. `000.100.110`.
    pub code: String,
    pub description: Option<String>,
}

impl StatusReport {
    pub fn new(status: bool, code: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            description: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusError {
    /// The request did not complete; the outcome is unknown.
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered but refused or garbled the request.
    #[error("status check rejected: {0}")]
    Rejected(String),
}

/// Backend endpoint answering settlement status for a transaction.
#[async_trait]
pub trait StatusBackend: Send + Sync {
    async fn check_status(&self, request: StatusRequest) -> Result<StatusReport, StatusError>;
}

#[derive(Debug)]
struct InMemoryStatusState {
    reports: HashMap<String, StatusReport>,
    default_report: StatusReport,
    fail_with: Option<StatusError>,
    requests: Vec<StatusRequest>,
}

impl Default for InMemoryStatusState {
    fn default() -> Self {
        Self {
            reports: HashMap::new(),
            default_report: StatusReport::new(true, "000.000.000"),
            fail_with: None,
            requests: Vec::new(),
        }
    }
}

/// In-memory status backend for testing.
///
/// Answers `status=true, code=000.000.000` unless a report was registered
/// for the resource path or a default was set.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStatusBackend {
    state: Arc<RwLock<InMemoryStatusState>>,
}

impl InMemoryStatusBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the report returned for one resource path.
    pub fn set_report(&self, resource_path: impl Into<String>, report: StatusReport) {
        self.state
            .write()
            .unwrap()
            .reports
            .insert(resource_path.into(), report);
    }

    /// Sets the report returned for unknown resource paths.
    pub fn set_default_report(&self, report: StatusReport) {
        self.state.write().unwrap().default_report = report;
    }

    pub fn set_fail_with(&self, error: Option<StatusError>) {
        self.state.write().unwrap().fail_with = error;
    }

    pub fn call_count(&self) -> usize {
        self.state.read().unwrap().requests.len()
    }

    pub fn requests(&self) -> Vec<StatusRequest> {
        self.state.read().unwrap().requests.clone()
    }
}

#[async_trait]
impl StatusBackend for InMemoryStatusBackend {
    async fn check_status(&self, request: StatusRequest) -> Result<StatusReport, StatusError> {
        let mut state = self.state.write().unwrap();
        let report = state
            .reports
            .get(&request.resource_path)
            .cloned()
            .unwrap_or_else(|| state.default_report.clone());
        state.requests.push(request);

        match state.fail_with.clone() {
            Some(error) => Err(error),
            None => Ok(report),
        }
    }
}
