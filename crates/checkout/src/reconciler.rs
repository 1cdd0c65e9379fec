//! Status reconciliation for transactions awaiting confirmation.

use std::sync::Arc;

use crate::result_codes::{CodeCategory, match_success_code, settlement_verdict};
use crate::services::status::{StatusBackend, StatusError, StatusRequest};
use crate::signal::ProviderSignal;
use crate::state::FailureReason;

/// The combined settlement verdict for one status check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub settled: bool,
    /// Backend's own success flag.
    pub status: bool,
    pub code: String,
    /// Success-code category the result code matched, if any.
    pub category: Option<CodeCategory>,
}

impl Verdict {
    /// Combines both signals: settled if either the flag is set or the
    /// code is a known success code.
    pub fn new(status: bool, code: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            settled: settlement_verdict(status, &code),
            category: match_success_code(&code),
            status,
            code,
        }
    }

    /// Which signal carried the verdict, for logging.
    pub fn carried_by(&self) -> &'static str {
        match (self.status, self.category.is_some()) {
            (true, true) => "status_and_code",
            (true, false) => "status",
            (false, true) => "code",
            (false, false) => "none",
        }
    }
}

/// A status check mapped to a normalized signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub signal: ProviderSignal,
    /// Absent when the check itself failed.
    pub verdict: Option<Verdict>,
}

/// Asks the backend whether a pending transaction settled.
///
/// Issues exactly one request per call and never retries.
#[derive(Clone)]
pub struct StatusReconciler {
    backend: Arc<dyn StatusBackend>,
}

impl StatusReconciler {
    pub fn new(backend: Arc<dyn StatusBackend>) -> Self {
        Self { backend }
    }

    #[tracing::instrument(skip(self))]
    pub async fn reconcile(
        &self,
        resource_path: &str,
        type_selector: u8,
    ) -> Result<Verdict, StatusError> {
        metrics::counter!("payment_status_checks_total").increment(1);

        let report = self
            .backend
            .check_status(StatusRequest {
                resource_path: resource_path.to_string(),
                type_selector,
            })
            .await?;

        let verdict = Verdict::new(report.status, report.code);
        tracing::info!(
            settled = verdict.settled,
            status = verdict.status,
            code = %verdict.code,
            category = verdict.category.map(|c| c.as_str()),
            carried_by = verdict.carried_by(),
            "status verdict"
        );
        Ok(verdict)
    }

    /// Reconciles and maps the result to a normalized signal. The resource
    /// path doubles as the provider reference on success.
    pub async fn reconcile_signal(&self, resource_path: &str, type_selector: u8) -> Reconciliation {
        match self.reconcile(resource_path, type_selector).await {
            Ok(verdict) => {
                let signal = if verdict.settled {
                    ProviderSignal::Success {
                        reference: Some(resource_path.to_string()),
                    }
                } else {
                    ProviderSignal::Failed(FailureReason::ProviderDeclined)
                };
                Reconciliation {
                    signal,
                    verdict: Some(verdict),
                }
            }
            Err(StatusError::Network(message)) => {
                tracing::warn!(error = %message, "status check did not complete");
                Reconciliation {
                    signal: ProviderSignal::Failed(FailureReason::AmbiguousTimeout),
                    verdict: None,
                }
            }
            Err(StatusError::Rejected(message)) => {
                tracing::warn!(error = %message, "status check rejected");
                Reconciliation {
                    signal: ProviderSignal::Failed(FailureReason::BackendRejected),
                    verdict: None,
                }
            }
        }
    }
}

impl std::fmt::Debug for StatusReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusReconciler").finish_non_exhaustive()
    }
}
