//! Payment session controller.
//!
//! The controller owns one session and sequences the identity resolver, the
//! provider adapter and the status reconciler around it. Every transition
//! runs under the session lock, so racing signals are applied one at a time
//! and only the first terminal signal counts.

use std::sync::Arc;

use chrono::Utc;
use common::SessionId;
use tokio::sync::{Mutex, watch};

use crate::adapters::{self, ProviderAdapter};
use crate::config::ProviderSettings;
use crate::error::{CheckoutError, Result};
use crate::events::SessionEvent;
use crate::provider::{Brand, ProviderKind};
use crate::reconciler::StatusReconciler;
use crate::services::{CheckoutIdRequest, FinalizeRequest, PaymentServices};
use crate::session::{PaymentSession, SessionRequest};
use crate::signal::{Presentation, ProviderSignal, RawSignal, Surface};
use crate::state::{FailureReason, SessionState, TerminalOutcome};

/// What the caller should do after an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// Put this surface in front of the user and wait for its signals.
    Presenting(Presentation),
    /// Nothing to show; the session is waiting in the given state.
    Waiting(SessionState),
    /// The session reached its terminal outcome.
    Finished(TerminalOutcome),
    /// The signal changed nothing.
    Ignored,
}

impl Progress {
    pub fn outcome(&self) -> Option<&TerminalOutcome> {
        match self {
            Progress::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }
}

/// Result of one transition, produced under the session lock.
struct Transition {
    progress: Progress,
    finalize: Option<FinalizeRequest>,
}

impl Transition {
    fn progress(progress: Progress) -> Self {
        Self {
            progress,
            finalize: None,
        }
    }
}

/// Drives one payment session to exactly one terminal outcome.
///
/// Cheap to clone; clones share the session, so SDK callbacks and redirect
/// watchers may call [`handle`](Self::handle) from separate tasks.
#[derive(Clone)]
pub struct PaymentSessionController {
    id: SessionId,
    session: Arc<Mutex<PaymentSession>>,
    adapter: Arc<dyn ProviderAdapter>,
    services: PaymentServices,
    reconciler: StatusReconciler,
    state_tx: Arc<watch::Sender<SessionState>>,
}

impl PaymentSessionController {
    /// Validates the request and creates an idle session for it.
    pub fn new(
        request: SessionRequest,
        services: PaymentServices,
        settings: Arc<ProviderSettings>,
    ) -> Result<Self> {
        let request = validate(request)?;

        let adapter = adapters::select(request.provider, request.brand, &settings, &services);
        let mut session = PaymentSession::new(request);
        let id = session.id();
        session.apply(SessionEvent::session_started(id));

        let (state_tx, _) = watch::channel(session.state());
        let reconciler = StatusReconciler::new(services.status.clone());

        Ok(Self {
            id,
            session: Arc::new(Mutex::new(session)),
            adapter,
            services,
            reconciler,
            state_tx: Arc::new(state_tx),
        })
    }

    /// Starts the session: resolves the checkout id when the provider needs
    /// one, then initiates and presents the provider.
    #[tracing::instrument(skip(self), fields(session_id = %self.id, provider = %self.adapter.kind()))]
    pub async fn start(&self) -> Result<Progress> {
        let transition = {
            let mut session = self.session.lock().await;
            let state = session.state();
            if !state.can_start() {
                return Err(if state.is_terminal() {
                    CheckoutError::InvalidState {
                        expected: SessionState::Idle.to_string(),
                        actual: state,
                    }
                } else {
                    CheckoutError::AlreadyStarted
                });
            }

            metrics::counter!(
                "payment_sessions_started_total",
                "provider" => self.adapter.kind().as_str()
            )
            .increment(1);
            tracing::info!("payment session started");

            self.run_start(&mut session).await
        };

        Ok(self.complete(transition).await)
    }

    /// Delivers a raw signal from the presented provider UI.
    #[tracing::instrument(skip(self, raw), fields(session_id = %self.id, signal = raw.name()))]
    pub async fn handle(&self, raw: RawSignal) -> Progress {
        let transition = {
            let mut session = self.session.lock().await;
            let state = session.state();

            if state.is_terminal() {
                self.drop_signal(&mut session, raw.name());
                return Progress::Ignored;
            }

            if matches!(raw, RawSignal::Dismissed) {
                self.terminate(&mut session, TerminalOutcome::Cancelled)
            } else if state == SessionState::Idle {
                tracing::debug!("signal before start ignored");
                Transition::progress(Progress::Ignored)
            } else {
                match self.adapter.interpret(&session, raw).await {
                    Some(signal) => self.process(&mut session, signal).await,
                    None => {
                        tracing::debug!(state = %state, "signal carried no decision");
                        Transition::progress(Progress::Ignored)
                    }
                }
            }
        };

        self.complete(transition).await
    }

    /// Delivers a URL the external browser navigated to.
    pub async fn redirect(&self, url: impl Into<String>) -> Progress {
        self.handle(RawSignal::Redirect { url: url.into() }).await
    }

    /// The user dismissed the presented UI.
    pub async fn dismiss(&self) -> Progress {
        self.handle(RawSignal::Dismissed).await
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Current state, without waiting for an in-flight transition.
    pub fn state(&self) -> SessionState {
        *self.state_tx.borrow()
    }

    /// A copy of the session as of the last completed transition.
    pub async fn snapshot(&self) -> PaymentSession {
        self.session.lock().await.clone()
    }

    /// Receives every state the session moves through.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Waits until the session is terminal and returns its outcome.
    pub async fn wait_for_outcome(&self) -> Option<TerminalOutcome> {
        let mut rx = self.state_tx.subscribe();
        rx.wait_for(|state| state.is_terminal()).await.ok()?;
        self.session.lock().await.terminal_outcome().cloned()
    }
}

// Transitions; all run with the session locked.
impl PaymentSessionController {
    async fn run_start(&self, session: &mut PaymentSession) -> Transition {
        if let Err(reason) = self.adapter.check_eligibility() {
            tracing::warn!(reason = %reason, "provider not available");
            return self.fail(session, reason);
        }

        if self.adapter.requires_checkout_id() {
            self.record(session, SessionEvent::checkout_id_requested());
            let request = CheckoutIdRequest {
                amount: session.amount().to_amount_string(),
                type_selector: type_selector(session),
            };

            match self.services.identity.resolve(request).await {
                Ok(checkout_id) => {
                    tracing::info!(checkout_id = %checkout_id, "checkout id resolved");
                    self.record(session, SessionEvent::checkout_id_resolved(checkout_id));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "checkout id request failed");
                    return self.fail(session, FailureReason::IdentityError);
                }
            }
        }

        let initiation = match self.adapter.initiate(session).await {
            Ok(initiation) => initiation,
            Err(reason) => return self.fail(session, reason),
        };

        let presentation = match self.adapter.present(session, &initiation) {
            Ok(Surface::Show(presentation)) => presentation,
            Ok(Surface::Resolved(signal)) => {
                self.record(session, SessionEvent::provider_presented(None));
                return self.process(session, signal).await;
            }
            Err(reason) => return self.fail(session, reason),
        };

        match presentation {
            Presentation::ExternalBrowser { url } => {
                self.record(session, SessionEvent::provider_presented(Some(url.clone())));
                // The result only comes back through the browser.
                self.record(session, SessionEvent::confirmation_pending(None));
                Transition::progress(Progress::Presenting(Presentation::ExternalBrowser { url }))
            }
            presentation => {
                self.record(session, SessionEvent::provider_presented(None));
                Transition::progress(Progress::Presenting(presentation))
            }
        }
    }

    async fn process(&self, session: &mut PaymentSession, signal: ProviderSignal) -> Transition {
        match signal {
            ProviderSignal::Success { reference } => {
                self.terminate(session, TerminalOutcome::Settled { reference })
            }
            ProviderSignal::Failed(reason) => self.fail(session, reason),
            ProviderSignal::Cancelled => self.terminate(session, TerminalOutcome::Cancelled),
            ProviderSignal::Pending { resource_path } => {
                self.record(session, SessionEvent::confirmation_pending(resource_path));
                self.reconcile(session).await
            }
        }
    }

    /// Checks the pending transaction once, if its resource path is known.
    async fn reconcile(&self, session: &mut PaymentSession) -> Transition {
        let Some(path) = session.external_resource_path().map(str::to_string) else {
            return Transition::progress(Progress::Waiting(session.state()));
        };

        let reconciliation = self
            .reconciler
            .reconcile_signal(&path, type_selector(session))
            .await;
        if let Some(verdict) = &reconciliation.verdict {
            self.record(
                session,
                SessionEvent::status_checked(verdict.status, verdict.code.clone(), verdict.settled),
            );
        }

        match reconciliation.signal {
            ProviderSignal::Success { reference } => {
                self.terminate(session, TerminalOutcome::Settled { reference })
            }
            ProviderSignal::Failed(reason) => self.fail(session, reason),
            ProviderSignal::Cancelled => self.terminate(session, TerminalOutcome::Cancelled),
            ProviderSignal::Pending { .. } => Transition::progress(Progress::Waiting(session.state())),
        }
    }

    fn fail(&self, session: &mut PaymentSession, reason: FailureReason) -> Transition {
        self.terminate(session, TerminalOutcome::Failed { reason })
    }

    fn terminate(&self, session: &mut PaymentSession, outcome: TerminalOutcome) -> Transition {
        let event = match &outcome {
            TerminalOutcome::Settled { reference } => SessionEvent::session_settled(reference.clone()),
            TerminalOutcome::Failed { reason } => SessionEvent::session_failed(*reason),
            TerminalOutcome::Cancelled => SessionEvent::session_cancelled(),
        };

        if !self.record(session, event) {
            self.drop_signal(session, "terminal");
            return Transition::progress(Progress::Ignored);
        }

        let elapsed = (Utc::now() - session.created_at()).num_milliseconds() as f64 / 1000.0;
        metrics::histogram!("payment_session_duration_seconds").record(elapsed);

        let provider = self.adapter.kind().as_str();
        match &outcome {
            TerminalOutcome::Settled { reference } => {
                metrics::counter!("payment_sessions_settled", "provider" => provider).increment(1);
                tracing::info!(reference = ?reference, "payment settled");
            }
            TerminalOutcome::Failed { reason } => {
                metrics::counter!(
                    "payment_sessions_failed",
                    "provider" => provider,
                    "reason" => reason.as_str()
                )
                .increment(1);
                tracing::warn!(reason = %reason, "payment failed");
            }
            TerminalOutcome::Cancelled => {
                metrics::counter!("payment_sessions_cancelled", "provider" => provider)
                    .increment(1);
                tracing::info!("payment cancelled");
            }
        }

        let finalize = match &outcome {
            TerminalOutcome::Settled { reference } => Some(FinalizeRequest {
                session_id: session.id(),
                provider_reference: reference.clone(),
                amount: session.amount(),
            }),
            _ => None,
        };

        Transition {
            progress: Progress::Finished(outcome),
            finalize,
        }
    }

    fn drop_signal(&self, session: &mut PaymentSession, signal: &str) {
        metrics::counter!("payment_signals_dropped_total").increment(1);
        tracing::debug!(signal, state = %session.state(), "signal after terminal state dropped");
        session.apply(SessionEvent::signal_dropped(signal));
    }

    /// Applies an event and publishes the resulting state.
    fn record(&self, session: &mut PaymentSession, event: SessionEvent) -> bool {
        let applied = session.apply(event);
        if applied {
            self.state_tx.send_replace(session.state());
        }
        applied
    }

    /// Runs after the session lock is released.
    async fn complete(&self, transition: Transition) -> Progress {
        if let Some(request) = transition.finalize {
            if let Err(e) = self.services.finalizer.finalize(request).await {
                tracing::warn!(error = %e, "order finalization failed");
            }
        }
        transition.progress
    }
}

impl std::fmt::Debug for PaymentSessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentSessionController")
            .field("id", &self.id)
            .field("provider", &self.adapter.kind())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

fn type_selector(session: &PaymentSession) -> u8 {
    session
        .brand()
        .map(|brand| brand.type_selector())
        .unwrap_or_else(|| Brand::Visa.type_selector())
}

fn validate(mut request: SessionRequest) -> Result<SessionRequest> {
    if !request.amount.is_positive() {
        return Err(CheckoutError::InvalidRequest(format!(
            "amount must be positive, got {}",
            request.amount
        )));
    }

    match request.provider {
        ProviderKind::Card => match request.brand {
            Some(brand) if brand.is_card_brand() => {}
            Some(brand) => {
                return Err(CheckoutError::InvalidRequest(format!(
                    "{brand} is not a card brand"
                )));
            }
            None => {
                return Err(CheckoutError::InvalidRequest(
                    "card payments require a brand".to_string(),
                ));
            }
        },
        ProviderKind::Wallet => match request.brand {
            None | Some(Brand::ApplePay) => request.brand = Some(Brand::ApplePay),
            Some(brand) => {
                return Err(CheckoutError::InvalidRequest(format!(
                    "{brand} is not a wallet brand"
                )));
            }
        },
        ProviderKind::Cash | ProviderKind::Bnpl => request.brand = None,
    }

    Ok(request)
}
