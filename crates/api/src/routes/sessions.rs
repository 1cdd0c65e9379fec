//! Payment session endpoints.
//!
//! A thin client creates a session, puts the returned presentation on
//! screen and forwards whatever the provider UI reports. Sessions live in
//! the registry until a response has carried their terminal outcome, or
//! until they outlive the session TTL and the sweeper cancels them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use checkout::services::StaticWalletEligibility;
use checkout::{
    Brand, LineItem, PaymentServices, PaymentSession, PaymentSessionController, Presentation,
    Progress, ProviderKind, ProviderSettings, RawSignal, SessionEvent, SessionRequest,
    TerminalOutcome,
};
use common::{Currency, Money, SessionId};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::error::ApiError;

/// How long a session may stay in the registry without reaching an outcome.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(15 * 60);

/// A live session and when the registry took it in.
#[derive(Clone)]
pub struct RegisteredSession {
    pub controller: PaymentSessionController,
    pub registered_at: Instant,
}

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub settings: Arc<ProviderSettings>,
    pub services: PaymentServices,
    pub session_ttl: Duration,
    pub sessions: RwLock<HashMap<SessionId, RegisteredSession>>,
}

impl AppState {
    pub fn new(settings: ProviderSettings, services: PaymentServices) -> Self {
        Self {
            settings: Arc::new(settings),
            services,
            session_ttl: DEFAULT_SESSION_TTL,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    async fn register(&self, controller: &PaymentSessionController) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(
            controller.id(),
            RegisteredSession {
                controller: controller.clone(),
                registered_at: Instant::now(),
            },
        );
        metrics::gauge!("payment_sessions_active").set(sessions.len() as f64);
    }

    /// Cancels and forgets every session older than the TTL. Returns how
    /// many were expired.
    pub async fn expire_stale_sessions(&self) -> usize {
        let expired: Vec<PaymentSessionController> = {
            let mut sessions = self.sessions.write().await;
            let now = Instant::now();
            let stale: Vec<SessionId> = sessions
                .iter()
                .filter(|(_, entry)| now.duration_since(entry.registered_at) >= self.session_ttl)
                .map(|(id, _)| *id)
                .collect();
            let expired = stale
                .iter()
                .filter_map(|id| sessions.remove(id))
                .map(|entry| entry.controller)
                .collect();
            metrics::gauge!("payment_sessions_active").set(sessions.len() as f64);
            expired
        };

        for controller in &expired {
            let progress = controller.dismiss().await;
            tracing::info!(session_id = %controller.id(), ?progress, "expired stale session");
        }
        if !expired.is_empty() {
            metrics::counter!("payment_sessions_expired_total").increment(expired.len() as u64);
        }
        expired.len()
    }

    /// Number of sessions still awaiting a terminal outcome.
    pub async fn active_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn controller(&self, id: &str) -> Result<PaymentSessionController, ApiError> {
        let session_id = parse_session_id(id)?;
        self.sessions
            .read()
            .await
            .get(&session_id)
            .map(|entry| entry.controller.clone())
            .ok_or_else(|| ApiError::NotFound(format!("Session {id} not found")))
    }

    /// Builds the response for a session and forgets it once terminal.
    async fn respond(
        &self,
        controller: &PaymentSessionController,
        progress: Option<Progress>,
    ) -> SessionResponse {
        let session = controller.snapshot().await;

        if session.state().is_terminal() {
            let mut sessions = self.sessions.write().await;
            if sessions.remove(&session.id()).is_some() {
                metrics::gauge!("payment_sessions_active").set(sessions.len() as f64);
            }
        }

        SessionResponse::from_session(&session, progress)
    }
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateSessionRequest {
    /// Decimal amount in major units, e.g. `"120.00"`.
    pub amount: String,
    pub currency: String,
    pub provider: ProviderKind,
    #[serde(default)]
    pub brand: Option<Brand>,
    #[serde(default)]
    pub items: Vec<LineItem>,
    /// Whether the device can pay with the native wallet.
    #[serde(default)]
    pub wallet_eligible: Option<bool>,
}

#[derive(Deserialize)]
pub struct RedirectRequest {
    pub url: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct SessionResponse {
    pub id: String,
    pub state: String,
    pub provider: ProviderKind,
    pub brand: Option<Brand>,
    pub amount: String,
    pub currency: String,
    pub checkout_id: Option<String>,
    pub resource_path: Option<String>,
    pub hosted_checkout_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presentation: Option<Presentation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<TerminalOutcome>,
    pub dropped_signals: u32,
    pub created_at: String,
}

impl SessionResponse {
    fn from_session(session: &PaymentSession, progress: Option<Progress>) -> Self {
        let (progress, presentation) = match progress {
            Some(Progress::Presenting(presentation)) => (Some("presenting"), Some(presentation)),
            Some(Progress::Waiting(_)) => (Some("waiting"), None),
            Some(Progress::Finished(_)) => (Some("finished"), None),
            Some(Progress::Ignored) => (Some("ignored"), None),
            None => (None, None),
        };

        Self {
            id: session.id().to_string(),
            state: session.state().to_string(),
            provider: session.provider_kind(),
            brand: session.brand(),
            amount: session.amount().to_amount_string(),
            currency: session.currency().code().to_string(),
            checkout_id: session.external_checkout_id().map(String::from),
            resource_path: session.external_resource_path().map(String::from),
            hosted_checkout_url: session.hosted_checkout_url().map(String::from),
            progress,
            presentation,
            outcome: session.terminal_outcome().cloned(),
            dropped_signals: session.dropped_signals(),
            created_at: session.created_at().to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct SessionEventResponse {
    pub event_type: &'static str,
    pub payload: SessionEvent,
}

// -- Handlers --

/// POST /sessions: create a payment session and start it.
#[tracing::instrument(skip(state, req), fields(provider = %req.provider))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let amount: Money = req.amount.parse()?;
    let currency = Currency::new(&req.currency)?;

    let mut request =
        SessionRequest::new(amount, currency, req.provider).with_line_items(req.items);
    request.brand = req.brand;

    let mut services = state.services.clone();
    if let Some(eligible) = req.wallet_eligible {
        services = services.with_wallet_eligibility(Arc::new(StaticWalletEligibility(eligible)));
    }

    let controller = PaymentSessionController::new(request, services, state.settings.clone())?;
    state.register(&controller).await;

    let progress = controller.start().await?;
    let response = state.respond(&controller, Some(progress)).await;

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /sessions/{id}: current snapshot of a session.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let controller = state.controller(&id).await?;
    Ok(Json(state.respond(&controller, None).await))
}

/// GET /sessions/{id}/events: the session's recorded history.
#[tracing::instrument(skip(state))]
pub async fn events(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<SessionEventResponse>>, ApiError> {
    let controller = state.controller(&id).await?;
    let session = controller.snapshot().await;

    let responses = session
        .history()
        .iter()
        .map(|event| SessionEventResponse {
            event_type: event.event_type(),
            payload: event.clone(),
        })
        .collect();

    Ok(Json(responses))
}

/// POST /sessions/{id}/signals: forward a raw provider UI signal.
#[tracing::instrument(skip(state, signal), fields(signal = signal.name()))]
pub async fn signal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(signal): Json<RawSignal>,
) -> Result<Json<SessionResponse>, ApiError> {
    let controller = state.controller(&id).await?;
    let progress = controller.handle(signal).await;
    Ok(Json(state.respond(&controller, Some(progress)).await))
}

/// POST /sessions/{id}/redirect: forward a URL the external browser reached.
#[tracing::instrument(skip(state, req))]
pub async fn redirect(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<RedirectRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    if req.url.trim().is_empty() {
        return Err(ApiError::BadRequest("url must not be empty".to_string()));
    }

    let controller = state.controller(&id).await?;
    let progress = controller.redirect(req.url).await;
    Ok(Json(state.respond(&controller, Some(progress)).await))
}

/// POST /sessions/{id}/dismiss: the user closed the provider UI.
#[tracing::instrument(skip(state))]
pub async fn dismiss(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let controller = state.controller(&id).await?;
    let progress = controller.dismiss().await;
    Ok(Json(state.respond(&controller, Some(progress)).await))
}

fn parse_session_id(id: &str) -> Result<SessionId, ApiError> {
    id.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid session ID: {e}")))
}

/// Periodically expires sessions that outlived the TTL.
pub fn spawn_session_sweeper(
    state: Arc<AppState>,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticks = tokio::time::interval(every);
        ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticks.tick().await;
            let expired = state.expire_stale_sessions().await;
            if expired > 0 {
                tracing::debug!(expired, "session sweep");
            }
        }
    })
}
