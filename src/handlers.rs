use crate::chat_relay::ChatRelay;
use crate::config::Config;
use crate::errors::AppError;
use crate::models::{lead_timestamp, ChatReply, HealthResponse, Lead, LeadAccepted};
use crate::notifier::{Delivery, Notifier};
use crate::spreadsheet::LeadSheet;
use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Completion API client.
    pub chat: ChatRelay,
    /// Lead notification mailer.
    pub notifier: Notifier,
    /// Leads workbook.
    pub leads: LeadSheet,
}

impl AppState {
    /// Wires every component from one configuration value.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let chat = ChatRelay::new(&config)?;
        let notifier = Notifier::new(&config);
        let leads = LeadSheet::new(config.leads_excel_path.clone());

        Ok(Self {
            config,
            chat,
            notifier,
            leads,
        })
    }
}

/// Builds the HTTP router with tracing, CORS and body-size limits.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/chat", post(chat))
        .route("/lead", post(lead))
        .with_state(state)
        .layer(
            // Request size limit must be outermost: Cors needs the inner body to be Default
            ServiceBuilder::new()
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// Parses a request body as JSON regardless of its content type.
fn parse_json_body(body: &[u8]) -> Option<Value> {
    serde_json::from_slice(body).ok()
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// POST /chat
///
/// Request: `{ "message": "I need a 10kW system in Lahore" }`
///
/// Only the presence of `message` is checked; a non-string value is forwarded as its JSON
/// text. Input is validated before configuration, so a bad body is a 400 even on a server
/// without an API key.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ChatReply>, AppError> {
    let payload = parse_json_body(&body);
    let message = match payload.as_ref().and_then(|data| data.get("message")) {
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None => return Err(AppError::BadRequest("no message provided".to_string())),
    };

    tracing::info!("POST /chat - {} chars", message.chars().count());

    let reply = state.chat.reply(&message).await?;

    Ok(Json(ChatReply { reply }))
}

/// POST /lead
///
/// Accepts any subset of the lead fields as a JSON object. The spreadsheet append and the
/// notification email are both best-effort; the lead is acknowledged either way.
pub async fn lead(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<LeadAccepted>, AppError> {
    let payload: Map<String, Value> = match parse_json_body(&body) {
        Some(Value::Object(map)) if !map.is_empty() => map,
        _ => return Err(AppError::BadRequest("no JSON body".to_string())),
    };

    let lead = Lead::from_submission(&payload, lead_timestamp(Utc::now()));
    tracing::info!("POST /lead - name={}, city={}", lead.name, lead.city);

    if let Err(e) = state.leads.append(lead.clone()).await {
        tracing::error!("Excel write failed: {:#}", e);
    } else {
        tracing::info!("✓ Lead appended to {}", state.leads.path().display());
    }

    let subject = lead.email_subject();
    let email_body = lead.email_body()?;
    let delivery = state
        .notifier
        .send(&subject, &email_body, &state.config.leads_email_to)
        .await;

    match &delivery {
        Delivery::Sent => tracing::info!("✓ Lead email sent to {}", state.config.leads_email_to),
        Delivery::Skipped(reason) => tracing::warn!("{}. Skipping email send.", reason),
        Delivery::Failed(e) => tracing::error!("Email send failed: {}", e),
    }

    Ok(Json(LeadAccepted {
        status: "ok".to_string(),
        email_sent: delivery.is_sent(),
        lead,
    }))
}
