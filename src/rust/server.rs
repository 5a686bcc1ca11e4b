//! HTTP front end: `POST /predict` and `GET /health`.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpListener;

use crate::classifier::{ClassifierError, Pipeline};
use crate::config::ServeConfig;
use crate::model_store::ModelStore;

/// JSON key holding the text to classify.
pub const EMAIL_TEXT_FIELD: &str = "email_text";

/// Shared router state. The model is loaded once and never mutated; `None`
/// means loading failed at startup.
#[derive(Clone, Default)]
pub struct AppState {
    model: Option<Arc<Pipeline>>,
}

impl AppState {
    pub fn new(model: Option<Arc<Pipeline>>) -> Self {
        Self { model }
    }

    pub fn is_model_loaded(&self) -> bool {
        self.model.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub predicted_label: String,
    pub confidence_scores: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
}

/// Request failures and the status code each one maps to.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Model is not loaded. Check server logs.")]
    ModelNotLoaded,
    #[error("Invalid JSON format: {0}")]
    InvalidJson(String),
    #[error("Failed to read request body: {0}")]
    UnreadableBody(String),
    #[error("Missing \"email_text\" key in JSON payload.")]
    MissingEmailText,
    #[error("\"email_text\" must be a string.")]
    EmailTextNotString,
    #[error("Error during prediction: {0}")]
    Prediction(#[from] ClassifierError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidJson(_) | Self::UnreadableBody(_) | Self::MissingEmailText | Self::EmailTextNotString => {
                StatusCode::BAD_REQUEST
            }
            Self::ModelNotLoaded | Self::Prediction(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("{}", self);
        } else {
            log::warn!("Rejected request: {}", self);
        }
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}

/// Builds the application router.
///
/// Request bodies are not size limited, so an email of any length is
/// classified rather than rejected.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
}

/// Loads the model at `path`, logging instead of failing so the server can
/// still start and report the problem per request.
pub fn load_model(path: &Path) -> Option<Arc<Pipeline>> {
    log::info!("Loading the model from {:?}...", path);
    match ModelStore::new(path).load() {
        Ok(pipeline) => {
            log::info!("Model loaded successfully ({} classes)", pipeline.classes().len());
            Some(Arc::new(pipeline))
        }
        Err(e) => {
            log::error!("Error loading model: {}", e);
            None
        }
    }
}

/// Loads the model and serves until ctrl-c.
pub async fn serve(config: &ServeConfig) -> io::Result<()> {
    let state = AppState::new(load_model(&config.model));
    let listener = TcpListener::bind(config.socket_addr()).await?;
    log::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to install ctrl-c handler: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutting down");
}

async fn predict(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let model = state.model.as_ref().ok_or(ApiError::ModelNotLoaded)?;

    let body = body.map_err(|e| ApiError::UnreadableBody(e.body_text()))?;
    let payload: Value = serde_json::from_slice(&body).map_err(|e| ApiError::InvalidJson(e.to_string()))?;
    let email_text = match payload.get(EMAIL_TEXT_FIELD) {
        None => return Err(ApiError::MissingEmailText),
        Some(Value::String(text)) => text,
        Some(_) => return Err(ApiError::EmailTextNotString),
    };

    let prediction = model.predict(email_text)?;
    log::debug!("Predicted {} for {} bytes of text", prediction.label, email_text.len());

    Ok(Json(PredictResponse {
        predicted_label: prediction.label,
        confidence_scores: prediction.scores,
    }))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        model_loaded: state.is_model_loaded(),
    })
}
