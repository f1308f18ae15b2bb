//! HTTP front-end: the input form and the prediction endpoint

use crate::metrics::{MetricsSnapshot, PredictionMetrics};
use crate::models::inference::Predictor;
use crate::render::PageRenderer;
use crate::types::prediction::PageMessage;
use crate::types::score::ScoreInput;
use anyhow::Result;
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

/// Shared, read-only state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<Predictor>,
    pub pages: Arc<PageRenderer>,
    pub metrics: Arc<PredictionMetrics>,
}

impl AppState {
    pub fn new(predictor: Predictor) -> Result<Self> {
        Ok(Self {
            predictor: Arc::new(predictor),
            pages: Arc::new(PageRenderer::new()?),
            metrics: Arc::new(PredictionMetrics::new()),
        })
    }

    /// Handle one form submission, returning the status and rendered page.
    ///
    /// `fields` are the submitted pairs in order. Input that does not parse
    /// never reaches the predictor.
    pub fn predict(&self, fields: &[(String, String)]) -> (StatusCode, String) {
        self.metrics.record_request();

        let (status, message) = match ScoreInput::from_pairs(fields) {
            Err(e) => {
                debug!(error = %e, "Rejected prediction input");
                self.metrics.record_invalid_input();
                (StatusCode::OK, PageMessage::InvalidInput)
            }
            Ok(input) => {
                let start = Instant::now();
                match self.predictor.predict(&input) {
                    Ok(prediction) => {
                        self.metrics
                            .record_prediction(start.elapsed(), &prediction.label);
                        (StatusCode::OK, PageMessage::from(&prediction))
                    }
                    Err(e) => {
                        error!(error = %format!("{e:#}"), "Prediction failed");
                        self.metrics.record_failure();
                        (StatusCode::INTERNAL_SERVER_ERROR, PageMessage::InternalError)
                    }
                }
            }
        };

        match self.pages.render_index(Some(&message)) {
            Ok(page) => (status, page),
            Err(e) => render_failure(e),
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    classes: usize,
    classifier: &'static str,
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/predict", post(predict))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serve the router until `shutdown` resolves
pub async fn serve<F>(addr: SocketAddr, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Listening for requests");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn index(State(state): State<AppState>) -> (StatusCode, Html<String>) {
    let (status, page) = match state.pages.render_index(None) {
        Ok(page) => (StatusCode::OK, page),
        Err(e) => render_failure(e),
    };
    (status, Html(page))
}

/// A missing or non-form body is treated as a submission with no fields.
async fn predict(
    State(state): State<AppState>,
    form: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> (StatusCode, Html<String>) {
    let fields = match form {
        Ok(Form(fields)) => fields,
        Err(rejection) => {
            debug!(error = %rejection, "Unreadable form body, using no fields");
            Vec::new()
        }
    };
    let (status, page) = state.predict(&fields);
    (status, Html(page))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        classes: state.predictor.classes().len(),
        classifier: state.predictor.classifier_kind(),
    })
}

async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

fn render_failure(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %format!("{e:#}"), "Failed to render page");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        PageMessage::InternalError.text(),
    )
}
